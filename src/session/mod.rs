//! Session Management Module
//!
//! Owns the application's authentication lifecycle.
//!
//! # Modules
//!
//! - [`orchestrator`] - Sign-in use cases driving the session state machine
//! - [`machine`] - The session state machine and its observable phase
//! - [`state`] - Shared authentication state read by the rest of the application

pub mod machine;
pub mod orchestrator;
pub mod state;

pub use machine::SessionPhase;
pub use orchestrator::{SessionOrchestrator, SignInOutcome};
pub use state::{AuthSession, AuthState, SessionStatus};

use std::fmt;

/// Entry point a sign-in attempt came through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInMethod {
    Provider,
    EmailPassword,
    AccountCreation,
}

impl fmt::Display for SignInMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignInMethod::Provider => "identity provider",
            SignInMethod::EmailPassword => "email/password",
            SignInMethod::AccountCreation => "account creation",
        })
    }
}
