#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Third-party sign-in handshake and session orchestration.
//!
//! A [`HandshakeCoordinator`] runs one nonce-protected authorization round trip
//! against an external identity provider at a time. The
//! [`SessionOrchestrator`] drives sign-in, account creation and sign-out
//! through it and publishes the signed-in user into a shared [`AuthState`].

/// Version of the belay crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod authentication;
pub mod handshake;
pub mod models;
pub mod provider;
pub mod session;
pub mod settings;
pub mod utils;
pub mod validation;

// Make test utilities available for both unit tests and integration tests
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use authentication::{IdentityExchange, ProfileStore, ServiceConfigBuilder, ServiceContainer};
pub use handshake::{HandshakeCoordinator, ProviderCallback, Resolution};
pub use models::{AuthResult, AuthUser, ExchangeError, FullName, ProviderCredential, SignInError};
pub use provider::{IdentityProvider, ProviderError, ProviderErrorCode};
pub use session::{AuthState, SessionOrchestrator, SessionPhase, SignInOutcome};
pub use settings::BelaySettings;
pub use validation::{CredentialValidator, ValidationError};
