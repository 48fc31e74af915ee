//! Sign-in session state machine using rust-fsm.
//!
//! ```text
//!            SignInRequested
//!   ┌──────┐ ───────────────► ┌────────────────┐
//!   │ Idle │                  │ Authenticating │
//!   └──────┘ ◄──┐             └───────┬────────┘
//!      ▲        │ Acknowledged        │ SignInSucceeded / SignInFailed
//!      │        │                     ▼
//!      │     ┌──┴─────┐       ┌───────────────┐
//!      │     │ Failed │       │ Authenticated │ ── SignInRequested ──► Authenticating
//!      │     └────────┘       └───────┬───────┘
//!      └────── SignOutRequested ──────┘
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub session_machine(Idle)

    Idle => {
        SignInRequested => Authenticating,
        SignOutRequested => Idle
    },
    Authenticating => {
        SignInSucceeded => Authenticated,
        SignInFailed => Failed
    },
    Authenticated => {
        // re-sign-in replaces the user wholesale
        SignInRequested => Authenticating,
        SignOutRequested => Idle
    },
    Failed => {
        Acknowledged => Idle,
        SignOutRequested => Idle
    }
}

pub use session_machine::Input as SessionInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Observable view of the session machine state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    Authenticating,
    Authenticated,
    Failed,
}

impl SessionPhase {
    #[must_use]
    pub fn is_authenticated(self) -> bool {
        matches!(self, SessionPhase::Authenticated)
    }
}

impl From<&SessionMachineState> for SessionPhase {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Idle => SessionPhase::Idle,
            SessionMachineState::Authenticating => SessionPhase::Authenticating,
            SessionMachineState::Authenticated => SessionPhase::Authenticated,
            SessionMachineState::Failed => SessionPhase::Failed,
        }
    }
}
