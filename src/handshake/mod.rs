//! Third-party sign-in handshake
//!
//! # Modules
//!
//! - [`coordinator`] - Single-flight handshake coordinator (`begin_sign_in`)
//! - [`callback`] - The provider-facing callback surface and its completion slot
//!
//! ## Lifecycle
//!
//! ```text
//! begin_sign_in ──► slot: Some(pending{attempt, nonce, sender})
//!                        │
//!      provider UI ◄─────┘ request{challenge = sha256(nonce)}
//!           │
//!           ├─ on_success(credential) ─► validate(credential, nonce) ─┐
//!           └─ on_failure(code) ───────► classify(code) ──────────────┤
//!                                                                     ▼
//!                                  slot: None, sender resolved exactly once
//! ```

pub mod callback;
pub mod coordinator;

pub use callback::{ProviderCallback, Resolution};
pub use coordinator::HandshakeCoordinator;

use std::fmt;
use uuid::Uuid;

/// Identifier correlating one handshake attempt across logs and callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(Uuid);

impl AttemptId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // first block is enough to correlate log lines
        let id = self.0.simple().to_string();
        f.write_str(&id[..8])
    }
}
