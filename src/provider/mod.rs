//! Identity provider surface
//!
//! The external authorization UI is an opaque collaborator. The core hands it
//! an [`AuthorizationRequest`] carrying the nonce digest as challenge, plus a
//! [`ProviderCallback`] through which the UI layer reports exactly one outcome.

pub mod apple;
pub mod errors;

pub use apple::AppleCallbackPayload;
pub use errors::{ProviderError, ProviderErrorCode};

use crate::handshake::{AttemptId, ProviderCallback};
use crate::utils::crypto::NonceDigest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Profile scopes a sign-in request may ask the provider for
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationScope {
    FullName,
    Email,
}

impl AuthorizationScope {
    /// Standard profile scopes requested on every sign-in
    pub const STANDARD: [AuthorizationScope; 2] =
        [AuthorizationScope::FullName, AuthorizationScope::Email];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AuthorizationScope::FullName => "full_name",
            AuthorizationScope::Email => "email",
        }
    }

    /// Parse a scope name as written in configuration
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "full_name" | "name" => Some(AuthorizationScope::FullName),
            "email" => Some(AuthorizationScope::Email),
            _ => None,
        }
    }
}

impl fmt::Display for AuthorizationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization request handed to the provider UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub attempt: AttemptId,
    pub scopes: Vec<AuthorizationScope>,
    /// SHA-256 of the attempt's nonce; the raw nonce never leaves the core here
    pub challenge: NonceDigest,
}

/// External identity provider UI.
///
/// `request_authorization` presents the provider's modal flow and returns
/// immediately. The implementation must eventually report the outcome through
/// `callback` exactly once: `on_success` with the credential, or `on_failure`
/// with the platform error code (user cancellation included).
pub trait IdentityProvider {
    fn request_authorization(&self, request: AuthorizationRequest, callback: ProviderCallback);

    /// Provider name used in logs
    fn provider_name(&self) -> &str {
        "apple"
    }
}
