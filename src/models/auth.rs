//! Common authentication error types
//!
//! Each failure domain owns its own enum: provider-reported failures
//! ([`ProviderError`]), local credential checks ([`ValidationError`]) and the
//! backend identity exchange ([`ExchangeError`]). [`SignInError`] composes them
//! through explicit `From` conversions so callers match on one type.

use crate::provider::ProviderError;
use crate::validation::ValidationError;
use thiserror::Error;

/// Message shown when a second sign-in is attempted while one is pending
pub const ALREADY_IN_PROGRESS_MESSAGE: &str = "A sign-in is already in progress.";

/// Failure reported by the backend identity service, passed through to the user as-is
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ExchangeError {
    message: String,
}

impl ExchangeError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Every way a sign-in attempt can end without a user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignInError {
    /// A handshake is already pending; the new request was rejected, not queued
    #[error("a sign-in handshake is already in progress")]
    AlreadyInProgress,
    #[error("identity provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("credential validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("identity exchange failed: {0}")]
    Exchange(#[from] ExchangeError),
}

impl SignInError {
    /// True when the user dismissed the provider UI
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SignInError::Provider(ProviderError::Canceled))
    }

    /// Fixed, case-specific text for display. `None` for cancellations.
    ///
    /// Exchange failures carry the backend's own message unchanged.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            SignInError::AlreadyInProgress => Some(ALREADY_IN_PROGRESS_MESSAGE),
            SignInError::Provider(err) => err.user_message(),
            SignInError::Validation(err) => Some(err.user_message()),
            SignInError::Exchange(err) => Some(err.message()),
        }
    }
}
