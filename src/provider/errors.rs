//! Provider-reported failure codes and their classification

use std::fmt;
use thiserror::Error;

/// Raw error code delivered by the provider's failure callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderErrorCode(pub i64);

impl ProviderErrorCode {
    pub const UNKNOWN: Self = Self(1000);
    pub const CANCELED: Self = Self(1001);
    pub const INVALID_RESPONSE: Self = Self(1002);
    pub const NOT_HANDLED: Self = Self(1003);
    pub const FAILED: Self = Self(1004);
    pub const NOT_INTERACTIVE: Self = Self(1005);

    #[must_use]
    pub const fn code(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider error code {}", self.0)
    }
}

/// Classified provider failure (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ProviderError {
    /// The user dismissed the provider UI. Never displayed as an error.
    #[error("authorization canceled by the user")]
    Canceled,
    #[error("authorization failed")]
    Failed,
    #[error("provider returned an invalid response")]
    InvalidResponse,
    #[error("authorization request was not handled")]
    NotHandled,
    #[error("unknown provider error")]
    Unknown,
}

impl ProviderError {
    /// Fixed display text; `None` for [`ProviderError::Canceled`]
    #[must_use]
    pub const fn user_message(self) -> Option<&'static str> {
        match self {
            ProviderError::Canceled => None,
            ProviderError::Failed => Some("Sign-in failed. Please try again."),
            ProviderError::InvalidResponse => {
                Some("The sign-in service sent an invalid response. Please try again.")
            }
            ProviderError::NotHandled => {
                Some("The sign-in request could not be handled. Please try again.")
            }
            ProviderError::Unknown => Some("An unknown error occurred during sign-in."),
        }
    }
}

impl From<ProviderErrorCode> for ProviderError {
    fn from(code: ProviderErrorCode) -> Self {
        match code {
            ProviderErrorCode::CANCELED => ProviderError::Canceled,
            ProviderErrorCode::FAILED => ProviderError::Failed,
            ProviderErrorCode::INVALID_RESPONSE => ProviderError::InvalidResponse,
            ProviderErrorCode::NOT_HANDLED => ProviderError::NotHandled,
            _ => ProviderError::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_classify_to_their_case() {
        assert_eq!(ProviderError::from(ProviderErrorCode::CANCELED), ProviderError::Canceled);
        assert_eq!(ProviderError::from(ProviderErrorCode::FAILED), ProviderError::Failed);
        assert_eq!(
            ProviderError::from(ProviderErrorCode::INVALID_RESPONSE),
            ProviderError::InvalidResponse
        );
        assert_eq!(
            ProviderError::from(ProviderErrorCode::NOT_HANDLED),
            ProviderError::NotHandled
        );
        assert_eq!(ProviderError::from(ProviderErrorCode::UNKNOWN), ProviderError::Unknown);
    }

    #[test]
    fn test_unrecognized_codes_are_unknown() {
        assert_eq!(
            ProviderError::from(ProviderErrorCode::NOT_INTERACTIVE),
            ProviderError::Unknown
        );
        assert_eq!(ProviderError::from(ProviderErrorCode(-1)), ProviderError::Unknown);
        assert_eq!(ProviderError::from(ProviderErrorCode(42)), ProviderError::Unknown);
    }

    #[test]
    fn test_only_cancel_is_silent() {
        assert!(ProviderError::Canceled.user_message().is_none());
        for err in [
            ProviderError::Failed,
            ProviderError::InvalidResponse,
            ProviderError::NotHandled,
            ProviderError::Unknown,
        ] {
            assert!(err.user_message().is_some());
        }
    }
}
