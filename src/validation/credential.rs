//! Provider credential validation
//!
//! Checks run in a fixed order, each mapping to its own failure:
//! 1. the attempt's nonce must still be held
//! 2. the credential must carry an identity token
//! 3. the token must decode as UTF-8
//!
//! The echoed nonce inside the signed token is not compared locally. The raw
//! nonce is forwarded so the backend exchange binds token and nonce.

use crate::models::{AuthResult, ProviderCredential};
use crate::provider::{ProviderError, ProviderErrorCode};
use crate::utils::crypto::Nonce;
use log::{debug, error};
use thiserror::Error;

/// Local credential validation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ValidationError {
    /// A credential arrived with no nonce on record for the attempt
    #[error("credential received without an issued nonce")]
    InvalidState,
    #[error("credential carries no identity token")]
    NoIdentityToken,
    #[error("identity token is not valid UTF-8")]
    TokenSerializationFailed,
}

impl ValidationError {
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            ValidationError::InvalidState => {
                "Invalid state: a sign-in callback was received, but no sign-in request was sent."
            }
            ValidationError::NoIdentityToken => "Unable to fetch the identity token.",
            ValidationError::TokenSerializationFailed => {
                "Unable to read the identity token. Please try again."
            }
        }
    }
}

/// Validator for credentials returned by the identity provider
pub struct CredentialValidator;

impl CredentialValidator {
    /// Validate a provider credential against the nonce issued for its attempt
    ///
    /// Takes ownership of the credential; nothing from it outlives this call
    /// except what is moved into the returned [`AuthResult`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No nonce is held for the attempt (`InvalidState`)
    /// - The credential has no identity token, or an empty one (`NoIdentityToken`)
    /// - The identity token bytes are not UTF-8 (`TokenSerializationFailed`)
    pub fn validate(
        credential: ProviderCredential,
        expected_nonce: Option<Nonce>,
    ) -> Result<AuthResult, ValidationError> {
        let Some(nonce) = expected_nonce else {
            error!("Credential received but no nonce was issued for this attempt");
            return Err(ValidationError::InvalidState);
        };

        let token_bytes = match credential.identity_token {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => {
                debug!("Provider credential is missing its identity token");
                return Err(ValidationError::NoIdentityToken);
            }
        };

        let identity_token = String::from_utf8(token_bytes).map_err(|e| {
            debug!(
                "Identity token is not valid UTF-8 (valid up to byte {})",
                e.utf8_error().valid_up_to()
            );
            ValidationError::TokenSerializationFailed
        })?;

        Ok(AuthResult::new(identity_token, nonce, credential.full_name))
    }

    /// Classify a provider failure code into the closed error set
    #[must_use]
    pub fn classify(code: ProviderErrorCode) -> ProviderError {
        let classified = ProviderError::from(code);
        debug!("Classified {code} as {classified:?}");
        classified
    }
}
