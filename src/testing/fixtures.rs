//! Test fixtures providing pre-built test objects

use crate::models::{AuthUser, FullName, ProviderCredential};
use crate::provider::AppleCallbackPayload;
use crate::settings::BelaySettings;
use serde_json::json;

use super::constants::{TEST_EMAIL, TEST_FIRST_NAME, TEST_IDENTITY_TOKEN, TEST_USER_ID};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Credential a provider returns on a first authorization (token and name)
    #[must_use]
    pub fn credential() -> ProviderCredential {
        ProviderCredential::with_token(TEST_IDENTITY_TOKEN)
            .full_name(FullName::first(TEST_FIRST_NAME))
            .user_identifier("001234.abcdef.1234")
    }

    /// Credential of a returning user: the provider no longer shares the name
    #[must_use]
    pub fn returning_credential() -> ProviderCredential {
        ProviderCredential::with_token(TEST_IDENTITY_TOKEN).user_identifier("001234.abcdef.1234")
    }

    /// User returned by the backend for the standard credential
    #[must_use]
    pub fn user() -> AuthUser {
        AuthUser::new(TEST_USER_ID).with_email(TEST_EMAIL)
    }

    /// Default settings, already validated
    #[must_use]
    pub fn settings() -> BelaySettings {
        BelaySettings::default()
    }

    /// Web callback payload of a successful first sign-in
    #[must_use]
    pub fn apple_success_payload() -> AppleCallbackPayload {
        AppleCallbackPayload {
            id_token: Some(TEST_IDENTITY_TOKEN.to_string()),
            error: None,
            user: Some(json!({
                "name": { "firstName": TEST_FIRST_NAME, "lastName": "Doe" },
                "email": TEST_EMAIL,
            })),
        }
    }

    /// Web callback payload of a sign-in the user dismissed
    #[must_use]
    pub fn apple_canceled_payload() -> AppleCallbackPayload {
        AppleCallbackPayload {
            error: Some("user_cancelled_authorize".to_string()),
            ..AppleCallbackPayload::default()
        }
    }
}
