//! Core data types shared by the handshake, validation and session layers

use crate::utils::crypto::Nonce;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod auth;

pub use auth::{ExchangeError, SignInError};

/// Structured name components returned by the identity provider.
///
/// Providers only share the name on the first authorization, so every part is optional.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct FullName {
    #[serde(rename = "firstName", default)]
    pub first_name: Option<String>,
    #[serde(rename = "middleName", default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(rename = "lastName", default)]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl FullName {
    /// Name with only a first component
    #[must_use]
    pub fn first(first_name: &str) -> Self {
        Self {
            first_name: Some(first_name.to_string()),
            ..Self::default()
        }
    }

    /// Name with first and last components
    #[must_use]
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            ..Self::default()
        }
    }

    /// Join the non-empty given/middle/family parts with spaces
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            self.nickname.clone()
        } else {
            Some(parts.join(" "))
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display_name().is_none()
    }
}

/// Raw credential handed over by the identity provider on success.
///
/// Consumed by the credential validator; never stored afterwards.
#[derive(Clone, Default)]
pub struct ProviderCredential {
    /// Signed identity token bytes (a JWT when decoded)
    pub identity_token: Option<Vec<u8>>,
    /// Provider-issued opaque user identifier
    pub user_identifier: Option<String>,
    pub full_name: Option<FullName>,
    pub email: Option<String>,
}

impl ProviderCredential {
    /// Credential carrying an identity token
    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self {
            identity_token: Some(token.as_bytes().to_vec()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn full_name(mut self, name: FullName) -> Self {
        self.full_name = Some(name);
        self
    }

    #[must_use]
    pub fn user_identifier(mut self, user_identifier: &str) -> Self {
        self.user_identifier = Some(user_identifier.to_string());
        self
    }

    #[must_use]
    pub fn email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }
}

impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredential")
            .field(
                "identity_token",
                &self.identity_token.as_ref().map(|_| "<redacted>"),
            )
            .field("user_identifier", &self.user_identifier)
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .finish()
    }
}

/// Validated handshake output, ready for the backend identity exchange
#[derive(Clone, PartialEq, Eq)]
pub struct AuthResult {
    identity_token: String,
    nonce: Nonce,
    full_name: Option<FullName>,
}

impl AuthResult {
    pub(crate) fn new(identity_token: String, nonce: Nonce, full_name: Option<FullName>) -> Self {
        Self {
            identity_token,
            nonce,
            full_name,
        }
    }

    #[must_use]
    pub fn identity_token(&self) -> &str {
        &self.identity_token
    }

    /// The raw nonce issued for this attempt; the backend verifies it against the token
    #[must_use]
    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    #[must_use]
    pub fn full_name(&self) -> Option<&FullName> {
        self.full_name.as_ref()
    }
}

impl fmt::Debug for AuthResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResult")
            .field("identity_token", &"<redacted>")
            .field("nonce", &self.nonce)
            .field("full_name", &self.full_name)
            .finish()
    }
}

/// Domain user returned by the backend identity service
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl AuthUser {
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            email: None,
            display_name: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: &str) -> Self {
        self.display_name = Some(display_name.to_string());
        self
    }
}

/// Profile document written when an account is created with email and password
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserProfile {
    #[must_use]
    pub fn for_user(user: &AuthUser, email: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone().unwrap_or_else(|| email.to_string()),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
        }
    }
}
