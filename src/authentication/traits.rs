//! Backend collaborator traits
//!
//! The session orchestrator talks to the backend identity service and the
//! profile repository only through these traits. Transport is owned by the
//! implementations; every failure comes back as an [`ExchangeError`] whose
//! message is shown to the user unchanged.

use crate::models::{AuthResult, AuthUser, ExchangeError, UserProfile};
use async_trait::async_trait;

/// Backend identity service: turns credentials into a domain user
#[async_trait]
pub trait IdentityExchange: Send + Sync {
    /// Exchange a validated provider credential for a user
    ///
    /// The implementation sends the identity token together with the raw
    /// nonce; the backend checks the nonce echoed inside the signed token.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the token or cannot be reached
    async fn exchange_credential(&self, auth: &AuthResult) -> Result<AuthUser, ExchangeError>;

    /// Sign in with email and password
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the backend cannot be reached
    async fn exchange_email_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, ExchangeError>;

    /// Register a new email/password identity
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be created (email taken, weak password, ...)
    async fn create_account(&self, email: &str, password: &str)
        -> Result<AuthUser, ExchangeError>;

    /// End the remote session. Best-effort: callers clear local state regardless.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not terminate the session
    async fn terminate_session(&self) -> Result<(), ExchangeError>;
}

/// User profile repository
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Persist the profile document of a newly created account
    ///
    /// # Errors
    ///
    /// Returns an error if the profile could not be written
    async fn create_profile(&self, profile: &UserProfile) -> Result<(), ExchangeError>;
}
