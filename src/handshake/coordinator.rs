//! Single-flight sign-in handshake coordinator
//!
//! Bridges the callback-shaped provider API into one awaitable result.
//! At most one attempt is pending at a time; a second `begin_sign_in` while
//! one is pending fails immediately with [`SignInError::AlreadyInProgress`].
//!
//! No timeout is enforced. A provider UI that never calls back leaves the
//! attempt pending until its waiter is dropped.

use crate::handshake::callback::{lock_slot, HandshakeSlot, PendingHandshake};
use crate::handshake::{AttemptId, ProviderCallback};
use crate::models::{AuthResult, SignInError};
use crate::provider::{AuthorizationRequest, AuthorizationScope, IdentityProvider};
use crate::utils::crypto::NonceGenerator;
use crate::utils::logging::LoggingHelper;
use crate::validation::ValidationError;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Coordinator owning the (at most one) in-flight handshake
#[derive(Clone)]
pub struct HandshakeCoordinator {
    provider: Arc<dyn IdentityProvider + Send + Sync>,
    provider_name: Option<String>,
    nonces: NonceGenerator,
    scopes: Vec<AuthorizationScope>,
    slot: HandshakeSlot,
}

impl HandshakeCoordinator {
    /// Create a coordinator requesting the standard profile scopes with default-length nonces
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider + Send + Sync>) -> Self {
        Self {
            provider,
            provider_name: None,
            nonces: NonceGenerator::default(),
            scopes: AuthorizationScope::STANDARD.to_vec(),
            slot: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn with_nonce_generator(mut self, nonces: NonceGenerator) -> Self {
        self.nonces = nonces;
        self
    }

    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<AuthorizationScope>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Name the handshake logs report instead of the provider's own
    #[must_use]
    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.provider_name
            .as_deref()
            .unwrap_or_else(|| self.provider.provider_name())
    }

    /// Whether a handshake is currently pending
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        lock_slot(&self.slot).is_some()
    }

    /// Run one sign-in handshake to completion
    ///
    /// Registers the completion slot, then presents the provider UI with the
    /// nonce digest as challenge, then suspends until the provider calls back.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Another handshake is pending (`AlreadyInProgress`, the provider is not invoked)
    /// - The provider reports a failure or cancellation (`Provider`)
    /// - The returned credential fails validation (`Validation`)
    pub async fn begin_sign_in(&self) -> Result<AuthResult, SignInError> {
        let attempt = AttemptId::new();

        let (receiver, challenge) = {
            let mut slot = lock_slot(&self.slot);
            if let Some(pending) = slot.as_ref() {
                LoggingHelper::log_handshake_rejected(attempt, pending.attempt);
                return Err(SignInError::AlreadyInProgress);
            }

            let (nonce, challenge) = self.nonces.issue();
            let (completion, receiver) = oneshot::channel();
            *slot = Some(PendingHandshake {
                attempt,
                nonce,
                completion,
            });
            (receiver, challenge)
        };

        // Clears the slot on every exit path, including this future being dropped
        let _release = SlotRelease {
            slot: &self.slot,
            attempt,
        };

        LoggingHelper::log_handshake_started(
            self.provider_name(),
            attempt,
            &challenge,
            &self.scopes,
        );

        let request = AuthorizationRequest {
            attempt,
            scopes: self.scopes.clone(),
            challenge,
        };
        self.provider
            .request_authorization(request, ProviderCallback::new(attempt, Arc::clone(&self.slot)));

        match receiver.await {
            Ok(result) => result,
            // sender gone without a value: the slot was cleared under us
            Err(_) => Err(ValidationError::InvalidState.into()),
        }
    }
}

struct SlotRelease<'a> {
    slot: &'a HandshakeSlot,
    attempt: AttemptId,
}

impl Drop for SlotRelease<'_> {
    fn drop(&mut self) {
        let mut slot = lock_slot(self.slot);
        if slot.as_ref().is_some_and(|pending| pending.attempt == self.attempt) {
            LoggingHelper::log_handshake_abandoned(self.attempt);
            *slot = None;
        }
    }
}
