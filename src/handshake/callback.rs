//! Provider callback surface and the single-assignment completion slot
//!
//! The slot holds the pending attempt: its id, its nonce, and the oneshot
//! sender its waiter listens on. Taking the pending attempt out of the slot
//! is the one and only resolution point, so a second callback for the same
//! attempt finds nothing to resolve and is ignored.

use crate::handshake::AttemptId;
use crate::models::{AuthResult, ProviderCredential, SignInError};
use crate::provider::ProviderErrorCode;
use crate::utils::crypto::Nonce;
use crate::utils::logging::LoggingHelper;
use crate::validation::CredentialValidator;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

pub(crate) type Completion = oneshot::Sender<Result<AuthResult, SignInError>>;

/// State of the one handshake allowed in flight
pub(crate) struct PendingHandshake {
    pub(crate) attempt: AttemptId,
    pub(crate) nonce: Nonce,
    pub(crate) completion: Completion,
}

pub(crate) type HandshakeSlot = Arc<Mutex<Option<PendingHandshake>>>;

/// Lock the slot, recovering the guard if a previous holder panicked
pub(crate) fn lock_slot(slot: &Mutex<Option<PendingHandshake>>) -> MutexGuard<'_, Option<PendingHandshake>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Outcome of delivering a provider callback
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The pending attempt was resolved by this call
    Delivered,
    /// Nothing was pending for this attempt; the call had no effect
    Ignored,
}

/// Callback handle given to the identity provider for one attempt.
///
/// Cheap to clone and safe to call from any thread. Only the first
/// `on_success`/`on_failure` call for the attempt has an effect.
#[derive(Clone)]
pub struct ProviderCallback {
    attempt: AttemptId,
    slot: HandshakeSlot,
}

impl ProviderCallback {
    pub(crate) fn new(attempt: AttemptId, slot: HandshakeSlot) -> Self {
        Self { attempt, slot }
    }

    /// Attempt this callback belongs to
    #[must_use]
    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    /// Report a successful authorization
    pub fn on_success(&self, credential: ProviderCredential) -> Resolution {
        let Some(pending) = self.take_pending() else {
            LoggingHelper::log_stale_callback(self.attempt, "success");
            return Resolution::Ignored;
        };

        // The nonce moves into the validator here and is gone after this call
        let result = CredentialValidator::validate(credential, Some(pending.nonce))
            .map_err(SignInError::from);
        self.complete(pending.completion, result)
    }

    /// Report a failed or canceled authorization
    pub fn on_failure(&self, code: ProviderErrorCode) -> Resolution {
        let Some(pending) = self.take_pending() else {
            LoggingHelper::log_stale_callback(self.attempt, "failure");
            return Resolution::Ignored;
        };

        drop(pending.nonce);
        let error = CredentialValidator::classify(code);
        self.complete(pending.completion, Err(error.into()))
    }

    /// Report either outcome, as produced by a payload bridge such as
    /// [`crate::provider::AppleCallbackPayload::into_outcome`]
    pub fn deliver(&self, outcome: Result<ProviderCredential, ProviderErrorCode>) -> Resolution {
        match outcome {
            Ok(credential) => self.on_success(credential),
            Err(code) => self.on_failure(code),
        }
    }

    /// Take the pending attempt if it is still ours, clearing the in-progress flag
    fn take_pending(&self) -> Option<PendingHandshake> {
        let mut slot = lock_slot(&self.slot);
        match slot.as_ref() {
            Some(pending) if pending.attempt == self.attempt => slot.take(),
            _ => None,
        }
    }

    fn complete(
        &self,
        completion: Completion,
        result: Result<AuthResult, SignInError>,
    ) -> Resolution {
        LoggingHelper::log_handshake_resolved(self.attempt, &result);
        if completion.send(result).is_err() {
            LoggingHelper::log_handshake_abandoned(self.attempt);
            return Resolution::Ignored;
        }
        Resolution::Delivered
    }
}

impl std::fmt::Debug for ProviderCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCallback")
            .field("attempt", &self.attempt)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;
    use crate::utils::crypto::nonce_from_str;
    use crate::validation::ValidationError;

    fn pending_slot() -> (
        ProviderCallback,
        HandshakeSlot,
        oneshot::Receiver<Result<AuthResult, SignInError>>,
    ) {
        let attempt = AttemptId::new();
        let (sender, receiver) = oneshot::channel();
        let slot: HandshakeSlot = Arc::new(Mutex::new(Some(PendingHandshake {
            attempt,
            nonce: nonce_from_str("0123456789abcdefghijklmnopqrstuv"),
            completion: sender,
        })));
        (ProviderCallback::new(attempt, Arc::clone(&slot)), slot, receiver)
    }

    #[test]
    fn test_success_resolves_slot_once() {
        let (callback, slot, mut receiver) = pending_slot();

        let first = callback.on_success(ProviderCredential::with_token("tok123"));
        let second = callback.on_failure(ProviderErrorCode::FAILED);

        assert_eq!(first, Resolution::Delivered);
        assert_eq!(second, Resolution::Ignored);
        assert!(lock_slot(&slot).is_none());

        let result = receiver.try_recv().unwrap().unwrap();
        assert_eq!(result.identity_token(), "tok123");
        assert_eq!(result.nonce().as_str(), "0123456789abcdefghijklmnopqrstuv");
    }

    #[test]
    fn test_failure_then_success_keeps_first_outcome() {
        let (callback, _slot, mut receiver) = pending_slot();

        assert_eq!(
            callback.on_failure(ProviderErrorCode::CANCELED),
            Resolution::Delivered
        );
        assert_eq!(
            callback.on_success(ProviderCredential::with_token("late")),
            Resolution::Ignored
        );

        let err = receiver.try_recv().unwrap().unwrap_err();
        assert_eq!(err, SignInError::Provider(ProviderError::Canceled));
    }

    #[test]
    fn test_validation_failure_resolves_with_error() {
        let (callback, slot, mut receiver) = pending_slot();

        assert_eq!(
            callback.on_success(ProviderCredential::default()),
            Resolution::Delivered
        );
        assert!(lock_slot(&slot).is_none());

        let err = receiver.try_recv().unwrap().unwrap_err();
        assert_eq!(err, SignInError::Validation(ValidationError::NoIdentityToken));
    }

    #[test]
    fn test_callback_for_other_attempt_is_ignored() {
        let (_callback, slot, mut receiver) = pending_slot();
        let foreign = ProviderCallback::new(AttemptId::new(), Arc::clone(&slot));

        assert_eq!(
            foreign.on_success(ProviderCredential::with_token("forged")),
            Resolution::Ignored
        );
        assert!(lock_slot(&slot).is_some());
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_dropped_waiter_reports_ignored() {
        let (callback, slot, receiver) = pending_slot();
        drop(receiver);

        assert_eq!(
            callback.on_failure(ProviderErrorCode::FAILED),
            Resolution::Ignored
        );
        assert!(lock_slot(&slot).is_none());
    }

    #[test]
    fn test_deliver_routes_outcomes() {
        let (callback, _slot, mut receiver) = pending_slot();
        assert_eq!(
            callback.deliver(Err(ProviderErrorCode::NOT_HANDLED)),
            Resolution::Delivered
        );
        assert_eq!(
            receiver.try_recv().unwrap().unwrap_err(),
            SignInError::Provider(ProviderError::NotHandled)
        );
    }

    #[test]
    fn test_callback_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProviderCallback>();
    }
}
