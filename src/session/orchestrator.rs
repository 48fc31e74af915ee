//! Session Orchestrator - sign-in use cases and the authentication lifecycle
//!
//! Drives every entry point (provider handshake, email/password, account
//! creation, sign-out) through the session state machine and publishes the
//! outcome into [`AuthState`].
//!
//! ## Organization
//!
//! 1. **Construction** - wiring collaborators and shared state
//! 2. **Entry Points** - sign-in, account creation, sign-out
//! 3. **Attempt Lifecycle** - the loading guard and outcome publication
//! 4. **Tests**

use crate::authentication::{IdentityExchange, ProfileStore};
use crate::handshake::HandshakeCoordinator;
use crate::models::{AuthResult, AuthUser, FullName, SignInError, UserProfile};
use crate::session::machine::{SessionInput, SessionMachine, SessionMachineState, SessionPhase};
use crate::session::state::{AuthState, SessionStatus};
use crate::session::SignInMethod;
use crate::utils::logging::LoggingHelper;
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Result of a sign-in entry point that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    /// The user is signed in and published to [`AuthState`]
    Authenticated(AuthUser),
    /// Another attempt was already loading; this call did nothing
    AlreadyLoading,
    /// Sign-out was requested while this attempt was pending; its user was discarded
    SignedOut,
}

impl SignInOutcome {
    #[must_use]
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            SignInOutcome::Authenticated(user) => Some(user),
            SignInOutcome::AlreadyLoading | SignInOutcome::SignedOut => None,
        }
    }
}

// =============================================================================
// 1. Construction
// =============================================================================

#[derive(Clone)]
pub struct SessionOrchestrator {
    coordinator: HandshakeCoordinator,
    exchange: Arc<dyn IdentityExchange>,
    profiles: Option<Arc<dyn ProfileStore>>,
    state: AuthState,
    machine: Arc<Mutex<SessionMachine>>,
    sign_outs: Arc<AtomicU64>,
}

impl SessionOrchestrator {
    #[must_use]
    pub fn new(
        coordinator: HandshakeCoordinator,
        exchange: Arc<dyn IdentityExchange>,
        state: AuthState,
    ) -> Self {
        Self {
            coordinator,
            exchange,
            profiles: None,
            state,
            machine: Arc::new(Mutex::new(SessionMachine::new())),
            sign_outs: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Configure the repository that receives profiles of newly created accounts
    #[must_use]
    pub fn with_profile_store(mut self, profiles: Arc<dyn ProfileStore>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    #[must_use]
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    #[must_use]
    pub fn coordinator(&self) -> &HandshakeCoordinator {
        &self.coordinator
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from(self.lock_machine().state())
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.state.error_message()
    }

    fn lock_machine(&self) -> MutexGuard<'_, SessionMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// 2. Entry Points
// =============================================================================

impl SessionOrchestrator {
    /// Sign in through the third-party identity provider
    ///
    /// Runs the handshake, exchanges the validated credential with the
    /// backend and publishes the resulting user. A no-op returning
    /// [`SignInOutcome::AlreadyLoading`] while another attempt is loading.
    ///
    /// # Errors
    ///
    /// Returns an error if the handshake fails or is canceled, or if the
    /// backend exchange rejects the credential. A cancellation leaves no
    /// error message behind.
    pub async fn sign_in_with_provider(&self) -> Result<SignInOutcome, SignInError> {
        let Some(attempt) = self.begin_attempt(SignInMethod::Provider) else {
            return Ok(SignInOutcome::AlreadyLoading);
        };

        let result = self.run_provider_sign_in().await;
        attempt.finish(result)
    }

    /// Sign in with email and password
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the credentials are rejected
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, SignInError> {
        let Some(attempt) = self.begin_attempt(SignInMethod::EmailPassword) else {
            return Ok(SignInOutcome::AlreadyLoading);
        };

        let result = self
            .exchange
            .exchange_email_password(email, password)
            .await
            .map_err(SignInError::from);
        attempt.finish(result)
    }

    /// Create an email/password account, write its profile, and sign it in
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the account or its profile cannot be created
    pub async fn create_account(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<SignInOutcome, SignInError> {
        let Some(attempt) = self.begin_attempt(SignInMethod::AccountCreation) else {
            return Ok(SignInOutcome::AlreadyLoading);
        };

        let result = self
            .run_account_creation(email, password, first_name, last_name)
            .await;
        attempt.finish(result)
    }

    /// Sign out
    ///
    /// Asks the backend to end the session, then clears the local user
    /// whether or not that succeeded. Termination failures are logged only.
    /// A sign-in still pending at this point is discarded when it completes.
    pub async fn sign_out(&self) {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        let terminated = self.exchange.terminate_session().await;
        LoggingHelper::log_sign_out(terminated.as_ref().copied());

        let signed_out = self.state.clear_user();
        let mut machine = self.lock_machine();
        if machine.consume(&SessionInput::SignOutRequested).is_err() {
            // an attempt is still authenticating; it sees the sign-out when it finishes
            debug!(
                "Sign-out requested during a pending sign-in; cleared user {:?} only",
                signed_out.map(|u| u.id)
            );
            return;
        }

        self.state.set_status(SessionStatus {
            phase: SessionPhase::from(machine.state()),
            is_loading: false,
            error_message: None,
        });
    }

    /// Clear a displayed error and return to idle. Returns whether there was one.
    pub fn dismiss_error(&self) -> bool {
        let mut machine = self.lock_machine();
        if *machine.state() != SessionMachineState::Failed {
            return false;
        }
        if machine.consume(&SessionInput::Acknowledged).is_err() {
            return false;
        }

        self.state.set_status(SessionStatus {
            phase: SessionPhase::from(machine.state()),
            is_loading: false,
            error_message: None,
        });
        true
    }

    async fn run_provider_sign_in(&self) -> Result<AuthUser, SignInError> {
        let auth: AuthResult = self.coordinator.begin_sign_in().await?;
        let mut user = self.exchange.exchange_credential(&auth).await?;

        // providers share the name only on first authorization
        if user.display_name.is_none() {
            user.display_name = auth.full_name().and_then(FullName::display_name);
        }
        Ok(user)
    }

    async fn run_account_creation(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<AuthUser, SignInError> {
        let mut user = self.exchange.create_account(email, password).await?;
        let profile = UserProfile::for_user(&user, email, first_name, last_name);

        match &self.profiles {
            Some(profiles) => profiles.create_profile(&profile).await?,
            None => warn!(
                "No profile store configured; profile for user {} was not written",
                user.id
            ),
        }

        if user.display_name.is_none() {
            let name = format!("{} {}", profile.first_name, profile.last_name);
            let name = name.trim();
            if !name.is_empty() {
                user.display_name = Some(name.to_string());
            }
        }
        Ok(user)
    }
}

// =============================================================================
// 3. Attempt Lifecycle
// =============================================================================

impl SessionOrchestrator {
    /// Enter `Authenticating`, or `None` if an attempt is already loading
    fn begin_attempt(&self, method: SignInMethod) -> Option<AttemptGuard<'_>> {
        let mut machine = self.lock_machine();
        if self.state.is_loading() {
            debug!("Ignoring {method} sign-in request: another attempt is loading");
            return None;
        }

        if *machine.state() == SessionMachineState::Failed {
            let _ = machine.consume(&SessionInput::Acknowledged);
        }
        if machine.consume(&SessionInput::SignInRequested).is_err() {
            warn!(
                "Ignoring {method} sign-in request in state {:?}",
                machine.state()
            );
            return None;
        }

        self.state.set_status(SessionStatus {
            phase: SessionPhase::Authenticating,
            is_loading: true,
            error_message: None,
        });

        Some(AttemptGuard {
            orchestrator: self,
            method,
            sign_outs: self.sign_outs.load(Ordering::SeqCst),
            finished: false,
        })
    }
}

/// Loading guard for one entry point call
///
/// `finish` publishes the outcome, unless `sign_out` ran since the attempt
/// began. Dropping the guard unfinished (the calling future was dropped)
/// fails the attempt quietly and clears `is_loading`.
struct AttemptGuard<'a> {
    orchestrator: &'a SessionOrchestrator,
    method: SignInMethod,
    /// Sign-out count when the attempt began
    sign_outs: u64,
    finished: bool,
}

impl AttemptGuard<'_> {
    fn finish(mut self, result: Result<AuthUser, SignInError>) -> Result<SignInOutcome, SignInError> {
        self.finished = true;
        let state = &self.orchestrator.state;
        let mut machine = self.orchestrator.lock_machine();

        if self.orchestrator.sign_outs.load(Ordering::SeqCst) != self.sign_outs {
            Self::reset_quietly(&mut machine, state);
            debug!("{} sign-in completed after sign-out; outcome discarded", self.method);
            return result.map(|_| SignInOutcome::SignedOut);
        }

        match result {
            Ok(user) => {
                state.replace_user(user.clone());
                let _ = machine.consume(&SessionInput::SignInSucceeded);
                state.set_status(SessionStatus {
                    phase: SessionPhase::from(machine.state()),
                    is_loading: false,
                    error_message: None,
                });
                LoggingHelper::log_sign_in_succeeded(self.method, &user);
                Ok(SignInOutcome::Authenticated(user))
            }
            Err(err) => {
                let _ = machine.consume(&SessionInput::SignInFailed);
                if err.is_cancellation() {
                    // a completed failed attempt, but nothing to display
                    let _ = machine.consume(&SessionInput::Acknowledged);
                }
                state.set_status(SessionStatus {
                    phase: SessionPhase::from(machine.state()),
                    is_loading: false,
                    error_message: err.user_message().map(str::to_string),
                });
                LoggingHelper::log_sign_in_failed(self.method, &err);
                Err(err)
            }
        }
    }

    /// End the attempt in `Idle` with nothing published and no error
    fn reset_quietly(machine: &mut SessionMachine, state: &AuthState) {
        let _ = machine.consume(&SessionInput::SignInFailed);
        let _ = machine.consume(&SessionInput::Acknowledged);
        state.set_status(SessionStatus {
            phase: SessionPhase::from(machine.state()),
            is_loading: false,
            error_message: None,
        });
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let mut machine = self.orchestrator.lock_machine();
        Self::reset_quietly(&mut machine, &self.orchestrator.state);
        debug!("{} sign-in abandoned by its caller", self.method);
    }
}

// =============================================================================
// 4. Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExchangeError, ProviderCredential};
    use crate::provider::{ProviderError, ProviderErrorCode};
    use crate::testing::mock::{
        MockIdentityExchange, MockProfileStore, ScriptedProvider, ScriptedResponse,
    };
    use crate::validation::ValidationError;

    fn orchestrator(
        provider: Arc<ScriptedProvider>,
        exchange: Arc<MockIdentityExchange>,
    ) -> SessionOrchestrator {
        SessionOrchestrator::new(HandshakeCoordinator::new(provider), exchange, AuthState::new())
    }

    #[tokio::test]
    async fn test_provider_sign_in_publishes_user() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push(ScriptedResponse::Succeed(
            ProviderCredential::with_token("tok123").full_name(FullName::first("Jane")),
        ));
        let exchange = Arc::new(MockIdentityExchange::new().with_user(AuthUser::new("u1")));
        let orchestrator = orchestrator(provider, exchange.clone());

        let outcome = orchestrator.sign_in_with_provider().await.unwrap();

        assert_eq!(outcome.user().map(|u| u.id.as_str()), Some("u1"));
        let user = orchestrator.state().current_user().unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Jane"));
        assert!(!orchestrator.is_loading());
        assert_eq!(orchestrator.phase(), SessionPhase::Authenticated);
        assert_eq!(exchange.exchanged_tokens(), vec!["tok123".to_string()]);
    }

    #[tokio::test]
    async fn test_cancellation_is_silent_and_idle() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push(ScriptedResponse::Fail(ProviderErrorCode::CANCELED));
        let orchestrator = orchestrator(provider, Arc::new(MockIdentityExchange::new()));

        let err = orchestrator.sign_in_with_provider().await.unwrap_err();

        assert!(err.is_cancellation());
        assert_eq!(orchestrator.error_message(), None);
        assert!(!orchestrator.is_loading());
        assert_eq!(orchestrator.phase(), SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_missing_token_sets_fixed_message() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push(ScriptedResponse::Succeed(ProviderCredential::default()));
        let orchestrator = orchestrator(provider, Arc::new(MockIdentityExchange::new()));

        let err = orchestrator.sign_in_with_provider().await.unwrap_err();

        assert_eq!(err, SignInError::Validation(ValidationError::NoIdentityToken));
        assert_eq!(
            orchestrator.error_message().as_deref(),
            Some(ValidationError::NoIdentityToken.user_message())
        );
        assert_eq!(orchestrator.phase(), SessionPhase::Failed);
        assert!(!orchestrator.is_loading());
    }

    #[tokio::test]
    async fn test_backend_message_passes_through() {
        let exchange = Arc::new(
            MockIdentityExchange::new().failing_with(ExchangeError::new("The password is invalid.")),
        );
        let orchestrator = orchestrator(Arc::new(ScriptedProvider::new()), exchange);

        let err = orchestrator.sign_in("a@b.c", "nope").await.unwrap_err();

        assert!(matches!(err, SignInError::Exchange(_)));
        assert_eq!(
            orchestrator.error_message().as_deref(),
            Some("The password is invalid.")
        );
    }

    #[tokio::test]
    async fn test_retry_after_failure_clears_error() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push(ScriptedResponse::Fail(ProviderErrorCode::FAILED));
        provider.push(ScriptedResponse::Succeed(ProviderCredential::with_token("tok")));
        let exchange = Arc::new(MockIdentityExchange::new().with_user(AuthUser::new("u1")));
        let orchestrator = orchestrator(provider, exchange);

        let err = orchestrator.sign_in_with_provider().await.unwrap_err();
        assert_eq!(err, SignInError::Provider(ProviderError::Failed));
        assert!(orchestrator.error_message().is_some());

        orchestrator.sign_in_with_provider().await.unwrap();
        assert_eq!(orchestrator.error_message(), None);
        assert_eq!(orchestrator.phase(), SessionPhase::Authenticated);
    }

    #[tokio::test]
    async fn test_dismiss_error_returns_to_idle() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push(ScriptedResponse::Fail(ProviderErrorCode::INVALID_RESPONSE));
        let orchestrator = orchestrator(provider, Arc::new(MockIdentityExchange::new()));

        let _ = orchestrator.sign_in_with_provider().await;
        assert!(orchestrator.dismiss_error());
        assert_eq!(orchestrator.phase(), SessionPhase::Idle);
        assert_eq!(orchestrator.error_message(), None);
        assert!(!orchestrator.dismiss_error());
    }

    #[tokio::test]
    async fn test_re_entrant_call_is_a_no_op() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push(ScriptedResponse::Hold);
        let exchange = Arc::new(MockIdentityExchange::new().with_user(AuthUser::new("u1")));
        let orchestrator = orchestrator(provider.clone(), exchange);

        let first = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.sign_in_with_provider().await }
        });
        provider.wait_for_requests(1).await;
        assert!(orchestrator.is_loading());

        assert_eq!(
            orchestrator.sign_in_with_provider().await.unwrap(),
            SignInOutcome::AlreadyLoading
        );
        assert_eq!(
            orchestrator.sign_in("a@b.c", "pw").await.unwrap(),
            SignInOutcome::AlreadyLoading
        );
        assert_eq!(provider.request_count(), 1);

        let _ = provider
            .last_callback()
            .unwrap()
            .on_success(ProviderCredential::with_token("tok"));
        assert!(first.await.unwrap().is_ok());
        assert!(!orchestrator.is_loading());
    }

    #[tokio::test]
    async fn test_abandoned_attempt_releases_loading() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push(ScriptedResponse::Hold);
        let orchestrator = orchestrator(provider.clone(), Arc::new(MockIdentityExchange::new()));

        let task = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.sign_in_with_provider().await }
        });
        provider.wait_for_requests(1).await;
        task.abort();
        let _ = task.await;

        assert!(!orchestrator.is_loading());
        assert_eq!(orchestrator.phase(), SessionPhase::Idle);
        assert!(!orchestrator.coordinator().is_in_progress());
    }

    #[tokio::test]
    async fn test_sign_out_clears_user_even_when_termination_fails() {
        let exchange = Arc::new(
            MockIdentityExchange::new()
                .with_user(AuthUser::new("u1"))
                .failing_termination(ExchangeError::new("network unreachable")),
        );
        let orchestrator = orchestrator(Arc::new(ScriptedProvider::new()), exchange.clone());

        orchestrator.sign_in("a@b.c", "pw").await.unwrap();
        assert!(orchestrator.state().is_authenticated());

        orchestrator.sign_out().await;

        assert!(orchestrator.state().current_user().is_none());
        assert_eq!(orchestrator.phase(), SessionPhase::Idle);
        assert_eq!(exchange.termination_count(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_during_pending_sign_in_discards_its_user() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push(ScriptedResponse::Hold);
        let exchange = Arc::new(MockIdentityExchange::new().with_user(AuthUser::new("u1")));
        let orchestrator = orchestrator(provider.clone(), exchange);

        let attempt = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.sign_in_with_provider().await }
        });
        provider.wait_for_requests(1).await;

        orchestrator.sign_out().await;
        assert!(orchestrator.state().current_user().is_none());

        let _ = provider
            .last_callback()
            .unwrap()
            .on_success(ProviderCredential::with_token("tok"));

        assert_eq!(attempt.await.unwrap().unwrap(), SignInOutcome::SignedOut);
        assert!(orchestrator.state().current_user().is_none());
        assert_eq!(orchestrator.phase(), SessionPhase::Idle);
        assert_eq!(orchestrator.error_message(), None);
        assert!(!orchestrator.is_loading());

        provider.push(ScriptedResponse::Succeed(ProviderCredential::with_token("tok")));
        orchestrator.sign_in_with_provider().await.unwrap();
        assert_eq!(orchestrator.state().current_user_id().as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_failed_re_sign_in_keeps_user_in_failed_phase() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push(ScriptedResponse::Succeed(ProviderCredential::with_token("tok")));
        provider.push(ScriptedResponse::Fail(ProviderErrorCode::FAILED));
        let exchange = Arc::new(MockIdentityExchange::new().with_user(AuthUser::new("u1")));
        let orchestrator = orchestrator(provider, exchange);

        orchestrator.sign_in_with_provider().await.unwrap();
        let _ = orchestrator.sign_in_with_provider().await.unwrap_err();

        let status = orchestrator.state().status();
        assert_eq!(status.phase, SessionPhase::Failed);
        assert!(status.error_message.is_some());
        assert!(orchestrator.state().is_authenticated());
        assert_eq!(orchestrator.state().current_user_id().as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_create_account_writes_profile() {
        let exchange = Arc::new(
            MockIdentityExchange::new().with_user(AuthUser::new("u9").with_email("new@belay.app")),
        );
        let profiles = Arc::new(MockProfileStore::new());
        let orchestrator = orchestrator(Arc::new(ScriptedProvider::new()), exchange)
            .with_profile_store(profiles.clone());

        let outcome = orchestrator
            .create_account("new@belay.app", "pw", "Lynn", "Hill")
            .await
            .unwrap();

        assert_eq!(
            outcome.user().and_then(|u| u.display_name.as_deref()),
            Some("Lynn Hill")
        );
        let written = profiles.profiles();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].id, "u9");
        assert_eq!(written[0].last_name, "Hill");
    }

    #[tokio::test]
    async fn test_profile_failure_fails_account_creation() {
        let exchange = Arc::new(MockIdentityExchange::new().with_user(AuthUser::new("u9")));
        let profiles =
            Arc::new(MockProfileStore::new().failing_with(ExchangeError::new("Profile write denied.")));
        let orchestrator = orchestrator(Arc::new(ScriptedProvider::new()), exchange)
            .with_profile_store(profiles);

        let err = orchestrator
            .create_account("new@belay.app", "pw", "Lynn", "Hill")
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), Some("Profile write denied."));
        assert!(orchestrator.state().current_user().is_none());
    }
}
