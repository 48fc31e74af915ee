//! Mock objects and fake implementations for testing
//!
//! Stand-ins for the identity provider UI and the backend collaborators, so
//! sign-in flows can be driven without any platform or network.

use crate::authentication::{IdentityExchange, ProfileStore};
use crate::handshake::ProviderCallback;
use crate::models::{AuthResult, AuthUser, ExchangeError, ProviderCredential, UserProfile};
use crate::provider::{AuthorizationRequest, IdentityProvider, ProviderErrorCode};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What the scripted provider does with the next authorization request
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Keep the callback pending; drive it later through [`ScriptedProvider::last_callback`]
    Hold,
    /// Report success with this credential before returning
    Succeed(ProviderCredential),
    /// Report failure with this platform code before returning
    Fail(ProviderErrorCode),
}

/// Identity provider answering requests from a queue of scripted responses.
///
/// An empty queue behaves as [`ScriptedResponse::Hold`].
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<ScriptedResponse>>,
    requests: Mutex<Vec<AuthorizationRequest>>,
    callbacks: Mutex<Vec<ProviderCallback>>,
    requested: Notify,
}

impl ScriptedProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the response to the next unanswered request
    pub fn push(&self, response: ScriptedResponse) {
        lock(&self.script).push_back(response);
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    #[must_use]
    pub fn requests(&self) -> Vec<AuthorizationRequest> {
        lock(&self.requests).clone()
    }

    /// Callback of the most recent request
    #[must_use]
    pub fn last_callback(&self) -> Option<ProviderCallback> {
        lock(&self.callbacks).last().cloned()
    }

    /// Wait until at least `count` authorization requests were received
    pub async fn wait_for_requests(&self, count: usize) {
        loop {
            let notified = self.requested.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.request_count() >= count {
                return;
            }
            notified.await;
        }
    }
}

impl IdentityProvider for ScriptedProvider {
    fn request_authorization(&self, request: AuthorizationRequest, callback: ProviderCallback) {
        lock(&self.requests).push(request);
        lock(&self.callbacks).push(callback.clone());
        self.requested.notify_waiters();

        let response = lock(&self.script)
            .pop_front()
            .unwrap_or(ScriptedResponse::Hold);
        match response {
            ScriptedResponse::Hold => {}
            ScriptedResponse::Succeed(credential) => {
                let _ = callback.on_success(credential);
            }
            ScriptedResponse::Fail(code) => {
                let _ = callback.on_failure(code);
            }
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

/// Backend identity service returning a fixed user or a fixed failure
pub struct MockIdentityExchange {
    user: AuthUser,
    failure: Option<ExchangeError>,
    termination_failure: Option<ExchangeError>,
    exchanged: Mutex<Vec<(String, String)>>,
    terminations: AtomicUsize,
}

impl Default for MockIdentityExchange {
    fn default() -> Self {
        Self {
            user: AuthUser::new("mock-user"),
            failure: None,
            termination_failure: None,
            exchanged: Mutex::new(Vec::new()),
            terminations: AtomicUsize::new(0),
        }
    }
}

impl MockIdentityExchange {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// User returned by every successful sign-in
    #[must_use]
    pub fn with_user(mut self, user: AuthUser) -> Self {
        self.user = user;
        self
    }

    /// Fail every sign-in and account creation with this error
    #[must_use]
    pub fn failing_with(mut self, error: ExchangeError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Fail remote session termination with this error
    #[must_use]
    pub fn failing_termination(mut self, error: ExchangeError) -> Self {
        self.termination_failure = Some(error);
        self
    }

    /// Identity tokens received by `exchange_credential`, in order
    #[must_use]
    pub fn exchanged_tokens(&self) -> Vec<String> {
        lock(&self.exchanged).iter().map(|(t, _)| t.clone()).collect()
    }

    /// Raw nonces received by `exchange_credential`, in order
    #[must_use]
    pub fn exchanged_nonces(&self) -> Vec<String> {
        lock(&self.exchanged).iter().map(|(_, n)| n.clone()).collect()
    }

    #[must_use]
    pub fn termination_count(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }

    fn respond(&self) -> Result<AuthUser, ExchangeError> {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.user.clone()),
        }
    }
}

#[async_trait]
impl IdentityExchange for MockIdentityExchange {
    async fn exchange_credential(&self, auth: &AuthResult) -> Result<AuthUser, ExchangeError> {
        lock(&self.exchanged).push((
            auth.identity_token().to_string(),
            auth.nonce().as_str().to_string(),
        ));
        self.respond()
    }

    async fn exchange_email_password(
        &self,
        _email: &str,
        _password: &str,
    ) -> Result<AuthUser, ExchangeError> {
        self.respond()
    }

    async fn create_account(
        &self,
        email: &str,
        _password: &str,
    ) -> Result<AuthUser, ExchangeError> {
        let mut user = self.respond()?;
        if user.email.is_none() {
            user.email = Some(email.to_string());
        }
        Ok(user)
    }

    async fn terminate_session(&self) -> Result<(), ExchangeError> {
        self.terminations.fetch_add(1, Ordering::SeqCst);
        match &self.termination_failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Profile repository keeping written profiles in memory
#[derive(Default)]
pub struct MockProfileStore {
    profiles: Mutex<Vec<UserProfile>>,
    failure: Option<ExchangeError>,
}

impl MockProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing_with(mut self, error: ExchangeError) -> Self {
        self.failure = Some(error);
        self
    }

    #[must_use]
    pub fn profiles(&self) -> Vec<UserProfile> {
        lock(&self.profiles).clone()
    }
}

#[async_trait]
impl ProfileStore for MockProfileStore {
    async fn create_profile(&self, profile: &UserProfile) -> Result<(), ExchangeError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        lock(&self.profiles).push(profile.clone());
        Ok(())
    }
}
