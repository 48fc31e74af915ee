//! Authentication state shared with the rest of the application
//!
//! `AuthState` is a cheap cloneable handle; every clone observes the same
//! session. Readers get snapshots or subscribe to changes. Only the session
//! orchestrator writes.

use crate::models::AuthUser;
use crate::session::machine::SessionPhase;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// The signed-in user and when the session started
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: AuthUser,
    pub signed_in_at: DateTime<Utc>,
}

/// Loading and error flags of the sign-in flow
///
/// `phase` tracks the latest sign-in attempt, not whether a user is signed
/// in. A re-sign-in that fails or is canceled leaves the previous user in
/// place while the phase reads `Failed` or `Idle`; ask
/// [`AuthState::is_authenticated`] for the signed-in question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub phase: SessionPhase,
    pub is_loading: bool,
    /// Fixed user-facing text of the last failure; `None` after cancellations
    pub error_message: Option<String>,
}

#[derive(Clone)]
pub struct AuthState {
    session: Arc<watch::Sender<Option<AuthSession>>>,
    status: Arc<watch::Sender<SessionStatus>>,
}

impl AuthState {
    /// Signed-out state with no error
    #[must_use]
    pub fn new() -> Self {
        let (session, _) = watch::channel(None);
        let (status, _) = watch::channel(SessionStatus::default());
        Self {
            session: Arc::new(session),
            status: Arc::new(status),
        }
    }

    #[must_use]
    pub fn current_user(&self) -> Option<AuthUser> {
        self.session.borrow().as_ref().map(|s| s.user.clone())
    }

    /// Id of the signed-in user, as read by repositories scoping their queries
    #[must_use]
    pub fn current_user_id(&self) -> Option<String> {
        self.session.borrow().as_ref().map(|s| s.user.id.clone())
    }

    #[must_use]
    pub fn session(&self) -> Option<AuthSession> {
        self.session.borrow().clone()
    }

    #[must_use]
    pub fn signed_in_at(&self) -> Option<DateTime<Utc>> {
        self.session.borrow().as_ref().map(|s| s.signed_in_at)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().is_some()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status.borrow().is_loading
    }

    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.status.borrow().error_message.clone()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.status.borrow().phase
    }

    /// Watch the signed-in session; the receiver sees the latest value first
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.session.subscribe()
    }

    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Replace the current user wholesale, restarting the session clock
    pub(crate) fn replace_user(&self, user: AuthUser) {
        self.session.send_replace(Some(AuthSession {
            user,
            signed_in_at: Utc::now(),
        }));
    }

    /// Clear the current user; returns the user that was signed in
    pub(crate) fn clear_user(&self) -> Option<AuthUser> {
        self.session.send_replace(None).map(|s| s.user)
    }

    pub(crate) fn set_status(&self, status: SessionStatus) {
        self.status.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("user_id", &self.current_user_id())
            .field("status", &*self.status.borrow())
            .finish()
    }
}
