// Centralized logging for the sign-in handshake and session lifecycle.
// Nonces and identity tokens never reach these helpers; digests are logged truncated.
use crate::handshake::AttemptId;
use crate::models::{AuthResult, AuthUser, ExchangeError, SignInError};
use crate::provider::AuthorizationScope;
use crate::session::SignInMethod;
use crate::utils::crypto::NonceDigest;
use log::{debug, info, warn};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log the start of a provider handshake
    pub fn log_handshake_started(
        provider: &str,
        attempt: AttemptId,
        challenge: &NonceDigest,
        scopes: &[AuthorizationScope],
    ) {
        info!(
            "🔐 Starting {provider} sign-in handshake {attempt} (challenge {}…, scopes {scopes:?})",
            challenge.short()
        );
    }

    /// Log a start request rejected because another handshake is pending
    pub fn log_handshake_rejected(attempt: AttemptId, pending: AttemptId) {
        warn!("⛔ Rejected sign-in handshake {attempt}: handshake {pending} is still pending");
    }

    /// Log how a handshake attempt resolved
    pub fn log_handshake_resolved(attempt: AttemptId, result: &Result<AuthResult, SignInError>) {
        match result {
            Ok(auth_result) => info!(
                "✅ Handshake {attempt} resolved with a validated credential (name shared: {})",
                auth_result.full_name().is_some()
            ),
            Err(err) if err.is_cancellation() => {
                info!("↩️  Handshake {attempt} canceled by the user");
            }
            Err(err) => warn!("❌ Handshake {attempt} failed: {err}"),
        }
    }

    /// Log a provider callback that arrived with no pending handshake to resolve
    pub fn log_stale_callback(attempt: AttemptId, kind: &str) {
        warn!(
            "Ignoring {kind} callback for handshake {attempt}: it was already resolved or abandoned"
        );
    }

    /// Log a pending handshake released because its waiter went away
    pub fn log_handshake_abandoned(attempt: AttemptId) {
        debug!("Releasing handshake {attempt}: the waiting caller was dropped");
    }

    /// Log session creation success
    pub fn log_sign_in_succeeded(method: SignInMethod, user: &AuthUser) {
        info!("Successfully signed in user {} via {method}", user.id);
    }

    /// Log a failed sign-in attempt; cancellations are informational only
    pub fn log_sign_in_failed(method: SignInMethod, err: &SignInError) {
        if err.is_cancellation() {
            info!("Sign-in via {method} canceled by the user");
        } else {
            warn!("Sign-in via {method} failed: {err}");
        }
    }

    /// Log the outcome of remote session termination
    pub fn log_sign_out(result: Result<(), &ExchangeError>) {
        match result {
            Ok(()) => info!("👋 Session terminated; local auth state cleared"),
            Err(err) => warn!(
                "Remote session termination failed ({err}); clearing local auth state anyway"
            ),
        }
    }
}
