//! Dependency injection for the sign-in services
//!
//! The identity provider UI and the backend collaborators are supplied by the
//! host application; this module wires them with settings into one container
//! sharing a single [`AuthState`].

use crate::authentication::traits::{IdentityExchange, ProfileStore};
use crate::handshake::HandshakeCoordinator;
use crate::provider::IdentityProvider;
use crate::session::{AuthState, SessionOrchestrator};
use crate::settings::BelaySettings;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("no identity provider configured")]
    MissingProvider,
    #[error("no identity exchange configured")]
    MissingIdentityExchange,
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Service configuration builder for dependency injection
#[derive(Clone, Default)]
pub struct ServiceConfigBuilder {
    provider: Option<Arc<dyn IdentityProvider + Send + Sync>>,
    exchange: Option<Arc<dyn IdentityExchange>>,
    profile_store: Option<Arc<dyn ProfileStore>>,
    auth_state: Option<AuthState>,
}

impl ServiceConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity provider UI presenting the authorization flow
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn IdentityProvider + Send + Sync>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Backend identity service
    #[must_use]
    pub fn with_identity_exchange(mut self, exchange: Arc<dyn IdentityExchange>) -> Self {
        self.exchange = Some(exchange);
        self
    }

    /// Profile repository used by account creation
    #[must_use]
    pub fn with_profile_store(mut self, store: Arc<dyn ProfileStore>) -> Self {
        self.profile_store = Some(store);
        self
    }

    /// Share an existing auth state instead of creating a fresh one
    #[must_use]
    pub fn with_auth_state(mut self, state: AuthState) -> Self {
        self.auth_state = Some(state);
        self
    }

    /// Build the container
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No identity provider or identity exchange was supplied
    /// - The settings fail validation
    pub fn build(self, settings: BelaySettings) -> Result<ServiceContainer, ConfigurationError> {
        log::info!("🔧 Configuring sign-in services...");

        settings
            .validate()
            .map_err(|e| ConfigurationError::InvalidSettings(format!("{e:#}")))?;
        let scopes = settings
            .scopes()
            .map_err(|e| ConfigurationError::InvalidSettings(format!("{e:#}")))?;

        let provider = self.provider.ok_or(ConfigurationError::MissingProvider)?;
        let exchange = self
            .exchange
            .ok_or(ConfigurationError::MissingIdentityExchange)?;

        let coordinator = HandshakeCoordinator::new(provider)
            .with_nonce_generator(settings.nonce_generator())
            .with_scopes(scopes)
            .with_provider_name(settings.handshake.provider_name.trim());
        log::info!(
            "✅ Handshake coordinator configured for {} ({}-character nonces)",
            coordinator.provider_name(),
            settings.handshake.nonce_length
        );

        let state = self.auth_state.unwrap_or_default();
        let mut orchestrator = SessionOrchestrator::new(coordinator, exchange, state);
        if let Some(store) = self.profile_store {
            orchestrator = orchestrator.with_profile_store(store);
            log::info!("✅ Profile store configured");
        } else {
            log::info!("⚠️  No profile store configured; account creation will skip profiles");
        }

        log::info!("🔧 Sign-in service configuration completed");
        Ok(ServiceContainer {
            orchestrator,
            settings,
        })
    }
}

/// Application service container for centralized dependency management
#[derive(Clone)]
pub struct ServiceContainer {
    orchestrator: SessionOrchestrator,
    settings: BelaySettings,
}

impl ServiceContainer {
    #[must_use]
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    #[must_use]
    pub const fn orchestrator(&self) -> &SessionOrchestrator {
        &self.orchestrator
    }

    #[must_use]
    pub fn coordinator(&self) -> &HandshakeCoordinator {
        self.orchestrator.coordinator()
    }

    /// Shared auth state; clone it into components that read the current user
    #[must_use]
    pub fn auth_state(&self) -> &AuthState {
        self.orchestrator.state()
    }

    #[must_use]
    pub const fn settings(&self) -> &BelaySettings {
        &self.settings
    }
}
