use crate::provider::AuthorizationScope;
use crate::utils::crypto::{NonceGenerator, DEFAULT_NONCE_LENGTH, MIN_NONCE_LENGTH};
use anyhow::{bail, ensure, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const SETTINGS_FILE: &str = "Settings.toml";
pub const CONFIG_DIR_ENV: &str = "BELAY_CONFIG_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BelaySettings {
    pub handshake: HandshakeSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HandshakeSettings {
    /// Provider name used in logs
    pub provider_name: String,
    /// Length of the per-attempt nonce; at least 32
    pub nonce_length: usize,
    /// Profile scopes requested from the provider (`full_name`, `email`)
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for HandshakeSettings {
    fn default() -> Self {
        Self {
            provider_name: "apple".to_string(),
            nonce_length: DEFAULT_NONCE_LENGTH,
            scopes: AuthorizationScope::STANDARD
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl BelaySettings {
    /// Load settings from configuration files and environment variables
    ///
    /// Priority, highest first:
    /// 1. Environment variables
    /// 2. Settings.toml in `BELAY_CONFIG_DIR` (if set and present)
    /// 3. Settings.toml in the current directory (if present)
    /// 4. Defaults
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A settings file exists but cannot be read or parsed
    /// - The resulting settings fail validation
    pub fn load() -> Result<Self> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);
        settings.validate()?;

        Ok(settings)
    }

    /// Load and validate settings from one TOML file, without environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let settings = Self::read_file(path)?;
        settings.validate()?;
        Ok(settings)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        basic_toml::from_str(&content)
            .with_context(|| format!("failed to parse settings in {}", path.display()))
    }

    fn load_base_settings() -> Result<Self> {
        let mut settings = Self::default();

        let local_path = Path::new(SETTINGS_FILE);
        if local_path.exists() {
            settings = Self::read_file(local_path)?;
            info!("✓ Loaded base settings from {}", local_path.display());
        }

        if let Ok(config_dir) = std::env::var(CONFIG_DIR_ENV) {
            let config_path = Path::new(&config_dir).join(SETTINGS_FILE);
            if config_path.exists() {
                settings = Self::read_file(&config_path)?;
                info!("✓ Overriding settings from {}", config_path.display());
            } else {
                info!(
                    "ℹ {CONFIG_DIR_ENV} set but no {SETTINGS_FILE} found at: {}",
                    config_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_handshake_env_overrides(&mut settings.handshake);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_handshake_env_overrides(handshake: &mut HandshakeSettings) {
        if let Ok(provider) = std::env::var("BELAY_PROVIDER") {
            handshake.provider_name = provider;
        }
        if let Ok(length) = std::env::var("BELAY_NONCE_LENGTH") {
            match length.trim().parse::<usize>() {
                Ok(length) => handshake.nonce_length = length,
                Err(_) => debug!("Ignoring unparsable BELAY_NONCE_LENGTH={length}"),
            }
        }
        if let Ok(scopes) = std::env::var("BELAY_SCOPES") {
            handshake.scopes = scopes
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    fn apply_logging_env_overrides(logging: &mut LoggingSettings) {
        if let Ok(level) = std::env::var("RUST_LOG") {
            logging.level = level;
        }
    }

    /// Load environment variables from a .env file in the current directory
    fn load_env_file() {
        if let Ok(contents) = fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Check invariants the handshake relies on
    ///
    /// # Errors
    ///
    /// Returns an error if the provider name is empty, the nonce is shorter
    /// than 32 characters, or a scope is unknown
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.handshake.provider_name.trim().is_empty(),
            "handshake.provider_name must not be empty"
        );
        ensure!(
            self.handshake.nonce_length >= MIN_NONCE_LENGTH,
            "handshake.nonce_length must be at least {MIN_NONCE_LENGTH}, got {}",
            self.handshake.nonce_length
        );
        self.scopes()?;
        Ok(())
    }

    /// Requested scopes, parsed
    ///
    /// # Errors
    ///
    /// Returns an error naming the first unknown scope
    pub fn scopes(&self) -> Result<Vec<AuthorizationScope>> {
        let mut scopes = Vec::with_capacity(self.handshake.scopes.len());
        for name in &self.handshake.scopes {
            let Some(scope) = AuthorizationScope::parse(name) else {
                bail!("unknown handshake scope '{name}' (expected full_name or email)");
            };
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }
        Ok(scopes)
    }

    #[must_use]
    pub fn nonce_generator(&self) -> NonceGenerator {
        NonceGenerator::with_length(self.handshake.nonce_length)
    }

    /// Initialize `env_logger` at the configured level. `RUST_LOG` wins when set.
    ///
    /// Does nothing if a logger is already installed.
    pub fn init_logging(&self) {
        let env = env_logger::Env::default().default_filter_or(self.logging.level.as_str());
        if env_logger::Builder::from_env(env).try_init().is_err() {
            debug!("Logger already initialized; keeping the existing one");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clean_env_vars() {
        std::env::remove_var("BELAY_PROVIDER");
        std::env::remove_var("BELAY_NONCE_LENGTH");
        std::env::remove_var("BELAY_SCOPES");
        std::env::remove_var(CONFIG_DIR_ENV);
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = BelaySettings::default();
        assert_eq!(settings.handshake.provider_name, "apple");
        assert_eq!(settings.handshake.nonce_length, 32);
        assert_eq!(settings.scopes().unwrap(), AuthorizationScope::STANDARD.to_vec());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_short_nonce_is_rejected() {
        let mut settings = BelaySettings::default();
        settings.handshake.nonce_length = 16;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn test_unknown_scope_is_rejected() {
        let mut settings = BelaySettings::default();
        settings.handshake.scopes = vec!["email".to_string(), "phone".to_string()];
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("phone"));
    }

    #[test]
    fn test_duplicate_scopes_collapse() {
        let mut settings = BelaySettings::default();
        settings.handshake.scopes = vec!["name".to_string(), "full_name".to_string()];
        assert_eq!(settings.scopes().unwrap(), vec![AuthorizationScope::FullName]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: BelaySettings = basic_toml::from_str("[handshake]\nnonce_length = 48\n").unwrap();
        assert_eq!(settings.handshake.nonce_length, 48);
        assert_eq!(settings.handshake.provider_name, "apple");
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.nonce_generator().length(), 48);
    }

    #[test]
    #[serial]
    fn test_handshake_env_overrides() {
        clean_env_vars();
        std::env::set_var("BELAY_PROVIDER", "apple-web");
        std::env::set_var("BELAY_NONCE_LENGTH", "64");
        std::env::set_var("BELAY_SCOPES", "email, ");

        let mut settings = BelaySettings::default();
        BelaySettings::apply_env_overrides(&mut settings);

        assert_eq!(settings.handshake.provider_name, "apple-web");
        assert_eq!(settings.handshake.nonce_length, 64);
        assert_eq!(settings.scopes().unwrap(), vec![AuthorizationScope::Email]);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_unparsable_nonce_length_is_ignored() {
        clean_env_vars();
        std::env::set_var("BELAY_NONCE_LENGTH", "lots");

        let mut settings = BelaySettings::default();
        BelaySettings::apply_env_overrides(&mut settings);
        assert_eq!(settings.handshake.nonce_length, DEFAULT_NONCE_LENGTH);

        clean_env_vars();
    }
}
