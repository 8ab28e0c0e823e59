//! Configuration for the profile manager
//!
//! Defaults can be overridden from a config file and from environment
//! variables prefixed `RVOIP_PROFILES_`:
//!
//! | Variable | Field |
//! |---|---|
//! | `RVOIP_PROFILES_DIR` | `profiles_dir` |
//! | `RVOIP_PROFILES_AUTO_REGISTER` | `auto_register` |
//! | `RVOIP_PROFILES_REGISTRATION_PURPOSE` | `registration_purpose` |
//! | `RVOIP_PROFILES_EVENT_CHANNEL_CAPACITY` | `event_channel_capacity` |
//! | `RVOIP_PROFILES_LOG_LEVEL` | `log_level` |

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ProfileError, Result};
use crate::logging::parse_log_level;
use crate::registration::RegistrationPurpose;

const ENV_PREFIX: &str = "RVOIP_PROFILES";

/// Profile manager configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProfileManagerConfig {
    /// Root directory of the profile store
    #[serde(alias = "dir")]
    pub profiles_dir: PathBuf,
    /// Initial state of the global auto-register policy
    pub auto_register: bool,
    /// Purpose passed to the registration service on every open
    pub registration_purpose: RegistrationPurpose,
    /// Capacity of the broadcast channel returned by `subscribe`
    pub event_channel_capacity: usize,
    /// Default log level, see [`LoggingConfig::for_manager`](crate::logging::LoggingConfig::for_manager)
    pub log_level: String,
}

impl Default for ProfileManagerConfig {
    fn default() -> Self {
        Self {
            profiles_dir: PathBuf::from("sip_profiles"),
            auto_register: true,
            registration_purpose: RegistrationPurpose::ReceiveCalls,
            event_channel_capacity: 64,
            log_level: "info".to_string(),
        }
    }
}

impl ProfileManagerConfig {
    /// Configuration rooted at `profiles_dir` with default settings
    pub fn new(profiles_dir: impl Into<PathBuf>) -> Self {
        Self {
            profiles_dir: profiles_dir.into(),
            ..Default::default()
        }
    }

    /// Set the initial auto-register policy
    pub fn with_auto_register(mut self, enabled: bool) -> Self {
        self.auto_register = enabled;
        self
    }

    /// Set the registration purpose
    pub fn with_registration_purpose(mut self, purpose: RegistrationPurpose) -> Self {
        self.registration_purpose = purpose;
        self
    }

    /// Set the event channel capacity
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    /// Load configuration from environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Load configuration from an optional file, then environment variables
    ///
    /// The file format is picked from its extension (TOML, JSON, YAML...).
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::from_sources(file, config::Environment::with_prefix(ENV_PREFIX))
    }

    fn from_sources(file: Option<&Path>, environment: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(environment.try_parsing(true))
            .build()
            .map_err(|e| ProfileError::config(e.to_string()))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| ProfileError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for unusable values
    pub fn validate(&self) -> Result<()> {
        if self.profiles_dir.as_os_str().is_empty() {
            return Err(ProfileError::config("profiles_dir must not be empty"));
        }
        if self.event_channel_capacity == 0 {
            return Err(ProfileError::config("event_channel_capacity must be greater than zero"));
        }
        parse_log_level(&self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment(vars: &[(&str, &str)]) -> config::Environment {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix(ENV_PREFIX).source(Some(source))
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = ProfileManagerConfig::from_sources(None, environment(&[])).unwrap();
        assert_eq!(config, ProfileManagerConfig::default());
    }

    #[test]
    fn test_environment_overrides() {
        let config = ProfileManagerConfig::from_sources(
            None,
            environment(&[
                ("RVOIP_PROFILES_DIR", "/var/lib/rvoip/profiles"),
                ("RVOIP_PROFILES_AUTO_REGISTER", "false"),
                ("RVOIP_PROFILES_REGISTRATION_PURPOSE", "presence_only"),
            ]),
        )
        .unwrap();

        assert_eq!(config.profiles_dir, PathBuf::from("/var/lib/rvoip/profiles"));
        assert!(!config.auto_register);
        assert_eq!(config.registration_purpose, RegistrationPurpose::PresenceOnly);
        assert_eq!(config.event_channel_capacity, 64);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let result = ProfileManagerConfig::from_sources(
            None,
            environment(&[("RVOIP_PROFILES_EVENT_CHANNEL_CAPACITY", "0")]),
        );
        assert!(matches!(result, Err(ProfileError::Configuration { .. })));
    }

    #[test]
    fn test_log_level_is_checked() {
        let config = ProfileManagerConfig::from_sources(
            None,
            environment(&[("RVOIP_PROFILES_LOG_LEVEL", "debug")]),
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");

        let result = ProfileManagerConfig::from_sources(
            None,
            environment(&[("RVOIP_PROFILES_LOG_LEVEL", "chatty")]),
        );
        assert!(matches!(result, Err(ProfileError::Configuration { .. })));
    }

    #[test]
    fn test_builder_methods() {
        let config = ProfileManagerConfig::new("/tmp/profiles")
            .with_auto_register(false)
            .with_event_channel_capacity(8);
        assert!(!config.auto_register);
        assert_eq!(config.event_channel_capacity, 8);
        assert!(config.validate().is_ok());
    }
}
