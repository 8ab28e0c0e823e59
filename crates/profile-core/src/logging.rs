//! Logging setup for applications embedding the profile manager
//!
//! The crate only emits `tracing` events; installing a subscriber is up to
//! the application. [`setup_logging`] covers the common case for binaries
//! and demos. Passwords are redacted from `Profile`'s `Debug` output, so
//! profiles can be logged with `{:?}`.

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use crate::config::ProfileManagerConfig;
use crate::error::{ProfileError, Result};

/// Subscriber settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level for events not matched by a `RUST_LOG` directive
    pub level: Level,
    /// Emit JSON lines instead of text
    pub json: bool,
    /// Log manager operation spans when they close
    pub spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl LoggingConfig {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            json: false,
            spans: false,
        }
    }

    /// Settings matching the `log_level` of a manager configuration
    pub fn for_manager(config: &ProfileManagerConfig) -> Result<Self> {
        Ok(Self::new(parse_log_level(&config.log_level)?))
    }

    pub fn json(mut self, enabled: bool) -> Self {
        self.json = enabled;
        self
    }

    pub fn spans(mut self, enabled: bool) -> Self {
        self.spans = enabled;
        self
    }
}

/// Install the global subscriber
///
/// Fails if one is already installed.
pub fn setup_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.level).into())
        .from_env_lossy();

    let span_events = if config.spans { FmtSpan::CLOSE } else { FmtSpan::NONE };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(span_events)
        .with_target(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| ProfileError::config(format!("failed to install logger: {}", e)))
}

/// Parse a level name such as `"debug"` (case-insensitive)
pub fn parse_log_level(level: &str) -> Result<Level> {
    level
        .trim()
        .parse::<Level>()
        .map_err(|_| ProfileError::config(format!("unknown log level '{}'", level)))
}
