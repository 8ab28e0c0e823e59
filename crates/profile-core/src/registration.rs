//! Registration service boundary
//!
//! The profile manager never speaks SIP itself. Registration goes through a
//! [`RegistrationService`] implementation (typically backed by session-core's
//! REGISTER support), which reports progress asynchronously through the
//! [`RegistrationListener`] handed to [`RegistrationService::open`].
//!
//! # Status lifecycle
//!
//! ```text
//! Unregistered ──open──▶ Registering ──done(expiry > 0)──▶ Registered
//!      ▲                     │                                │
//!      │                 failed(reason)                     close
//!      │                     ▼                                │
//!      └──done(expiry ≤ 0)── Error ◀──────────────────────────┘ (on failure)
//! ```
//!
//! A fresh `open` from `Error` moves back to `Registering`. A registration
//! that never calls back stays `Registering`; no timeout is applied.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use rvoip_profile_core::{Profile, Result};
//! use rvoip_profile_core::registration::{RegistrationListener, RegistrationPurpose, RegistrationService};
//!
//! /// Accepts every registration immediately
//! struct LoopbackRegistrar;
//!
//! #[async_trait]
//! impl RegistrationService for LoopbackRegistrar {
//!     async fn open(&self, profile: &Profile, _purpose: RegistrationPurpose, listener: RegistrationListener) -> Result<()> {
//!         listener.on_registering(profile.identity());
//!         listener.on_registration_done(profile.identity(), 3600);
//!         Ok(())
//!     }
//!
//!     async fn close(&self, _identity: &str) -> Result<()> {
//!         Ok(())
//!     }
//!
//!     async fn is_registered(&self, _identity: &str) -> Result<bool> {
//!         Ok(false)
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Weak;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::profile::Profile;

/// Live registration state of one profile identity
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RegistrationStatus {
    /// Not registered with the remote service
    #[default]
    Unregistered,
    /// A registration attempt is in flight
    Registering,
    /// Registered and reachable for incoming calls
    Registered,
    /// The last registration attempt failed
    Error(String),
}

impl RegistrationStatus {
    /// Human-readable text for status displays
    pub fn display_text(&self) -> String {
        match self {
            RegistrationStatus::Unregistered => "Not registered".to_string(),
            RegistrationStatus::Registering => "Registering...".to_string(),
            RegistrationStatus::Registered => "Ready to receive calls".to_string(),
            RegistrationStatus::Error(reason) => format!("Registration failed: {}", reason),
        }
    }

    /// Whether the remote service holds, or may soon hold, a registration
    pub fn is_active(&self) -> bool {
        matches!(self, RegistrationStatus::Registering | RegistrationStatus::Registered)
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationStatus::Unregistered => write!(f, "Unregistered"),
            RegistrationStatus::Registering => write!(f, "Registering"),
            RegistrationStatus::Registered => write!(f, "Registered"),
            RegistrationStatus::Error(reason) => write!(f, "Error({})", reason),
        }
    }
}

/// What a registration is opened for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPurpose {
    /// Register so the endpoint can receive incoming calls
    #[default]
    ReceiveCalls,
    /// Register for presence only; incoming calls are not expected
    PresenceOnly,
}

/// Progress reported by the registration service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationEvent {
    /// The attempt is still in progress
    Registering,
    /// The attempt completed; `expiry_secs <= 0` means unregistered
    Done { expiry_secs: i64 },
    /// The attempt failed
    Failed { reason: String },
}

impl RegistrationEvent {
    /// Status a profile moves to when this event is applied
    pub fn resulting_status(&self) -> RegistrationStatus {
        match self {
            RegistrationEvent::Registering => RegistrationStatus::Registering,
            RegistrationEvent::Done { expiry_secs } if *expiry_secs > 0 => RegistrationStatus::Registered,
            RegistrationEvent::Done { .. } => RegistrationStatus::Unregistered,
            RegistrationEvent::Failed { reason } => RegistrationStatus::Error(reason.clone()),
        }
    }
}

/// Receiver of registration events on the manager side
pub(crate) trait RegistrationEventSink: Send + Sync {
    /// Apply `event` to the entry bound by `binding`; stale bindings are ignored
    fn apply_registration_event(&self, binding: &ListenerBinding, event: RegistrationEvent);
}

/// Entry a listener reports against
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListenerBinding {
    pub identity: String,
    pub generation: u64,
}

/// Callback handle given to the registration service for one `open` call
///
/// Callbacks may be delivered from any thread. A listener only ever affects
/// the profile entry it was created for: once that entry is deleted or
/// replaced, its callbacks are dropped.
#[derive(Clone)]
pub struct RegistrationListener {
    binding: ListenerBinding,
    sink: Weak<dyn RegistrationEventSink>,
}

impl fmt::Debug for RegistrationListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationListener")
            .field("identity", &self.binding.identity)
            .field("generation", &self.binding.generation)
            .finish()
    }
}

impl RegistrationListener {
    pub(crate) fn new(binding: ListenerBinding, sink: Weak<dyn RegistrationEventSink>) -> Self {
        Self { binding, sink }
    }

    /// Identity this listener was created for
    pub fn identity(&self) -> &str {
        &self.binding.identity
    }

    /// Registration is in progress; may be reported any number of times
    pub fn on_registering(&self, identity: &str) {
        self.deliver(identity, RegistrationEvent::Registering);
    }

    /// Registration finished; `expiry_secs <= 0` means the endpoint is unregistered
    pub fn on_registration_done(&self, identity: &str, expiry_secs: i64) {
        self.deliver(identity, RegistrationEvent::Done { expiry_secs });
    }

    /// Registration failed
    pub fn on_registration_failed(&self, identity: &str, reason: impl Into<String>) {
        self.deliver(identity, RegistrationEvent::Failed { reason: reason.into() });
    }

    fn deliver(&self, identity: &str, event: RegistrationEvent) {
        if identity != self.binding.identity {
            warn!(
                "Listener for '{}' received callback for '{}', ignoring",
                self.binding.identity, identity
            );
            return;
        }
        match self.sink.upgrade() {
            Some(sink) => sink.apply_registration_event(&self.binding, event),
            None => debug!("Profile manager gone, dropping {:?} for '{}'", event, identity),
        }
    }
}

/// Remote registration service
///
/// Implementations need not serialize calls for the same identity; the
/// profile manager never issues overlapping operations for one identity.
#[async_trait]
pub trait RegistrationService: Send + Sync {
    /// Start registering `profile`; progress is reported through `listener`
    ///
    /// Returning `Ok` only means the attempt was started.
    async fn open(
        &self,
        profile: &Profile,
        purpose: RegistrationPurpose,
        listener: RegistrationListener,
    ) -> Result<()>;

    /// Tear down any registration held for `identity`
    async fn close(&self, identity: &str) -> Result<()>;

    /// Best-effort query of the current registration state
    async fn is_registered(&self, identity: &str) -> Result<bool>;
}
