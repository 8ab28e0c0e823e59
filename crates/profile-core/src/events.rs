//! Status notifications for observers
//!
//! Status changes can originate on any thread: registration callbacks arrive
//! wherever the registration service delivers them. The manager updates its
//! own index immediately and then queues a [`ProfileEvent`]. A single
//! dispatcher task drains that queue and is the only place observers are
//! called from, so an observer sees events one at a time and in order.
//!
//! Observers look up their own display element by identity and should treat
//! an unknown identity as a no-op; the profile may already be gone.
//!
//! ```rust
//! use async_trait::async_trait;
//! use rvoip_profile_core::events::{StatusObserver, StatusUpdate};
//!
//! struct PrintingObserver;
//!
//! #[async_trait]
//! impl StatusObserver for PrintingObserver {
//!     async fn on_status_changed(&self, update: StatusUpdate) {
//!         println!("{}: {}", update.identity, update.text);
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::registration::RegistrationStatus;

/// A status change for one profile identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Profile identity
    pub identity: String,
    /// New status
    pub status: RegistrationStatus,
    /// Human-readable status text
    pub text: String,
    /// When the change was applied
    pub timestamp: DateTime<Utc>,
}

impl StatusUpdate {
    pub fn new(identity: impl Into<String>, status: RegistrationStatus) -> Self {
        let text = status.display_text();
        Self {
            identity: identity.into(),
            status,
            text,
            timestamp: Utc::now(),
        }
    }
}

/// Events published by the profile manager
#[derive(Debug, Clone)]
pub enum ProfileEvent {
    /// The profile list was replaced by a store scan
    ProfilesLoaded {
        /// Identities in display order
        identities: Vec<String>,
    },
    /// A profile was written and added to the list
    ProfileSaved { identity: String },
    /// A profile was removed from the list
    ProfileDeleted { identity: String },
    /// A profile's registration status changed
    StatusChanged(StatusUpdate),
}

impl ProfileEvent {
    /// Identity the event concerns, if it concerns a single profile
    pub fn identity(&self) -> Option<&str> {
        match self {
            ProfileEvent::ProfilesLoaded { .. } => None,
            ProfileEvent::ProfileSaved { identity } | ProfileEvent::ProfileDeleted { identity } => {
                Some(identity)
            }
            ProfileEvent::StatusChanged(update) => Some(&update.identity),
        }
    }
}

/// Consumer of profile status changes, typically a UI list
#[async_trait]
pub trait StatusObserver: Send + Sync {
    /// A profile's registration status changed
    async fn on_status_changed(&self, update: StatusUpdate);

    /// The set of profiles changed (load, save or delete)
    async fn on_profiles_changed(&self, _identities: Vec<String>) {
        // Default implementation - override to refresh list displays
    }

    /// Dispatch a manager event to the specific callbacks
    async fn on_profile_event(&self, event: ProfileEvent) {
        match event {
            ProfileEvent::StatusChanged(update) => self.on_status_changed(update).await,
            ProfileEvent::ProfilesLoaded { identities } => self.on_profiles_changed(identities).await,
            ProfileEvent::ProfileSaved { identity } | ProfileEvent::ProfileDeleted { identity } => {
                self.on_profiles_changed(vec![identity]).await
            }
        }
    }
}

pub(crate) type ObserverSlot = Arc<RwLock<Option<Arc<dyn StatusObserver>>>>;

/// Queue feeding the dispatcher task
#[derive(Clone)]
pub(crate) struct EventQueue {
    tx: mpsc::UnboundedSender<ProfileEvent>,
}

impl EventQueue {
    /// Queue an event; never blocks and never fails the caller
    pub fn publish(&self, event: ProfileEvent) {
        if self.tx.send(event).is_err() {
            trace!("Event dispatcher stopped, dropping event");
        }
    }

    pub fn status_changed(&self, identity: &str, status: RegistrationStatus) {
        self.publish(ProfileEvent::StatusChanged(StatusUpdate::new(identity, status)));
    }
}

/// Spawn the dispatcher task
///
/// The task ends once every [`EventQueue`] clone has been dropped.
pub(crate) fn spawn_dispatcher(
    observer: ObserverSlot,
    broadcast_tx: broadcast::Sender<ProfileEvent>,
) -> (EventQueue, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ProfileEvent>();

    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            // No subscribers is fine
            let _ = broadcast_tx.send(event.clone());

            let current = observer.read().await.clone();
            if let Some(observer) = current {
                observer.on_profile_event(event).await;
            }
        }
        debug!("Profile event dispatcher stopped");
    });

    (EventQueue { tx }, handle)
}
