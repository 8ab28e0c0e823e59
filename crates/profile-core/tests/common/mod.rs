//! Shared helpers for profile-core integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::mpsc;

use rvoip_profile_core::{
    Profile, ProfileError, ProfileManager, ProfileManagerConfig, RegistrationListener,
    RegistrationPurpose, RegistrationService, Result, StatusObserver, StatusUpdate,
};

/// A call made against the mock registration service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    Open(String),
    Close(String),
    Probe(String),
}

/// Registration service that records calls and lets tests drive callbacks
#[derive(Default)]
pub struct MockRegistrationService {
    calls: Mutex<Vec<ServiceCall>>,
    listeners: Mutex<HashMap<String, RegistrationListener>>,
    registered: Mutex<HashSet<String>>,
    failing_opens: Mutex<HashSet<String>>,
    failing_closes: Mutex<HashSet<String>>,
    failing_probes: Mutex<HashSet<String>>,
    /// When set, every open immediately reports done with this expiry
    auto_complete: Mutex<Option<i64>>,
}

impl MockRegistrationService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().clone()
    }

    pub fn opens(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ServiceCall::Open(identity) => Some(identity),
                _ => None,
            })
            .collect()
    }

    pub fn closes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ServiceCall::Close(identity) => Some(identity),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Listener handed over by the most recent open for `identity`
    pub fn listener(&self, identity: &str) -> RegistrationListener {
        self.listeners
            .lock()
            .get(identity)
            .cloned()
            .unwrap_or_else(|| panic!("no open recorded for '{}'", identity))
    }

    pub fn mark_registered(&self, identity: &str) {
        self.registered.lock().insert(identity.to_string());
    }

    pub fn fail_open(&self, identity: &str) {
        self.failing_opens.lock().insert(identity.to_string());
    }

    pub fn fail_close(&self, identity: &str) {
        self.failing_closes.lock().insert(identity.to_string());
    }

    pub fn fail_probe(&self, identity: &str) {
        self.failing_probes.lock().insert(identity.to_string());
    }

    pub fn complete_opens_with(&self, expiry_secs: i64) {
        *self.auto_complete.lock() = Some(expiry_secs);
    }
}

#[async_trait]
impl RegistrationService for MockRegistrationService {
    async fn open(
        &self,
        profile: &Profile,
        _purpose: RegistrationPurpose,
        listener: RegistrationListener,
    ) -> Result<()> {
        let identity = profile.identity().to_string();
        self.calls.lock().push(ServiceCall::Open(identity.clone()));
        if self.failing_opens.lock().contains(&identity) {
            return Err(ProfileError::protocol(&identity, "503 Service Unavailable"));
        }
        self.listeners.lock().insert(identity.clone(), listener.clone());

        let expiry = *self.auto_complete.lock();
        if let Some(expiry_secs) = expiry {
            listener.on_registering(&identity);
            listener.on_registration_done(&identity, expiry_secs);
        }
        Ok(())
    }

    async fn close(&self, identity: &str) -> Result<()> {
        self.calls.lock().push(ServiceCall::Close(identity.to_string()));
        if self.failing_closes.lock().contains(identity) {
            return Err(ProfileError::protocol(identity, "transaction timed out"));
        }
        self.registered.lock().remove(identity);
        Ok(())
    }

    async fn is_registered(&self, identity: &str) -> Result<bool> {
        self.calls.lock().push(ServiceCall::Probe(identity.to_string()));
        if self.failing_probes.lock().contains(identity) {
            return Err(ProfileError::protocol(identity, "service not bound"));
        }
        Ok(self.registered.lock().contains(identity))
    }
}

/// Observer forwarding every status update into a channel
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<StatusUpdate>,
}

impl ChannelObserver {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<StatusUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl StatusObserver for ChannelObserver {
    async fn on_status_changed(&self, update: StatusUpdate) {
        let _ = self.tx.send(update);
    }
}

/// Wait for the next update about `identity`, skipping others
pub async fn next_update_for(
    rx: &mut mpsc::UnboundedReceiver<StatusUpdate>,
    identity: &str,
) -> StatusUpdate {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let update = rx.recv().await.expect("observer channel closed");
            if update.identity == identity {
                return update;
            }
        }
    })
    .await
    .expect("timed out waiting for status update")
}

/// A fully filled-in profile
pub fn profile(name: &str) -> Profile {
    Profile::new(name, "sip.example.com", name, "secret").with_display_name(name.to_uppercase())
}

/// Manager over a fresh temporary store
pub fn manager_with(
    service: &Arc<MockRegistrationService>,
    auto_register: bool,
) -> (ProfileManager, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager_at(&temp_dir, service, auto_register);
    (manager, temp_dir)
}

/// Manager over an existing store directory
pub fn manager_at(
    temp_dir: &TempDir,
    service: &Arc<MockRegistrationService>,
    auto_register: bool,
) -> ProfileManager {
    let config = ProfileManagerConfig::new(temp_dir.path().join("profiles"))
        .with_auto_register(auto_register);
    let service: Arc<dyn RegistrationService> = service.clone();
    ProfileManager::new(config, service).expect("failed to create profile manager")
}
