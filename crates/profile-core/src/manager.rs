//! Profile lifecycle manager
//!
//! [`ProfileManager`] owns the in-memory profile index, keeps it in step with
//! the on-disk [`ProfileStore`], drives the [`RegistrationService`] and
//! publishes status changes to observers.
//!
//! # Concurrency
//!
//! - The index (identity → profile, status) sits behind a short-lived lock
//!   and is ordered by name, so the sorted list and the identity map cannot
//!   drift apart.
//! - Mutating operations take a per-identity async lock, so a save, delete,
//!   register or unregister never overlaps another one for the same
//!   identity. Operations on different identities run concurrently.
//! - `load_all` replaces the whole index and excludes every other mutating
//!   operation while it runs.
//! - Registration callbacks update the index directly from whatever thread
//!   delivers them. Each entry carries a generation number and a callback is
//!   applied only to the entry generation it was issued for, so a late
//!   callback can never resurrect a deleted profile or touch its successor.
//! - Observers are only ever called from the event dispatcher task.
//!
//! # Example
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use rvoip_profile_core::{Profile, ProfileManager, ProfileManagerConfig, RegistrationService};
//! # async fn example(service: Arc<dyn RegistrationService>) -> rvoip_profile_core::Result<()> {
//! let manager = ProfileManager::new(ProfileManagerConfig::new("/var/lib/rvoip/profiles"), service)?;
//!
//! // Load stored profiles in the background
//! let startup = manager.start();
//! let report = startup.await.expect("startup task panicked")?;
//! println!("{} profiles loaded", report.loaded);
//!
//! manager.save(Profile::new("alice", "sip.example.com", "alice", "secret")).await?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ProfileManagerConfig;
use crate::edit::{EditOutcome, EditResult, ProfileEditor};
use crate::error::{ProfileError, Result};
use crate::events::{spawn_dispatcher, EventQueue, ObserverSlot, ProfileEvent, StatusObserver};
use crate::loader::sort_listing;
use crate::profile::Profile;
use crate::registration::{
    ListenerBinding, RegistrationEvent, RegistrationEventSink, RegistrationListener,
    RegistrationService, RegistrationStatus,
};
use crate::store::{check_identity, ProfileStore};

/// Outcome of a bulk load
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Number of profiles now in the index
    pub loaded: usize,
    /// Store entries that were discarded
    pub skipped: Vec<ProfileError>,
    /// Status probes that failed; those profiles start out unregistered
    pub probe_failures: Vec<ProfileError>,
}

impl LoadReport {
    /// Whether every entry loaded and every probe answered
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.probe_failures.is_empty()
    }
}

/// Outcome of an auto-register policy change
#[derive(Debug, Default)]
pub struct PolicyReport {
    /// Identities an open or close was attempted for
    pub attempted: Vec<String>,
    /// Attempts that failed
    pub failures: Vec<ProfileError>,
}

/// A profile and its registration status at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSnapshot {
    pub profile: Profile,
    pub status: RegistrationStatus,
}

type LockMap = DashMap<String, Arc<tokio::sync::Mutex<()>>>;

/// Per-identity locks held by one operation
///
/// Releasing them drops map entries nobody else is holding or waiting on,
/// so unknown and deleted identities do not accumulate locks.
struct IdentityGuards {
    locks: Arc<LockMap>,
    held: Vec<(String, OwnedMutexGuard<()>)>,
}

impl Drop for IdentityGuards {
    fn drop(&mut self) {
        for (identity, guard) in self.held.drain(..) {
            drop(guard);
            self.locks
                .remove_if(&identity, |_, lock| Arc::strong_count(lock) == 1);
        }
    }
}

#[derive(Debug, Clone)]
struct ProfileEntry {
    profile: Profile,
    status: RegistrationStatus,
    generation: u64,
    updated_at: DateTime<Utc>,
}

struct ManagerInner {
    config: ProfileManagerConfig,
    store: ProfileStore,
    service: Arc<dyn RegistrationService>,

    /// Profiles ordered by identity
    index: RwLock<BTreeMap<String, ProfileEntry>>,
    /// Per-identity operation locks
    identity_locks: Arc<LockMap>,
    /// Shared by single-profile operations, exclusive for `load_all`
    reload_gate: tokio::sync::RwLock<()>,
    next_generation: AtomicU64,
    auto_register: AtomicBool,

    observer: ObserverSlot,
    broadcast_tx: broadcast::Sender<ProfileEvent>,
    events: EventQueue,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl ManagerInner {
    fn next_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed)
    }

    /// Set the status of `identity`, optionally only for one entry generation
    ///
    /// Returns false when the entry is gone or was replaced.
    fn set_status(&self, identity: &str, generation: Option<u64>, status: RegistrationStatus) -> bool {
        let mut index = self.index.write();
        let Some(entry) = index.get_mut(identity) else {
            return false;
        };
        if generation.is_some_and(|g| g != entry.generation) {
            return false;
        }
        if entry.status != status {
            entry.status = status.clone();
            entry.updated_at = Utc::now();
            debug!("Profile '{}' is now {}", identity, status);
            // Queued under the index lock so observers see changes in index order
            self.events.status_changed(identity, status);
        }
        true
    }

    async fn with_store<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&ProfileStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| ProfileError::internal(format!("storage task failed: {}", e)))?
    }

    async fn lock_identities(&self, identities: &[&str]) -> IdentityGuards {
        let mut sorted: Vec<&str> = identities.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut guards = IdentityGuards {
            locks: self.identity_locks.clone(),
            held: Vec::with_capacity(sorted.len()),
        };
        for identity in sorted {
            let lock = self
                .identity_locks
                .entry(identity.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone();
            guards.held.push((identity.to_string(), lock.lock_owned().await));
        }
        guards
    }
}

impl RegistrationEventSink for ManagerInner {
    fn apply_registration_event(&self, binding: &ListenerBinding, event: RegistrationEvent) {
        let status = event.resulting_status();
        if !self.set_status(&binding.identity, Some(binding.generation), status) {
            debug!(
                "Dropping {:?} for '{}': profile was removed or replaced",
                event, binding.identity
            );
        }
    }
}

/// Manages stored SIP profiles and their registrations
///
/// Cloning is cheap; clones share the same state. Must be created inside a
/// Tokio runtime.
#[derive(Clone)]
pub struct ProfileManager {
    inner: Arc<ManagerInner>,
}

impl std::fmt::Debug for ProfileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileManager")
            .field("profiles_dir", &self.inner.config.profiles_dir)
            .field("profiles", &self.inner.index.read().len())
            .field("auto_register", &self.auto_register_policy())
            .finish()
    }
}

impl ProfileManager {
    /// Create a manager for the store described by `config`
    ///
    /// The index starts out empty; call [`start`](Self::start) or
    /// [`load_all`](Self::load_all) to populate it.
    pub fn new(config: ProfileManagerConfig, service: Arc<dyn RegistrationService>) -> Result<Self> {
        config.validate()?;

        let (broadcast_tx, _) = broadcast::channel(config.event_channel_capacity);
        let observer: ObserverSlot = Arc::new(tokio::sync::RwLock::new(None));
        let (events, dispatcher) = spawn_dispatcher(observer.clone(), broadcast_tx.clone());

        info!("Profile manager using store at {}", config.profiles_dir.display());

        let inner = ManagerInner {
            store: ProfileStore::new(config.profiles_dir.clone()),
            auto_register: AtomicBool::new(config.auto_register),
            config,
            service,
            index: RwLock::new(BTreeMap::new()),
            identity_locks: Arc::new(DashMap::new()),
            reload_gate: tokio::sync::RwLock::new(()),
            next_generation: AtomicU64::new(1),
            observer,
            broadcast_tx,
            events,
            dispatcher: Mutex::new(Some(dispatcher)),
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Install the status observer, replacing any previous one
    pub async fn set_observer(&self, observer: Arc<dyn StatusObserver>) {
        *self.inner.observer.write().await = Some(observer);
    }

    /// Remove the status observer
    pub async fn clear_observer(&self) {
        *self.inner.observer.write().await = None;
    }

    /// Subscribe to manager events
    pub fn subscribe(&self) -> broadcast::Receiver<ProfileEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// The profile store backing this manager
    pub fn store(&self) -> &ProfileStore {
        &self.inner.store
    }

    /// Load profiles on a background task
    ///
    /// Runs [`load_all`](Self::load_all) and then, when the auto-register
    /// policy is on, opens every eligible profile. The caller is never
    /// blocked; await the handle to collect the load report.
    pub fn start(&self) -> JoinHandle<Result<LoadReport>> {
        let manager = self.clone();
        tokio::spawn(async move {
            let report = manager.load_all().await?;
            if manager.auto_register_policy() {
                let policy = manager.apply_policy(true).await;
                if !policy.failures.is_empty() {
                    warn!("{} auto-registrations failed at startup", policy.failures.len());
                }
            }
            Ok::<_, ProfileError>(report)
        })
    }

    /// Replace the index with the contents of the store
    ///
    /// Corrupt or mismatched records are skipped. Each profile's status is
    /// probed from the registration service; a failed probe leaves that
    /// profile `Unregistered` without dropping it. Only a failure to read
    /// the store root fails the whole call.
    pub async fn load_all(&self) -> Result<LoadReport> {
        let inner = &self.inner;
        let _gate = inner.reload_gate.write().await;

        let listing = inner.with_store(|store| store.list_all()).await?;
        let loaded = sort_listing(listing);

        let mut report = LoadReport {
            loaded: loaded.profiles.len(),
            skipped: loaded.skipped,
            probe_failures: Vec::new(),
        };

        let mut index = BTreeMap::new();
        for profile in loaded.profiles {
            let identity = profile.identity().to_string();
            let status = match inner.service.is_registered(&identity).await {
                Ok(true) => RegistrationStatus::Registered,
                Ok(false) => RegistrationStatus::Unregistered,
                Err(e) => {
                    warn!("Could not query registration of '{}': {}", identity, e);
                    report.probe_failures.push(e);
                    RegistrationStatus::Unregistered
                }
            };
            index.insert(
                identity,
                ProfileEntry {
                    profile,
                    status,
                    generation: inner.next_generation(),
                    updated_at: Utc::now(),
                },
            );
        }

        {
            let mut current = inner.index.write();
            *current = index;
            inner.events.publish(ProfileEvent::ProfilesLoaded {
                identities: current.keys().cloned().collect(),
            });
            for (identity, entry) in current.iter() {
                inner.events.status_changed(identity, entry.status.clone());
            }
        }

        info!(
            "Loaded {} profiles ({} skipped, {} probe failures)",
            report.loaded,
            report.skipped.len(),
            report.probe_failures.len()
        );
        Ok(report)
    }

    /// Save a new profile
    ///
    /// A stored profile with the same identity is deleted first. See
    /// [`save_edit`](Self::save_edit).
    pub async fn save(&self, profile: Profile) -> Result<()> {
        self.save_inner(profile, None).await
    }

    /// Save `profile` as the edited version of the profile `previous`
    ///
    /// `previous` is deleted (and unregistered) before the new record is
    /// written, so a rename shows up as delete-old plus add-new. Required
    /// fields are checked before any I/O. If the auto-register policy is on
    /// and the profile asks for it, a registration is started; its failure
    /// shows up in the profile status, not in the result.
    pub async fn save_edit(&self, previous: &str, profile: Profile) -> Result<()> {
        self.save_inner(profile, Some(previous)).await
    }

    async fn save_inner(&self, profile: Profile, previous: Option<&str>) -> Result<()> {
        profile.validate()?;
        check_identity(profile.identity())?;

        let inner = &self.inner;
        let identity = profile.identity().to_string();
        let _gate = inner.reload_gate.read().await;

        let mut slots: Vec<&str> = previous.into_iter().collect();
        slots.push(&identity);
        let _locks = inner.lock_identities(&slots).await;

        slots.dedup();
        for slot in slots {
            let indexed = inner.index.read().contains_key(slot);
            let occupied = if indexed {
                true
            } else {
                let slot_owned = slot.to_string();
                inner.with_store(move |store| Ok(store.contains(&slot_owned))).await?
            };
            if occupied {
                debug!("Replacing profile '{}' with '{}'", slot, identity);
                self.remove_locked(slot).await?;
            }
        }

        let record = profile.clone();
        inner.with_store(move |store| store.save(&record)).await?;

        {
            let mut index = inner.index.write();
            index.insert(
                identity.clone(),
                ProfileEntry {
                    profile: profile.clone(),
                    status: RegistrationStatus::Unregistered,
                    generation: inner.next_generation(),
                    updated_at: Utc::now(),
                },
            );
            inner.events.publish(ProfileEvent::ProfileSaved {
                identity: identity.clone(),
            });
            inner
                .events
                .status_changed(&identity, RegistrationStatus::Unregistered);
        }
        info!("Saved profile '{}'", identity);

        if self.auto_register_policy() && profile.auto_register {
            if let Err(e) = self.open_locked(&identity).await {
                warn!("Auto-registration of '{}' failed: {}", identity, e);
            }
        }
        Ok(())
    }

    /// Delete a profile and unregister it
    ///
    /// Deleting an unknown identity is not an error. The unregistration is
    /// always attempted, even if the record could not be removed; its
    /// failure is logged and not returned.
    pub async fn delete(&self, identity: &str) -> Result<()> {
        let _gate = self.inner.reload_gate.read().await;
        let _locks = self.inner.lock_identities(&[identity]).await;
        self.remove_locked(identity).await
    }

    async fn remove_locked(&self, identity: &str) -> Result<()> {
        let inner = &self.inner;

        let target = identity.to_string();
        let stored = inner.with_store(move |store| store.delete(&target)).await;

        if stored.is_ok() {
            let mut index = inner.index.write();
            if index.remove(identity).is_some() {
                inner.events.publish(ProfileEvent::ProfileDeleted {
                    identity: identity.to_string(),
                });
                drop(index);
                info!("Deleted profile '{}'", identity);
            }
        }

        if let Err(e) = inner.service.close(identity).await {
            warn!("Unregistering deleted profile '{}' failed: {}", identity, e);
        }

        stored
    }

    /// Start registering a profile at the user's request
    pub async fn register(&self, identity: &str) -> Result<()> {
        let _gate = self.inner.reload_gate.read().await;
        let _locks = self.inner.lock_identities(&[identity]).await;
        self.open_locked(identity).await
    }

    /// Unregister a profile at the user's request
    pub async fn unregister(&self, identity: &str) -> Result<()> {
        let _gate = self.inner.reload_gate.read().await;
        let _locks = self.inner.lock_identities(&[identity]).await;
        self.close_locked(identity).await
    }

    async fn open_locked(&self, identity: &str) -> Result<()> {
        let inner = &self.inner;
        let (profile, generation) = {
            let index = inner.index.read();
            let entry = index
                .get(identity)
                .ok_or_else(|| ProfileError::not_found(identity))?;
            (entry.profile.clone(), entry.generation)
        };

        inner.set_status(identity, Some(generation), RegistrationStatus::Registering);

        let sink: Arc<dyn RegistrationEventSink> = self.inner.clone();
        let listener = RegistrationListener::new(
            ListenerBinding {
                identity: identity.to_string(),
                generation,
            },
            Arc::downgrade(&sink),
        );

        debug!("Opening registration for '{}'", identity);
        if let Err(e) = inner
            .service
            .open(&profile, inner.config.registration_purpose, listener)
            .await
        {
            inner.set_status(identity, Some(generation), RegistrationStatus::Error(e.to_string()));
            return Err(e);
        }
        Ok(())
    }

    async fn close_locked(&self, identity: &str) -> Result<()> {
        let inner = &self.inner;
        let generation = inner
            .index
            .read()
            .get(identity)
            .map(|entry| entry.generation)
            .ok_or_else(|| ProfileError::not_found(identity))?;

        debug!("Closing registration for '{}'", identity);
        match inner.service.close(identity).await {
            Ok(()) => {
                inner.set_status(identity, Some(generation), RegistrationStatus::Unregistered);
                Ok(())
            }
            Err(e) => {
                inner.set_status(identity, Some(generation), RegistrationStatus::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Current state of the global auto-register policy
    pub fn auto_register_policy(&self) -> bool {
        self.inner.auto_register.load(Ordering::SeqCst)
    }

    /// Turn the global auto-register policy on or off
    ///
    /// Turning it on opens every auto-register profile that is not
    /// registered or registering. Turning it off closes every profile that
    /// is registered, registering, or flagged auto-register. Every eligible
    /// profile gets an attempt; failures are collected in the report.
    pub async fn set_auto_register_policy(&self, enabled: bool) -> PolicyReport {
        self.inner.auto_register.store(enabled, Ordering::SeqCst);
        info!("Auto-register policy {}", if enabled { "enabled" } else { "disabled" });
        self.apply_policy(enabled).await
    }

    async fn apply_policy(&self, enabled: bool) -> PolicyReport {
        let _gate = self.inner.reload_gate.read().await;

        let eligible: Vec<String> = self
            .inner
            .index
            .read()
            .iter()
            .filter(|(_, entry)| policy_applies(entry, enabled))
            .map(|(identity, _)| identity.clone())
            .collect();

        let mut report = PolicyReport::default();
        for identity in eligible {
            let _locks = self.inner.lock_identities(&[identity.as_str()]).await;

            // Re-check under the lock; the profile may have changed meanwhile
            let still_eligible = self
                .inner
                .index
                .read()
                .get(&identity)
                .is_some_and(|entry| policy_applies(entry, enabled));
            if !still_eligible {
                continue;
            }

            let result = if enabled {
                self.open_locked(&identity).await
            } else {
                self.close_locked(&identity).await
            };
            if let Err(e) = result {
                warn!("Auto-register policy change failed for '{}': {}", identity, e);
                report.failures.push(e);
            }
            report.attempted.push(identity);
        }
        report
    }

    /// Run the edit flow for `identity`, or for a new profile when `None`
    pub async fn start_edit(
        &self,
        identity: Option<&str>,
        editor: &dyn ProfileEditor,
    ) -> Result<EditResult> {
        let existing = match identity {
            Some(identity) => Some(
                self.profile(identity)
                    .ok_or_else(|| ProfileError::not_found(identity))?,
            ),
            None => None,
        };
        let previous = existing.as_ref().map(|p| p.identity().to_string());

        match editor.edit(existing).await {
            EditOutcome::Commit(profile) => {
                let saved = profile.identity().to_string();
                match previous.as_deref() {
                    Some(previous) => self.save_edit(previous, profile).await?,
                    None => self.save(profile).await?,
                }
                Ok(EditResult::Saved(saved))
            }
            EditOutcome::Remove => match previous {
                Some(previous) => {
                    self.delete(&previous).await?;
                    Ok(EditResult::Removed(previous))
                }
                None => Ok(EditResult::Unchanged),
            },
            EditOutcome::Cancel => Ok(EditResult::Unchanged),
        }
    }

    /// All profiles, sorted by name
    pub fn profiles(&self) -> Vec<Profile> {
        self.inner
            .index
            .read()
            .values()
            .map(|entry| entry.profile.clone())
            .collect()
    }

    /// Look up one profile
    pub fn profile(&self, identity: &str) -> Option<Profile> {
        self.inner
            .index
            .read()
            .get(identity)
            .map(|entry| entry.profile.clone())
    }

    /// Registration status of one profile
    pub fn status(&self, identity: &str) -> Option<RegistrationStatus> {
        self.inner
            .index
            .read()
            .get(identity)
            .map(|entry| entry.status.clone())
    }

    /// When the profile's status last changed
    pub fn status_changed_at(&self, identity: &str) -> Option<DateTime<Utc>> {
        self.inner
            .index
            .read()
            .get(identity)
            .map(|entry| entry.updated_at)
    }

    /// Every profile with its status, sorted by name
    pub fn snapshot(&self) -> Vec<ProfileSnapshot> {
        self.inner
            .index
            .read()
            .values()
            .map(|entry| ProfileSnapshot {
                profile: entry.profile.clone(),
                status: entry.status.clone(),
            })
            .collect()
    }

    /// Number of known profiles
    pub fn len(&self) -> usize {
        self.inner.index.read().len()
    }

    /// Whether no profiles are known
    pub fn is_empty(&self) -> bool {
        self.inner.index.read().is_empty()
    }

    /// Stop delivering events to observers and subscribers
    pub fn shutdown(&self) {
        if let Some(handle) = self.inner.dispatcher.lock().take() {
            handle.abort();
            debug!("Profile manager shut down");
        }
    }
}

fn policy_applies(entry: &ProfileEntry, enabled: bool) -> bool {
    if enabled {
        entry.profile.auto_register && !entry.status.is_active()
    } else {
        entry.status.is_active() || entry.profile.auto_register
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::registration::RegistrationPurpose;
    use tempfile::TempDir;

    /// Service that accepts everything and never calls back
    struct SilentService;

    #[async_trait]
    impl RegistrationService for SilentService {
        async fn open(
            &self,
            _profile: &Profile,
            _purpose: RegistrationPurpose,
            _listener: RegistrationListener,
        ) -> Result<()> {
            Ok(())
        }

        async fn close(&self, _identity: &str) -> Result<()> {
            Ok(())
        }

        async fn is_registered(&self, _identity: &str) -> Result<bool> {
            Ok(false)
        }
    }

    fn manager(auto_register: bool) -> (ProfileManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = ProfileManagerConfig::new(temp_dir.path()).with_auto_register(auto_register);
        (ProfileManager::new(config, Arc::new(SilentService)).unwrap(), temp_dir)
    }

    fn entry(auto_register: bool, status: RegistrationStatus) -> ProfileEntry {
        ProfileEntry {
            profile: Profile::new("p", "d", "u", "s").with_auto_register(auto_register),
            status,
            generation: 1,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_policy_eligibility() {
        assert!(policy_applies(&entry(true, RegistrationStatus::Unregistered), true));
        assert!(policy_applies(&entry(true, RegistrationStatus::Error("x".into())), true));
        assert!(!policy_applies(&entry(true, RegistrationStatus::Registered), true));
        assert!(!policy_applies(&entry(false, RegistrationStatus::Unregistered), true));

        assert!(policy_applies(&entry(false, RegistrationStatus::Registered), false));
        assert!(policy_applies(&entry(true, RegistrationStatus::Unregistered), false));
        assert!(!policy_applies(&entry(false, RegistrationStatus::Unregistered), false));
    }

    #[tokio::test]
    async fn test_silent_registration_stays_registering() {
        let (manager, _temp_dir) = manager(true);
        manager
            .save(Profile::new("alice", "sip.example.com", "alice", "secret"))
            .await
            .unwrap();

        assert_eq!(manager.status("alice"), Some(RegistrationStatus::Registering));
    }

    #[tokio::test]
    async fn test_stale_generation_is_ignored() {
        let (manager, _temp_dir) = manager(false);
        manager
            .save(Profile::new("alice", "sip.example.com", "alice", "secret"))
            .await
            .unwrap();

        let stale = ListenerBinding {
            identity: "alice".to_string(),
            generation: 0,
        };
        manager
            .inner
            .apply_registration_event(&stale, RegistrationEvent::Done { expiry_secs: 600 });

        assert_eq!(manager.status("alice"), Some(RegistrationStatus::Unregistered));
    }

    #[tokio::test]
    async fn test_register_unknown_profile() {
        let (manager, _temp_dir) = manager(false);
        assert_eq!(
            manager.register("ghost").await,
            Err(ProfileError::not_found("ghost"))
        );
        assert_eq!(
            manager.unregister("ghost").await,
            Err(ProfileError::not_found("ghost"))
        );
    }

    #[tokio::test]
    async fn test_identity_locks_are_pruned_after_use() {
        let (manager, _temp_dir) = manager(false);
        manager
            .save(Profile::new("alice", "sip.example.com", "alice", "secret"))
            .await
            .unwrap();
        let _ = manager.register("ghost").await;
        let _ = manager.unregister("ghost").await;
        manager
            .save_edit("bob", Profile::new("carol", "sip.example.com", "carol", "secret"))
            .await
            .unwrap();
        manager.delete("alice").await.unwrap();
        manager.delete("nobody").await.unwrap();

        assert!(manager.inner.identity_locks.is_empty());
        assert_eq!(manager.len(), 1);
    }
}
