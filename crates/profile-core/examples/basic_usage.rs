//! Basic profile manager usage
//!
//! Stores two SIP profiles in a temporary directory, registers them against
//! an in-process registrar that answers after a short delay, and prints every
//! status change the observer receives.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use rvoip_profile_core::logging::{setup_logging, LoggingConfig};
use rvoip_profile_core::{
    Profile, ProfileManager, ProfileManagerConfig, RegistrationListener, RegistrationPurpose,
    RegistrationService, Result, StatusObserver, StatusUpdate, Transport,
};

/// Registrar that accepts every profile after a short delay
struct LoopbackRegistrar;

#[async_trait]
impl RegistrationService for LoopbackRegistrar {
    async fn open(
        &self,
        profile: &Profile,
        _purpose: RegistrationPurpose,
        listener: RegistrationListener,
    ) -> Result<()> {
        let identity = profile.identity().to_string();
        tokio::spawn(async move {
            listener.on_registering(&identity);
            tokio::time::sleep(Duration::from_millis(200)).await;
            listener.on_registration_done(&identity, 3600);
        });
        Ok(())
    }

    async fn close(&self, _identity: &str) -> Result<()> {
        Ok(())
    }

    async fn is_registered(&self, _identity: &str) -> Result<bool> {
        Ok(false)
    }
}

struct PrintingObserver;

#[async_trait]
impl StatusObserver for PrintingObserver {
    async fn on_status_changed(&self, update: StatusUpdate) {
        println!("[{}] {}: {}", update.timestamp.format("%H:%M:%S%.3f"), update.identity, update.text);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let profiles_dir = std::env::temp_dir().join("rvoip-profile-demo");
    let config = ProfileManagerConfig::new(&profiles_dir).with_auto_register(true);
    setup_logging(&LoggingConfig::for_manager(&config)?)?;
    let manager = ProfileManager::new(config, Arc::new(LoopbackRegistrar))?;
    manager.set_observer(Arc::new(PrintingObserver)).await;

    let report = manager
        .start()
        .await
        .map_err(|e| rvoip_profile_core::ProfileError::internal(e.to_string()))??;
    println!("Loaded {} stored profiles", report.loaded);

    manager
        .save(Profile::new("alice", "sip.example.com", "alice", "alice-secret").with_display_name("Alice"))
        .await?;
    manager
        .save(
            Profile::new("bob", "sip.example.org", "bob", "bob-secret")
                .with_transport(Transport::Tcp)
                .with_port(5080),
        )
        .await?;

    tokio::time::sleep(Duration::from_millis(500)).await;

    for entry in manager.snapshot() {
        println!("{:<8} {:<40} {}", entry.profile.name, entry.profile.summary(), entry.status);
    }

    manager.set_auto_register_policy(false).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    for identity in ["alice", "bob"] {
        manager.delete(identity).await?;
    }
    Ok(())
}
