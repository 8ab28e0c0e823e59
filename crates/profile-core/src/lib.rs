//! # Profile-Core
//!
//! SIP account profile management for RVoIP clients.
//!
//! This crate provides:
//! - Durable storage of SIP account profiles, one directory per profile
//! - A startup loader that tolerates corrupt or misplaced records
//! - A [`ProfileManager`] that tracks the live registration status of every
//!   profile and serializes save, delete, register and unregister operations
//! - A global auto-register policy
//! - Status notifications delivered to a single observer task
//!
//! ## Architecture
//!
//! ```text
//! ProfileStore ──▶ loader ──▶ ProfileManager ──open/close──▶ RegistrationService
//!                                  ▲                              │
//!                                  └──── RegistrationListener ◀───┘
//!                                  │
//!                                  └──▶ event dispatcher ──▶ StatusObserver
//! ```
//!
//! The registration wire protocol is not implemented here; applications
//! plug in a [`RegistrationService`], usually backed by session-core.

pub mod config;
pub mod edit;
pub mod error;
pub mod events;
pub mod loader;
pub mod logging;
pub mod manager;
pub mod profile;
pub mod registration;
pub mod store;

pub use config::ProfileManagerConfig;
pub use edit::{EditOutcome, EditResult, ProfileEditor};
pub use error::{ProfileError, Result};
pub use events::{ProfileEvent, StatusObserver, StatusUpdate};
pub use loader::{load_profiles, LoadedProfiles};
pub use manager::{LoadReport, PolicyReport, ProfileManager, ProfileSnapshot};
pub use profile::{Profile, ProfileField, Transport, DEFAULT_SIP_PORT};
pub use registration::{
    RegistrationEvent, RegistrationListener, RegistrationPurpose, RegistrationService,
    RegistrationStatus,
};
pub use store::ProfileStore;
