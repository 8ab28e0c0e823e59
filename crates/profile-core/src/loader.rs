//! Startup scan of the profile store

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{ProfileError, Result};
use crate::profile::Profile;
use crate::store::{ProfileStore, StoreListing};

/// Profiles found under a store root
#[derive(Debug, Default)]
pub struct LoadedProfiles {
    /// Valid profiles, sorted by name (case-sensitive)
    pub profiles: Vec<Profile>,
    /// Entries that were discarded during the scan
    pub skipped: Vec<ProfileError>,
}

/// Load every valid profile under `root`, sorted by name
///
/// Should two records ever carry the same name, the one read last wins.
pub fn load_profiles(root: &Path) -> Result<LoadedProfiles> {
    let listing = ProfileStore::new(root).list_all()?;
    Ok(sort_listing(listing))
}

pub(crate) fn sort_listing(listing: StoreListing) -> LoadedProfiles {
    let mut by_name = BTreeMap::new();
    for profile in listing.profiles {
        if let Some(previous) = by_name.insert(profile.name.clone(), profile) {
            warn!("Duplicate profile name '{}' in store, keeping the later record", previous.name);
        }
    }

    let loaded = LoadedProfiles {
        profiles: by_name.into_values().collect(),
        skipped: listing.skipped,
    };
    info!(
        "Loaded {} profiles ({} entries skipped)",
        loaded.profiles.len(),
        loaded.skipped.len()
    );
    loaded
}
