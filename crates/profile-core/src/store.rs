//! On-disk profile storage
//!
//! Each profile lives in its own directory under the store root, named
//! exactly as the profile identity, holding a single JSON record:
//!
//! ```text
//! <root>/
//!   alice/profile.json
//!   bob/profile.json
//! ```
//!
//! A record is only trusted when the name stored inside it matches the
//! directory it was found in. All operations are blocking filesystem calls
//! and are safe to run on a worker thread; operations on different
//! identities touch disjoint directories.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ProfileError, Result};
use crate::profile::{Profile, ProfileField};

/// Name of the record file inside each profile directory
pub const RECORD_FILE: &str = "profile.json";

const TEMP_SUFFIX: &str = ".tmp";

/// Result of scanning the store
#[derive(Debug, Default)]
pub struct StoreListing {
    /// Records that parsed and passed the directory self-check
    pub profiles: Vec<Profile>,
    /// Entries that were discarded, with the reason
    pub skipped: Vec<ProfileError>,
}

/// Directory-per-profile store rooted at a filesystem path
#[derive(Debug, Clone)]
pub struct ProfileStore {
    root: PathBuf,
}

impl ProfileStore {
    /// Create a store rooted at `root`; the directory is created on first save
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the record for `identity`
    pub fn profile_dir(&self, identity: &str) -> PathBuf {
        self.root.join(identity)
    }

    /// Write a profile, fully replacing any existing record with the same identity
    ///
    /// The record is written to a temporary file and renamed into place, so a
    /// failed save never leaves a half-written record behind.
    pub fn save(&self, profile: &Profile) -> Result<()> {
        let identity = profile.identity();
        check_identity(identity)?;

        let dir = self.profile_dir(identity);
        self.delete(identity)?;
        fs::create_dir_all(&dir).map_err(|e| ProfileError::from_io(identity, e))?;

        let encoded = serde_json::to_vec_pretty(profile)
            .map_err(|e| ProfileError::internal(format!("failed to encode profile '{}': {}", identity, e)))?;

        let temp_path = dir.join(format!("{}{}", RECORD_FILE, TEMP_SUFFIX));
        let record_path = dir.join(RECORD_FILE);
        write_synced(&temp_path, &encoded).map_err(|e| ProfileError::from_io(identity, e))?;
        fs::rename(&temp_path, &record_path).map_err(|e| ProfileError::from_io(identity, e))?;

        debug!("Saved profile '{}' to {}", identity, record_path.display());
        Ok(())
    }

    /// Read one record
    ///
    /// Fails with `NotFound` when no record exists, `CorruptRecord` when the
    /// bytes do not parse and `ConsistencyViolation` when the stored name does
    /// not match `identity`.
    pub fn load(&self, identity: &str) -> Result<Profile> {
        check_identity(identity)?;
        let record_path = self.profile_dir(identity).join(RECORD_FILE);
        let bytes = match fs::read(&record_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ProfileError::not_found(identity));
            }
            Err(e) => return Err(ProfileError::from_io(identity, e)),
        };

        let profile: Profile = serde_json::from_slice(&bytes)
            .map_err(|e| ProfileError::corrupt(identity, e.to_string()))?;

        if profile.name != identity {
            return Err(ProfileError::ConsistencyViolation {
                directory: identity.to_string(),
                stored: profile.name,
            });
        }
        Ok(profile)
    }

    /// Remove the record for `identity`; removing a missing record is not an error
    pub fn delete(&self, identity: &str) -> Result<()> {
        check_identity(identity)?;
        match fs::remove_dir_all(self.profile_dir(identity)) {
            Ok(()) => {
                debug!("Removed profile directory for '{}'", identity);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ProfileError::from_io(identity, e)),
        }
    }

    /// Whether a record exists for `identity`; never true for unusable identities
    pub fn contains(&self, identity: &str) -> bool {
        check_identity(identity).is_ok() && self.profile_dir(identity).join(RECORD_FILE).is_file()
    }

    /// Load every valid record under the root
    ///
    /// Unreadable, corrupt and mismatched entries are skipped and reported;
    /// only a failure to read the root itself fails the call. A missing root
    /// is an empty store.
    pub fn list_all(&self) -> Result<StoreListing> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StoreListing::default()),
            Err(e) => {
                return Err(ProfileError::storage(
                    self.root.display().to_string(),
                    e.to_string(),
                ));
            }
        };

        let mut listing = StoreListing::default();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read entry under {}: {}", self.root.display(), e);
                    listing
                        .skipped
                        .push(ProfileError::storage(self.root.display().to_string(), e.to_string()));
                    continue;
                }
            };

            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let Some(directory) = entry.file_name().to_str().map(str::to_owned) else {
                warn!("Skipping profile directory with non UTF-8 name: {:?}", entry.file_name());
                continue;
            };
            if directory.starts_with('.') {
                continue;
            }

            match self.load(&directory) {
                Ok(profile) => listing.profiles.push(profile),
                Err(e) => {
                    warn!("Skipping profile entry '{}': {}", directory, e);
                    listing.skipped.push(e);
                }
            }
        }

        debug!(
            "Scanned {}: {} profiles, {} skipped",
            self.root.display(),
            listing.profiles.len(),
            listing.skipped.len()
        );
        Ok(listing)
    }
}

/// Reject identities that cannot be used as a single directory name
pub fn check_identity(identity: &str) -> Result<()> {
    let key = ProfileField::Name.key();
    if identity.trim().is_empty() {
        return Err(ProfileError::empty_field(key));
    }
    if identity.starts_with('.') {
        return Err(ProfileError::invalid_field(key, "must not start with '.'"));
    }
    if identity.contains(['/', '\\', '\0']) {
        return Err(ProfileError::invalid_field(key, "must not contain path separators"));
    }
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
