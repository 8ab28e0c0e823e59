//! Edit flow between the manager and an editing front end
//!
//! The manager hands an existing profile (or nothing, to create one) to a
//! [`ProfileEditor`] and acts on what comes back. Editors are expected to
//! build the returned profile through the field table (see
//! [`Profile::from_fields`](crate::profile::Profile::from_fields)); the manager
//! still re-checks required fields before saving.

use async_trait::async_trait;

use crate::profile::Profile;

/// What the user chose to do in the editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Save this profile, replacing the one being edited
    Commit(Profile),
    /// Remove the profile being edited
    Remove,
    /// Leave everything as it was
    Cancel,
}

/// What the manager did with an [`EditOutcome`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditResult {
    /// The profile was saved under this identity
    Saved(String),
    /// The profile with this identity was deleted
    Removed(String),
    /// Nothing changed
    Unchanged,
}

/// External editing front end
#[async_trait]
pub trait ProfileEditor: Send + Sync {
    /// Let the user edit `existing`, or create a profile when `None`
    async fn edit(&self, existing: Option<Profile>) -> EditOutcome;
}
