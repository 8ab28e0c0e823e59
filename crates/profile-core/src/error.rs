//! Error types for profile storage and registration management

use thiserror::Error;

/// Result type for profile-core operations
pub type Result<T> = std::result::Result<T, ProfileError>;

/// Errors that can occur while managing SIP profiles
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileError {
    /// A required profile field is empty or unparsable
    ///
    /// Raised before any storage or network I/O is attempted.
    #[error("Invalid profile: {field} {reason}")]
    Validation {
        field: String,
        reason: String,
    },

    /// Storage I/O failed
    #[error("Storage error for profile '{identity}': {message}")]
    Storage { identity: String, message: String },

    /// A stored record exists but cannot be parsed
    #[error("Corrupt profile record '{identity}': {reason}")]
    CorruptRecord { identity: String, reason: String },

    /// No record or in-memory entry exists for the identity
    #[error("Profile not found: {identity}")]
    NotFound { identity: String },

    /// The registration service reported a failure
    #[error("Registration error for '{identity}': {message}")]
    Protocol { identity: String, message: String },

    /// A stored record does not belong to the directory it was found in
    #[error("Profile directory '{directory}' holds a record named '{stored}'")]
    ConsistencyViolation { directory: String, stored: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ProfileError {
    /// Create a validation error for an empty required field
    pub fn empty_field(field: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: "must not be empty".to_string(),
        }
    }

    /// Create a validation error for a field holding an unusable value
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a storage error
    pub fn storage(identity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            identity: identity.into(),
            message: message.into(),
        }
    }

    /// Create a corrupt record error
    pub fn corrupt(identity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptRecord {
            identity: identity.into(),
            reason: reason.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(identity: impl Into<String>) -> Self {
        Self::NotFound {
            identity: identity.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(identity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            identity: identity.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the user can fix this by correcting the profile form
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Whether a bulk load should skip the offending record and continue
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::CorruptRecord { .. } | Self::NotFound { .. } | Self::ConsistencyViolation { .. }
        )
    }

    /// Build a storage error from an I/O failure
    pub(crate) fn from_io(identity: &str, err: std::io::Error) -> Self {
        Self::storage(identity, err.to_string())
    }
}
