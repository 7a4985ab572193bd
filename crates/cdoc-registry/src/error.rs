//! Build error types for cdoc-registry.

use cdoc_core::Location;

/// Fatal build errors. Anything else a build meets is a warning.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Duplicate qualified name '{name}' in group '{group}': first at {first}, again at {second}")]
    DuplicateQualifiedName {
        group: String,
        name: String,
        first: Location,
        second: Location,
    },

    #[error("Duplicate test '{name}': defined in {first} and {second}")]
    DuplicateTest {
        name: String,
        first: String,
        second: String,
    },

    #[error("Accurate backend required for group '{group}' but unavailable: {reason}")]
    BackendUnavailable { group: String, reason: String },
}
