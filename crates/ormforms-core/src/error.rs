//! Core error types for ormforms.
//!
//! [`FormsError`] covers the three failure families an entity-backed form
//! can meet: configuration conditions (unknown entity types, unmapped
//! columns), persistence faults raised by the storage layer, and lifecycle
//! misuse of a binder.


use thiserror::Error;

/// The primary error type for ormforms.
///
/// Configuration conditions are tolerated by the binder: it logs them and
/// skips the affected field. See [`FormsError::is_configuration_condition`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormsError {
    // ── Configuration conditions ─────────────────────────────────────

    /// No repository is registered for the requested entity type.
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    /// The repository has no column metadata for the requested field.
    #[error("Unmapped field '{field}' on entity type '{entity_type}'")]
    UnmappedField {
        /// The entity type that was queried.
        entity_type: String,
        /// The field name that has no column mapping.
        field: String,
    },

    // ── Persistence ──────────────────────────────────────────────────

    /// A lookup by key found no row.
    #[error("{entity_type} with key {key} does not exist")]
    EntityNotFound {
        /// The entity type that was queried.
        entity_type: String,
        /// The key that was looked up, rendered for display.
        key: String,
    },

    /// The persistence layer failed while loading or saving.
    #[error("Persistence fault: {0}")]
    PersistenceFault(String),

    /// The entity refused a mutation it does not support.
    #[error("Entity '{entity_type}' does not support {operation} on '{field}'")]
    UnsupportedMutation {
        /// The entity type.
        entity_type: String,
        /// The kind of mutation attempted (`set`, `assign`, `add`).
        operation: &'static str,
        /// The field or relation name.
        field: String,
    },

    // ── Lifecycle ────────────────────────────────────────────────────

    /// An operation was invoked in a binder state that does not allow it.
    #[error("Lifecycle violation: {0}")]
    LifecycleViolation(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl FormsError {
    /// Returns `true` for errors that describe an evolving schema or form
    /// rather than a fault: unknown entity types and unmapped fields.
    pub const fn is_configuration_condition(&self) -> bool {
        matches!(self, Self::UnknownEntityType(_) | Self::UnmappedField { .. })
    }

    /// Returns `true` if the error came from the persistence layer.
    pub const fn is_persistence_fault(&self) -> bool {
        matches!(
            self,
            Self::PersistenceFault(_) | Self::EntityNotFound { .. }
        )
    }
}

/// A convenience type alias for `Result<T, FormsError>`.
pub type FormsResult<T> = Result<T, FormsError>;
