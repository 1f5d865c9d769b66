//! # ormforms
//!
//! Entity-backed forms: populate form controls from persisted entities,
//! infer validation rules from column metadata, and write submissions back
//! through a pluggable persistence layer.
//!
//! This is the meta-crate that re-exports all sub-crates. Depend on it to get
//! everything, or on individual crates for finer-grained control.

/// Error types, settings, and logging.
pub use ormforms_core as core;

/// Values, column metadata, the entity protocol, and persistence contracts.
#[cfg(feature = "db")]
pub use ormforms_db as db;

/// Instance-owned observer lists.
#[cfg(feature = "signals")]
pub use ormforms_signals as signals;

/// Form surface, rule inference, the entity binder, and the form factory.
#[cfg(feature = "forms")]
pub use ormforms_forms as forms;

/// Re-exported so persistence layers can be implemented without a direct dependency.
pub use async_trait::async_trait;

/// The types most applications need.
pub mod prelude {
    pub use ormforms_core::logging::setup_logging;
    pub use ormforms_core::{FormSettings, FormsError, FormsResult};

    #[cfg(feature = "db")]
    pub use ormforms_db::{
        Entity, EntityCapabilities, FieldValue, PersistenceLayer, Property, Related, Repository,
        Value,
    };

    #[cfg(feature = "forms")]
    pub use ormforms_forms::{
        BindingResult, DatabaseMethod, EntityBinder, EntityFormFactory, Form, FormControl,
        FormValues, RuleKind,
    };
}
