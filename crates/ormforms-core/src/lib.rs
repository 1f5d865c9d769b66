//! # ormforms-core
//!
//! Core types, settings, and error types for the ormforms workspace.
//! This crate has no dependency on the other ormforms crates and provides the
//! foundation they all build on.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Form factory settings
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{FormsError, FormsResult};
pub use settings::FormSettings;
