//! Settings for entity-backed form factories.
//!
//! [`FormSettings`] holds the layout values handed to the renderer and the
//! switches controlling which controls the factory adds on its own. Load it
//! from a file with [`settings_loader`](crate::settings_loader) or build it in
//! code starting from [`FormSettings::default`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FormsError, FormsResult};

/// Configuration for one form factory.
///
/// # Examples
///
/// ```
/// use ormforms_core::settings::FormSettings;
///
/// let settings = FormSettings::default();
/// assert_eq!(settings.label_columns, 3);
/// assert_eq!(settings.control_columns, 9);
/// assert!(settings.submit_button);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSettings {
    // ── Layout ───────────────────────────────────────────────────────

    /// Grid columns occupied by the label cell.
    pub label_columns: u8,
    /// Grid columns occupied by the control cell.
    pub control_columns: u8,
    /// Whether the form is submitted over AJAX.
    pub ajax: bool,
    /// Optional custom template for the renderer.
    pub template_file: Option<PathBuf>,

    // ── Generated controls ───────────────────────────────────────────

    /// Append a submit button when the definition declares none.
    pub submit_button: bool,
    /// Append a hidden `id` control carrying the entity key.
    pub expose_id: bool,
    /// Label of the generated submit button on the insert path.
    pub submit_label_insert: String,
    /// Label of the generated submit button on the update path.
    pub submit_label_update: String,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level (e.g. "info", "debug", "warn").
    pub log_level: String,
    /// Pretty, human-readable logs instead of JSON.
    pub debug: bool,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            label_columns: 3,
            control_columns: 9,
            ajax: false,
            template_file: None,
            submit_button: true,
            expose_id: false,
            submit_label_insert: "Create".to_string(),
            submit_label_update: "Save".to_string(),
            log_level: "info".to_string(),
            debug: false,
        }
    }
}

impl FormSettings {
    /// Sets the custom renderer template.
    ///
    /// # Errors
    ///
    /// Returns [`FormsError::ConfigurationError`] if `path` is not an existing file.
    pub fn with_template(mut self, path: impl AsRef<Path>) -> FormsResult<Self> {
        self.template_file = Some(path.as_ref().to_path_buf());
        self.check_template()?;
        Ok(self)
    }

    /// Checks that the configured template, if any, is an existing file.
    ///
    /// # Errors
    ///
    /// Returns [`FormsError::ConfigurationError`] for a missing template file.
    pub fn check_template(&self) -> FormsResult<()> {
        match &self.template_file {
            Some(path) if !path.is_file() => Err(FormsError::ConfigurationError(format!(
                "Missing template file {}",
                path.display()
            ))),
            _ => Ok(()),
        }
    }

    /// Sets the AJAX flag.
    #[must_use]
    pub const fn with_ajax(mut self, ajax: bool) -> Self {
        self.ajax = ajax;
        self
    }

    /// Sets whether a submit button is generated.
    #[must_use]
    pub const fn with_submit_button(mut self, submit_button: bool) -> Self {
        self.submit_button = submit_button;
        self
    }

    /// Sets whether a hidden `id` control is generated.
    #[must_use]
    pub const fn with_expose_id(mut self, expose_id: bool) -> Self {
        self.expose_id = expose_id;
        self
    }

    /// Sets the label/control grid split.
    #[must_use]
    pub const fn with_columns(mut self, label_columns: u8, control_columns: u8) -> Self {
        self.label_columns = label_columns;
        self.control_columns = control_columns;
        self
    }
}
