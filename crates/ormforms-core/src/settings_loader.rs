//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with [`FormSettings::default`].
//! 2. Merge a TOML or JSON document over the defaults.
//! 3. Apply environment variable overrides (highest priority).
//!
//! A `template_file` that does not exist is rejected after each step.
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `ORMFORMS_LABEL_COLUMNS` | `label_columns` |
//! | `ORMFORMS_CONTROL_COLUMNS` | `control_columns` |
//! | `ORMFORMS_AJAX` | `ajax` |
//! | `ORMFORMS_TEMPLATE_FILE` | `template_file` |
//! | `ORMFORMS_SUBMIT_BUTTON` | `submit_button` |
//! | `ORMFORMS_EXPOSE_ID` | `expose_id` |
//! | `ORMFORMS_LOG_LEVEL` | `log_level` |
//! | `ORMFORMS_DEBUG` | `debug` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use ormforms_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/forms.toml").unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::error::FormsError;
use crate::settings::FormSettings;

/// Loads settings from a TOML string, keeping defaults for absent keys.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized, or
/// if it names a missing template file.
pub fn from_toml_str(toml_str: &str) -> Result<FormSettings, FormsError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| FormsError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;
    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<FormSettings, FormsError> {
    from_toml_str(&read_file(path.as_ref(), "TOML")?)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the TOML is malformed, or the
/// resulting template file is missing.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<FormSettings, FormsError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// Loads settings from a JSON string, keeping defaults for absent keys.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized, or
/// if it names a missing template file.
pub fn from_json_str(json_str: &str) -> Result<FormSettings, FormsError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| FormsError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;
    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<FormSettings, FormsError> {
    from_json_str(&read_file(path.as_ref(), "JSON")?)
}

/// Builds settings from the defaults plus environment overrides only.
///
/// # Errors
///
/// Returns an error if `ORMFORMS_TEMPLATE_FILE` names a missing file.
pub fn from_env() -> Result<FormSettings, FormsError> {
    let mut settings = FormSettings::default();
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// Applies `ORMFORMS_*` environment variable overrides to `settings`.
///
/// Unparseable numeric values are ignored and the previous value is kept.
///
/// # Errors
///
/// Returns an error if the template file in effect afterwards is missing.
pub fn apply_env_overrides(settings: &mut FormSettings) -> Result<(), FormsError> {
    apply_overrides_from(settings, |key| std::env::var(key).ok());
    settings.check_template()
}

/// Applies overrides read through `lookup`, keyed by environment variable name.
fn apply_overrides_from(settings: &mut FormSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(cols) = lookup("ORMFORMS_LABEL_COLUMNS").and_then(|v| v.parse().ok()) {
        settings.label_columns = cols;
    }
    if let Some(cols) = lookup("ORMFORMS_CONTROL_COLUMNS").and_then(|v| v.parse().ok()) {
        settings.control_columns = cols;
    }
    if let Some(val) = lookup("ORMFORMS_AJAX") {
        settings.ajax = parse_flag(&val);
    }
    if let Some(val) = lookup("ORMFORMS_TEMPLATE_FILE") {
        settings.template_file = if val.is_empty() {
            None
        } else {
            Some(PathBuf::from(val))
        };
    }
    if let Some(val) = lookup("ORMFORMS_SUBMIT_BUTTON") {
        settings.submit_button = parse_flag(&val);
    }
    if let Some(val) = lookup("ORMFORMS_EXPOSE_ID") {
        settings.expose_id = parse_flag(&val);
    }
    if let Some(val) = lookup("ORMFORMS_LOG_LEVEL") {
        settings.log_level = val;
    }
    if let Some(val) = lookup("ORMFORMS_DEBUG") {
        settings.debug = parse_flag(&val);
    }
}

// ============================================================
// Helpers
// ============================================================

fn parse_flag(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn read_file(path: &Path, format: &str) -> Result<String, FormsError> {
    std::fs::read_to_string(path).map_err(|e| {
        FormsError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(
    value: serde_json::Value,
    format: &str,
) -> Result<FormSettings, FormsError> {
    let default_json = serde_json::to_value(FormSettings::default()).map_err(|e| {
        FormsError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;
    let merged = merge_json(default_json, value);
    let settings: FormSettings = serde_json::from_value(merged).map_err(|e| {
        FormsError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })?;
    settings.check_template()?;
    Ok(settings)
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = match base_map.remove(&key) {
                    Some(base_v) => merge_json(base_v, override_v),
                    None => override_v,
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let settings = from_toml_str(
            r#"
            label_columns = 4
            control_columns = 8
            ajax = true
        "#,
        )
        .unwrap();
        assert_eq!(settings.label_columns, 4);
        assert_eq!(settings.control_columns, 8);
        assert!(settings.ajax);
        // Untouched keys keep their defaults
        assert!(settings.submit_button);
        assert_eq!(settings.submit_label_update, "Save");
    }

    #[test]
    fn test_from_toml_str_empty() {
        assert_eq!(from_toml_str("").unwrap(), FormSettings::default());
    }

    #[test]
    fn test_from_toml_str_invalid() {
        assert!(from_toml_str("label_columns = [").is_err());
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let err = from_toml_str("label_columns = \"three\"").unwrap_err();
        assert!(err.to_string().contains("Failed to deserialize settings from TOML"));
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "expose_id = true\nsubmit_label_insert = \"Vytvořit\"").unwrap();
        let settings = from_toml_file(file.path()).unwrap();
        assert!(settings.expose_id);
        assert_eq!(settings.submit_label_insert, "Vytvořit");
    }

    #[test]
    fn test_from_toml_file_missing() {
        assert!(from_toml_file("/nonexistent/path/forms.toml").is_err());
    }

    // ── JSON loading ────────────────────────────────────────────────

    #[test]
    fn test_from_json_str_basic() {
        let settings =
            from_json_str(r#"{"submit_button": false, "log_level": "debug"}"#).unwrap();
        assert!(!settings.submit_button);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.label_columns, 3);
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(from_json_str("{not json").is_err());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"ajax": true}}"#).unwrap();
        assert!(from_json_file(file.path()).unwrap().ajax);
    }

    #[test]
    fn test_loaded_template_must_exist() {
        let err = from_toml_str("template_file = \"/nonexistent/form.html\"").unwrap_err();
        assert!(err.to_string().contains("Missing template file"));
        let err = from_json_str(r#"{"template_file": "/nonexistent/form.html"}"#).unwrap_err();
        assert!(matches!(err, FormsError::ConfigurationError(_)));

        let template = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::json!({ "template_file": template.path() }).to_string();
        let settings = from_json_str(&json).unwrap();
        assert_eq!(settings.template_file.as_deref(), Some(template.path()));
    }

    // ── Overrides ───────────────────────────────────────────────────

    #[test]
    fn test_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("ORMFORMS_LABEL_COLUMNS", "2"),
            ("ORMFORMS_CONTROL_COLUMNS", "10"),
            ("ORMFORMS_AJAX", "yes"),
            ("ORMFORMS_EXPOSE_ID", "1"),
            ("ORMFORMS_SUBMIT_BUTTON", "false"),
            ("ORMFORMS_LOG_LEVEL", "warn"),
            ("ORMFORMS_TEMPLATE_FILE", "/tmp/form.latte"),
        ]
        .into_iter()
        .collect();
        let mut settings = FormSettings::default();
        apply_overrides_from(&mut settings, |k| env.get(k).map(ToString::to_string));

        assert_eq!(settings.label_columns, 2);
        assert_eq!(settings.control_columns, 10);
        assert!(settings.ajax);
        assert!(settings.expose_id);
        assert!(!settings.submit_button);
        assert_eq!(settings.log_level, "warn");
        assert_eq!(
            settings.template_file,
            Some(PathBuf::from("/tmp/form.latte"))
        );
    }

    #[test]
    fn test_overridden_template_is_checked() {
        let mut settings = FormSettings::default();
        apply_overrides_from(&mut settings, |k| {
            (k == "ORMFORMS_TEMPLATE_FILE").then(|| "/nonexistent/form.html".to_string())
        });
        assert!(settings.check_template().is_err());

        apply_overrides_from(&mut settings, |k| {
            (k == "ORMFORMS_TEMPLATE_FILE").then(String::new)
        });
        assert!(settings.check_template().is_ok());
    }

    #[test]
    fn test_overrides_ignore_bad_numbers() {
        let mut settings = FormSettings::default();
        apply_overrides_from(&mut settings, |k| {
            (k == "ORMFORMS_LABEL_COLUMNS").then(|| "wide".to_string())
        });
        assert_eq!(settings.label_columns, 3);
    }

    #[test]
    fn test_overrides_absent_keep_values() {
        let mut settings = FormSettings::default().with_ajax(true);
        apply_overrides_from(&mut settings, |_| None);
        assert!(settings.ajax);
    }

    // ── merge_json helper ───────────────────────────────────────────

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"outer": {"a": 1, "b": 2}});
        let over = serde_json::json!({"outer": {"b": 3}});
        let merged = merge_json(base, over);
        assert_eq!(merged["outer"]["a"], 1);
        assert_eq!(merged["outer"]["b"], 3);
    }
}
