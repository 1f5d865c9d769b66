//! Layout values handed to an external renderer.
//!
//! No markup is produced here. [`RenderLayout`] carries the grid widths, the
//! AJAX flag and the optional template, and names the CSS classes a
//! horizontal bootstrap-style renderer applies to each part of the form.

use std::path::{Path, PathBuf};

use ormforms_core::FormSettings;
use serde::Serialize;

use crate::control::ControlKind;
use crate::form::Form;

/// Wrapper of one label/control pair.
pub const PAIR_CLASS: &str = "form-group";
/// Added to the pair wrapper when the control has errors.
pub const PAIR_ERROR_CLASS: &str = "has-error";
/// Description and error container below a control.
pub const HELP_BLOCK_CLASS: &str = "help-block";

/// Layout configuration for rendering one form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderLayout {
    label_columns: u8,
    control_columns: u8,
    ajax: bool,
    template_file: Option<PathBuf>,
}

impl From<&FormSettings> for RenderLayout {
    fn from(settings: &FormSettings) -> Self {
        Self {
            label_columns: settings.label_columns,
            control_columns: settings.control_columns,
            ajax: settings.ajax,
            template_file: settings.template_file.clone(),
        }
    }
}

impl RenderLayout {
    /// Grid columns of the label cell.
    pub const fn label_columns(&self) -> u8 {
        self.label_columns
    }

    /// Grid columns of the control cell.
    pub const fn control_columns(&self) -> u8 {
        self.control_columns
    }

    /// Whether the form is an AJAX form.
    pub const fn is_ajax(&self) -> bool {
        self.ajax
    }

    /// The custom template, if one is configured.
    pub fn template_file(&self) -> Option<&Path> {
        self.template_file.as_deref()
    }

    /// Classes of the `<form>` element.
    pub fn form_classes(&self) -> Vec<&'static str> {
        let mut classes = vec!["form-horizontal"];
        if self.ajax {
            classes.push("ajax");
        }
        classes
    }

    /// Class of the label container, e.g. `control-label col-sm-3`.
    pub fn label_class(&self) -> String {
        format!("control-label col-sm-{}", self.label_columns)
    }

    /// Class of the control container, e.g. `col-sm-9`.
    pub fn control_container_class(&self) -> String {
        format!("col-sm-{}", self.control_columns)
    }

    /// Class of the pair wrapper, with the error class when `has_errors`.
    pub fn pair_class(&self, has_errors: bool) -> String {
        if has_errors {
            format!("{PAIR_CLASS} {PAIR_ERROR_CLASS}")
        } else {
            PAIR_CLASS.to_string()
        }
    }

    /// Class applied to each control element, keyed by control name.
    ///
    /// The first top-level submit button is the primary button.
    pub fn control_classes(&self, form: &Form) -> Vec<(String, &'static str)> {
        let primary = form
            .top_level_controls()
            .find(|c| c.kind() == ControlKind::Submit)
            .map(|c| c.name().to_string());

        form.controls()
            .into_iter()
            .filter_map(|control| {
                let class = match control.kind() {
                    ControlKind::Submit if primary.as_deref() == Some(control.name()) => {
                        "btn btn-primary"
                    }
                    ControlKind::Submit => "btn btn-default",
                    ControlKind::Checkbox => "checkbox-inline",
                    ControlKind::Hidden => return None,
                    _ => "form-control",
                };
                Some((control.name().to_string(), class))
            })
            .collect()
    }

    /// The layout as a JSON object, for template contexts.
    pub fn to_context(&self) -> serde_json::Value {
        serde_json::json!({
            "label_columns": self.label_columns,
            "control_columns": self.control_columns,
            "ajax": self.ajax,
            "template_file": self.template_file,
            "form_class": self.form_classes().join(" "),
            "label_class": self.label_class(),
            "control_class": self.control_container_class(),
            "pair_class": PAIR_CLASS,
            "error_class": PAIR_ERROR_CLASS,
            "help_class": HELP_BLOCK_CLASS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::FormControl;
    use crate::form::Component;

    #[test]
    fn test_classes_follow_columns() {
        let layout = RenderLayout::from(&FormSettings::default().with_columns(4, 8));
        assert_eq!(layout.label_class(), "control-label col-sm-4");
        assert_eq!(layout.control_container_class(), "col-sm-8");
        assert_eq!(layout.pair_class(true), "form-group has-error");
        assert_eq!(layout.pair_class(false), "form-group");
    }

    #[test]
    fn test_ajax_form_class() {
        let layout = RenderLayout::from(&FormSettings::default().with_ajax(true));
        assert_eq!(layout.form_classes(), vec!["form-horizontal", "ajax"]);
        assert!(layout.is_ajax());
        assert_eq!(layout.to_context()["form_class"], "form-horizontal ajax");
    }

    #[test]
    fn test_control_classes_mark_first_submit_primary() {
        let mut form = Form::new("f");
        form.add(FormControl::text("title"))
            .add(FormControl::hidden("id"))
            .add_group(
                "extra",
                vec![Component::Control(FormControl::submit("preview", "Preview"))],
            )
            .add_submit("save", "Save")
            .add_submit("cancel", "Cancel");

        let layout = RenderLayout::from(&FormSettings::default());
        let classes = layout.control_classes(&form);
        assert_eq!(
            classes,
            vec![
                ("title".to_string(), "form-control"),
                ("preview".to_string(), "btn btn-default"),
                ("save".to_string(), "btn btn-primary"),
                ("cancel".to_string(), "btn btn-default"),
            ]
        );
    }
}
