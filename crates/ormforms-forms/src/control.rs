//! Form controls and their validation rules.
//!
//! A [`FormControl`] is one named input of a form. It holds its current
//! value, the options presented by select-like controls, and an ordered list
//! of [`Rule`]s. The binder sets default values and appends inferred rules
//! but never renames or retypes a control.

use std::collections::HashMap;
use std::fmt;

use ormforms_db::value::{contains_key, Value};
use serde::{Deserialize, Serialize};

/// Control option that opts a control out of inferred `required` rules.
pub const NO_REQUIRED: &str = "no_required";

/// The kind of UI element a control renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    /// `<input type="text">`.
    TextInput,
    /// `<textarea>`.
    Textarea,
    /// `<input type="password">`.
    PasswordInput,
    /// `<select>`.
    Select,
    /// `<select multiple>`.
    SelectMultiple,
    /// `<input type="checkbox">`.
    Checkbox,
    /// `<input type="hidden">`.
    Hidden,
    /// `<input type="submit">`.
    Submit,
}

impl ControlKind {
    /// Controls that accept free text and can carry length and format rules.
    pub const fn is_text_like(self) -> bool {
        matches!(self, Self::TextInput | Self::Textarea | Self::PasswordInput)
    }

    /// Controls that present a list of items.
    pub const fn is_select_like(self) -> bool {
        matches!(self, Self::Select | Self::SelectMultiple)
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "text",
            Self::Textarea => "textarea",
            Self::PasswordInput => "password",
            Self::Select => "select",
            Self::SelectMultiple => "multiselect",
            Self::Checkbox => "checkbox",
            Self::Hidden => "hidden",
            Self::Submit => "submit",
        };
        write!(f, "{name}")
    }
}

/// The kind of a validation rule. Rules are deduplicated by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// The value must not be empty.
    Required,
    /// The value may be at most `param` characters long.
    MaxLength,
    /// The value must be at least `param` characters long.
    MinLength,
    /// The value must be an integer.
    Integer,
    /// The value must be an email address.
    Email,
}

impl RuleKind {
    fn default_message(self, param: Option<&Value>) -> String {
        match (self, param) {
            (Self::Required, _) => "This field is required.".to_string(),
            (Self::MaxLength, Some(p)) => {
                format!("Please enter no more than {p} characters.")
            }
            (Self::MinLength, Some(p)) => format!("Please enter at least {p} characters."),
            (Self::MaxLength | Self::MinLength, None) => "Invalid length.".to_string(),
            (Self::Integer, _) => "Please enter a valid integer.".to_string(),
            (Self::Email, _) => "Please enter a valid email address.".to_string(),
        }
    }
}

/// A validation rule attached to a control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// What the rule checks.
    pub kind: RuleKind,
    /// The error message shown when the rule fails.
    pub message: String,
    /// The rule argument (the length bound for length rules).
    pub param: Option<Value>,
}

impl Rule {
    /// Creates a rule with the default message for its kind.
    pub fn new(kind: RuleKind, param: Option<Value>) -> Self {
        let message = kind.default_message(param.as_ref());
        Self {
            kind,
            message,
            param,
        }
    }

    /// Replaces the error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// One named input of a form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormControl {
    name: String,
    kind: ControlKind,
    label: Option<String>,
    value: Option<Value>,
    items: Vec<(Value, String)>,
    rules: Vec<Rule>,
    options: HashMap<String, Value>,
}

impl FormControl {
    /// Creates a control with no value, items, or rules.
    pub fn new(name: impl Into<String>, kind: ControlKind) -> Self {
        Self {
            name: name.into(),
            kind,
            label: None,
            value: None,
            items: Vec::new(),
            rules: Vec::new(),
            options: HashMap::new(),
        }
    }

    /// A text input.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ControlKind::TextInput)
    }

    /// A textarea.
    pub fn textarea(name: impl Into<String>) -> Self {
        Self::new(name, ControlKind::Textarea)
    }

    /// A checkbox.
    pub fn checkbox(name: impl Into<String>) -> Self {
        Self::new(name, ControlKind::Checkbox)
    }

    /// A hidden input.
    pub fn hidden(name: impl Into<String>) -> Self {
        Self::new(name, ControlKind::Hidden)
    }

    /// A select box presenting `items` as (key, caption) pairs.
    pub fn select<K, C>(name: impl Into<String>, items: impl IntoIterator<Item = (K, C)>) -> Self
    where
        K: Into<Value>,
        C: Into<String>,
    {
        Self::new(name, ControlKind::Select).with_items(items)
    }

    /// A multiselect box presenting `items` as (key, caption) pairs.
    pub fn multiselect<K, C>(
        name: impl Into<String>,
        items: impl IntoIterator<Item = (K, C)>,
    ) -> Self
    where
        K: Into<Value>,
        C: Into<String>,
    {
        Self::new(name, ControlKind::SelectMultiple).with_items(items)
    }

    /// A submit button with the given caption.
    pub fn submit(name: impl Into<String>, caption: impl Into<String>) -> Self {
        Self::new(name, ControlKind::Submit).with_label(caption)
    }

    /// Replaces the presented items.
    #[must_use]
    pub fn with_items<K, C>(mut self, items: impl IntoIterator<Item = (K, C)>) -> Self
    where
        K: Into<Value>,
        C: Into<String>,
    {
        self.items = items
            .into_iter()
            .map(|(k, c)| (k.into(), c.into()))
            .collect();
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets an initial value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Appends a rule.
    #[must_use]
    pub fn with_rule(mut self, kind: RuleKind, param: Option<Value>) -> Self {
        self.add_rule(Rule::new(kind, param));
        self
    }

    /// Marks the control as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.set_required();
        self
    }

    /// Sets a control option.
    #[must_use]
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Opts the control out of inferred `required` rules.
    #[must_use]
    pub fn no_required(self) -> Self {
        self.with_option(NO_REQUIRED, true)
    }

    /// The control name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The control kind.
    pub const fn kind(&self) -> ControlKind {
        self.kind
    }

    /// The label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The current value, if one was set.
    pub const fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Whether the control holds a value that is not the none sentinel.
    pub fn has_value(&self) -> bool {
        self.value.as_ref().is_some_and(|v| !v.is_none())
    }

    /// Sets the default value.
    pub fn set_default_value(&mut self, value: impl Into<Value>) {
        self.value = Some(value.into());
    }

    /// The presented (key, caption) pairs.
    pub fn items(&self) -> &[(Value, String)] {
        &self.items
    }

    /// The presented option keys.
    pub fn item_keys(&self) -> Vec<Value> {
        self.items.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Whether `key` is among the presented option keys.
    pub fn has_item(&self, key: &Value) -> bool {
        self.items.iter().any(|(k, _)| k.key_eq(key))
    }

    /// The rules, in the order they were added.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Appends a rule. Caller-declared rules are never replaced.
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Whether a rule of `kind` is attached.
    pub fn has_rule(&self, kind: RuleKind) -> bool {
        self.rules.iter().any(|r| r.kind == kind)
    }

    /// Whether the control is required.
    pub fn is_required(&self) -> bool {
        self.has_rule(RuleKind::Required)
    }

    /// Marks the control as required. Calling it again has no effect.
    pub fn set_required(&mut self) {
        if !self.is_required() {
            self.rules.insert(0, Rule::new(RuleKind::Required, None));
        }
    }

    /// Returns a control option.
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// Whether the control was opted out of inferred `required` rules.
    pub fn is_no_required(&self) -> bool {
        self.option(NO_REQUIRED)
            .is_some_and(|v| v.as_bool().unwrap_or(!v.is_none()))
    }

    /// Keeps the members of `keys` that are presented as items.
    pub(crate) fn presented_subset(&self, keys: &[Value]) -> Vec<Value> {
        let presented = self.item_keys();
        keys.iter()
            .filter(|k| contains_key(&presented, k))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert!(ControlKind::TextInput.is_text_like());
        assert!(ControlKind::Textarea.is_text_like());
        assert!(!ControlKind::Select.is_text_like());
        assert!(!ControlKind::Hidden.is_text_like());
        assert!(ControlKind::SelectMultiple.is_select_like());
        assert!(!ControlKind::Checkbox.is_select_like());
        assert_eq!(ControlKind::SelectMultiple.to_string(), "multiselect");
    }

    #[test]
    fn test_set_required_is_idempotent() {
        let mut control = FormControl::text("name");
        control.set_required();
        control.set_required();
        assert_eq!(control.rules().len(), 1);
        assert!(control.is_required());
    }

    #[test]
    fn test_rule_default_messages() {
        let rule = Rule::new(RuleKind::MaxLength, Some(Value::Int(50)));
        assert_eq!(rule.message, "Please enter no more than 50 characters.");
        let custom = Rule::new(RuleKind::Email, None).with_message("Bad address");
        assert_eq!(custom.message, "Bad address");
    }

    #[test]
    fn test_has_value_ignores_none_sentinel() {
        let mut control = FormControl::text("name");
        assert!(!control.has_value());
        control.set_default_value("");
        assert!(!control.has_value());
        control.set_default_value(0);
        assert!(control.has_value());
    }

    #[test]
    fn test_items_match_string_keys() {
        let control = FormControl::select("author", [(1, "Ann"), (2, "Bob")]);
        assert!(control.has_item(&Value::from("2")));
        assert!(!control.has_item(&Value::Int(3)));
        assert_eq!(
            control.presented_subset(&[Value::Int(2), Value::Int(3)]),
            vec![Value::Int(2)]
        );
    }

    #[test]
    fn test_no_required_marker() {
        assert!(FormControl::text("a").no_required().is_no_required());
        assert!(!FormControl::text("a").is_no_required());
        assert!(!FormControl::text("a")
            .with_option(NO_REQUIRED, false)
            .is_no_required());
    }
}
