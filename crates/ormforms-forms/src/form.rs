//! The form surface: a tree of named controls.
//!
//! A [`Form`] holds top-level [`Component`]s; groups nest further
//! components. Rule inference looks at top-level controls only, while
//! default population and validation walk the whole tree.
//!
//! Validation mirrors the accumulate-don't-short-circuit behaviour of the
//! field cleaning pipeline: every control is checked and all messages are
//! reported at once.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use ormforms_db::value::Value;
use regex::Regex;

use crate::control::{ControlKind, FormControl, Rule, RuleKind};

/// Submitted (or current) values keyed by control name.
pub type FormValues = BTreeMap<String, Value>;

/// Validation messages keyed by control name.
pub type FormErrors = BTreeMap<String, Vec<String>>;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

/// A node of the form tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    /// A single control.
    Control(FormControl),
    /// A named container of further components.
    Group {
        /// The group name.
        name: String,
        /// The nested components.
        children: Vec<Component>,
    },
}

impl Component {
    /// The component name.
    pub fn name(&self) -> &str {
        match self {
            Self::Control(c) => c.name(),
            Self::Group { name, .. } => name,
        }
    }
}

/// A named tree of controls.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Form {
    name: String,
    components: Vec<Component>,
}

impl Form {
    /// Creates an empty form.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
        }
    }

    /// The form name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a top-level control.
    pub fn add(&mut self, control: FormControl) -> &mut Self {
        self.components.push(Component::Control(control));
        self
    }

    /// Appends a group of components.
    pub fn add_group(&mut self, name: impl Into<String>, children: Vec<Component>) -> &mut Self {
        self.components.push(Component::Group {
            name: name.into(),
            children,
        });
        self
    }

    /// Appends a hidden control holding `value`.
    pub fn add_hidden(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.add(FormControl::hidden(name).with_value(value))
    }

    /// Appends a submit button.
    pub fn add_submit(&mut self, name: impl Into<String>, caption: impl Into<String>) -> &mut Self {
        self.add(FormControl::submit(name, caption))
    }

    /// The top-level components.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Whether a top-level component is named `name`.
    pub fn has_component(&self, name: &str) -> bool {
        self.components.iter().any(|c| c.name() == name)
    }

    /// Whether a top-level submit button exists.
    pub fn has_submit(&self) -> bool {
        self.top_level_controls()
            .any(|c| c.kind() == ControlKind::Submit)
    }

    /// The top-level controls, skipping groups.
    pub fn top_level_controls(&self) -> impl Iterator<Item = &FormControl> {
        self.components.iter().filter_map(|c| match c {
            Component::Control(control) => Some(control),
            Component::Group { .. } => None,
        })
    }

    /// Mutable access to the top-level controls.
    pub fn top_level_controls_mut(&mut self) -> impl Iterator<Item = &mut FormControl> {
        self.components.iter_mut().filter_map(|c| match c {
            Component::Control(control) => Some(control),
            Component::Group { .. } => None,
        })
    }

    /// Every control in the tree, depth first. Groups themselves are skipped.
    pub fn controls(&self) -> Vec<&FormControl> {
        fn walk<'a>(components: &'a [Component], out: &mut Vec<&'a FormControl>) {
            for component in components {
                match component {
                    Component::Control(control) => out.push(control),
                    Component::Group { children, .. } => walk(children, out),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.components, &mut out);
        out
    }

    /// Mutable access to every control in the tree, depth first.
    pub fn controls_mut(&mut self) -> Vec<&mut FormControl> {
        fn walk<'a>(components: &'a mut [Component], out: &mut Vec<&'a mut FormControl>) {
            for component in components {
                match component {
                    Component::Control(control) => out.push(control),
                    Component::Group { children, .. } => walk(children, out),
                }
            }
        }
        let mut out = Vec::new();
        walk(&mut self.components, &mut out);
        out
    }

    /// Finds a control anywhere in the tree.
    pub fn control(&self, name: &str) -> Option<&FormControl> {
        self.controls().into_iter().find(|c| c.name() == name)
    }

    /// Finds a control anywhere in the tree, mutably.
    pub fn control_mut(&mut self, name: &str) -> Option<&mut FormControl> {
        self.controls_mut().into_iter().find(|c| c.name() == name)
    }

    /// The current values of all non-submit controls. Unset controls map to `Null`.
    pub fn values(&self) -> FormValues {
        self.controls()
            .into_iter()
            .filter(|c| c.kind() != ControlKind::Submit)
            .map(|c| {
                (
                    c.name().to_string(),
                    c.value().cloned().unwrap_or(Value::Null),
                )
            })
            .collect()
    }

    /// Checks `values` against the rules of every control.
    ///
    /// Errors accumulate across controls. A missing required value reports
    /// only the required message for that control.
    pub fn validate(&self, values: &FormValues) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        for control in self.controls() {
            if control.kind() == ControlKind::Submit {
                continue;
            }
            let messages = check_control(control, values.get(control.name()));
            if !messages.is_empty() {
                errors.insert(control.name().to_string(), messages);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_control(control: &FormControl, value: Option<&Value>) -> Vec<String> {
    let value = value.filter(|v| !v.is_none());
    let Some(value) = value else {
        return control
            .rules()
            .iter()
            .filter(|r| r.kind == RuleKind::Required)
            .take(1)
            .map(|r| r.message.clone())
            .collect();
    };

    control
        .rules()
        .iter()
        .filter(|rule| !passes(rule, value))
        .map(|rule| rule.message.clone())
        .collect()
}

fn passes(rule: &Rule, value: &Value) -> bool {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let bound = rule
        .param
        .as_ref()
        .and_then(|p| match p {
            Value::Int(n) => usize::try_from(*n).ok(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });

    match rule.kind {
        RuleKind::Required => true,
        RuleKind::MaxLength => bound.map_or(true, |max| text.chars().count() <= max),
        RuleKind::MinLength => bound.map_or(true, |min| text.chars().count() >= min),
        RuleKind::Integer => match value {
            Value::Int(_) => true,
            Value::String(s) => s.trim().parse::<i64>().is_ok(),
            _ => false,
        },
        RuleKind::Email => EMAIL_RE.is_match(&text),
    }
}
