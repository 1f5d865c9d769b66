//! Validation-rule inference from column metadata.
//!
//! [`annotate`] looks each top-level control up by name in a
//! [`FieldMappingSource`] and attaches the rules the column implies:
//!
//! | Column | Control | Rule |
//! |---|---|---|
//! | string/text with a length | text-like | `MaxLength(length)` |
//! | integer | text-like | `Integer` |
//! | not nullable | text-like or select-like | `Required` |
//!
//! Inference only adds. A rule of the same kind that is already present
//! (declared by the caller or inferred earlier) is left alone, so running
//! `annotate` again changes nothing. Controls marked with
//! [`NO_REQUIRED`](crate::control::NO_REQUIRED) never become required.

use ormforms_db::mapping::{FieldMapping, FieldMappingSource};
use ormforms_db::value::Value;

use crate::control::{FormControl, Rule, RuleKind};
use crate::form::Form;

/// Attaches the rules implied by column metadata to the form's top-level
/// controls. Returns the number of rules added.
pub fn annotate<M>(form: &mut Form, mappings: &M) -> usize
where
    M: FieldMappingSource + ?Sized,
{
    let mut added = 0;
    for control in form.top_level_controls_mut() {
        match mappings.field_mapping(control.name()) {
            Ok(mapping) => {
                added += annotate_control(control, &mapping);
            }
            Err(e) => {
                tracing::debug!(control = control.name(), error = %e, "no column metadata, skipping");
            }
        }
    }
    added
}

fn annotate_control(control: &mut FormControl, mapping: &FieldMapping) -> usize {
    let kind = control.kind();
    let mut added = 0;

    if let Some(length) = mapping.length {
        if mapping.column_type.is_textual()
            && kind.is_text_like()
            && !control.has_rule(RuleKind::MaxLength)
        {
            let bound = i64::try_from(length).unwrap_or(i64::MAX);
            control.add_rule(Rule::new(RuleKind::MaxLength, Some(Value::Int(bound))));
            added += 1;
        }
    }

    if mapping.column_type.is_integer()
        && kind.is_text_like()
        && !control.has_rule(RuleKind::Integer)
    {
        control.add_rule(Rule::new(RuleKind::Integer, None));
        added += 1;
    }

    if !mapping.nullable
        && (kind.is_text_like() || kind.is_select_like())
        && !control.is_required()
        && !control.is_no_required()
    {
        control.set_required();
        added += 1;
    }

    added
}
