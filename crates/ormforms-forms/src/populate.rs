//! Default-value population from a bound entity.
//!
//! Every control in the form tree whose name matches an entity property and
//! that holds no value yet receives a default derived from that property.
//! Values supplied by the caller always win.

use ormforms_db::entity::{Entity, Property};
use ormforms_db::mapping::RelationJoinMap;
use ormforms_db::value::Value;

use crate::control::{ControlKind, FormControl};
use crate::form::Form;

/// Fills empty controls from `entity`. Returns the number of controls set.
///
/// `joins` is the relation join map returned by
/// [`EntityBinder::load`](crate::binder::EntityBinder::load).
pub fn populate_defaults(form: &mut Form, entity: &dyn Entity, joins: &RelationJoinMap) -> usize {
    let mut populated = 0;
    for control in form.controls_mut() {
        if control.has_value() {
            continue;
        }
        let Some(property) = entity.get(control.name()) else {
            continue;
        };
        if let Some(value) = default_for(control, property, joins) {
            control.set_default_value(value);
            populated += 1;
        }
    }
    populated
}

fn default_for(control: &FormControl, property: Property, joins: &RelationJoinMap) -> Option<Value> {
    let name = control.name();
    match property {
        Property::Scalar(Value::Bool(b)) => Some(Value::Int(i64::from(b))),
        Property::Scalar(value) if value.is_scalar() => Some(value),
        Property::Scalar(_) => None,
        Property::Joined(row) => {
            let joined = joins.contains_key(name) || joins.values().any(|column| column == name);
            if !joined {
                return None;
            }
            row.get("id").filter(|id| !id.is_null()).cloned()
        }
        Property::Collection(keys) if control.kind() == ControlKind::SelectMultiple => {
            Some(Value::List(control.presented_subset(&keys)))
        }
        Property::Collection(_) => None,
        Property::Reference(key) => {
            if key.is_null() {
                return None;
            }
            if control.kind().is_select_like() && !control.has_item(&key) {
                tracing::debug!(control = name, key = %key, "referenced key not presented, skipping");
                return None;
            }
            Some(key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormforms_db::entity::EntityCapabilities;
    use ormforms_db::record::Record;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn article() -> Record {
        let caps = Arc::new(EntityCapabilities::new());
        Record::new("article", caps)
            .with_id(7)
            .with_value("title", "Hello")
            .with_value("views", 12_i64)
            .with_value("published", true)
            .with_value("summary", Value::Null)
            .with("author", Property::Reference(Value::Int(3)))
            .with("tags", Property::Collection(vec![Value::Int(2), Value::Int(3)]))
            .with(
                "category",
                Property::Joined(BTreeMap::from([
                    ("id".to_string(), Value::Int(9)),
                    ("name".to_string(), Value::from("News")),
                ])),
            )
    }

    fn joins() -> RelationJoinMap {
        BTreeMap::from([("category".to_string(), "category_id".to_string())])
    }

    #[test]
    fn test_scalars_and_booleans() {
        let mut form = Form::new("article");
        form.add(FormControl::text("title"))
            .add(FormControl::text("views"))
            .add(FormControl::checkbox("published"))
            .add(FormControl::text("summary"))
            .add(FormControl::hidden("id"));
        populate_defaults(&mut form, &article(), &joins());

        let value = |n: &str| form.control(n).unwrap().value().cloned();
        assert_eq!(value("title"), Some(Value::from("Hello")));
        assert_eq!(value("views"), Some(Value::Int(12)));
        assert_eq!(value("published"), Some(Value::Int(1)));
        assert_eq!(value("summary"), None);
        assert_eq!(value("id"), Some(Value::Int(7)));
    }

    #[test]
    fn test_caller_value_wins() {
        let mut form = Form::new("article");
        form.add(FormControl::text("title").with_value("Preset"));
        assert_eq!(populate_defaults(&mut form, &article(), &joins()), 0);
        assert_eq!(
            form.control("title").unwrap().value(),
            Some(&Value::from("Preset"))
        );
    }

    #[test]
    fn test_multiselect_drops_members_not_presented() {
        let mut form = Form::new("article");
        form.add(FormControl::multiselect("tags", [(1, "a"), (2, "b")]));
        populate_defaults(&mut form, &article(), &joins());
        assert_eq!(
            form.control("tags").unwrap().value(),
            Some(&Value::List(vec![Value::Int(2)]))
        );
    }

    #[test]
    fn test_reference_guarded_by_items() {
        let mut form = Form::new("article");
        form.add(FormControl::select("author", [(1, "Ann"), (2, "Bob")]));
        populate_defaults(&mut form, &article(), &joins());
        assert_eq!(form.control("author").unwrap().value(), None);

        let mut form = Form::new("article");
        form.add(FormControl::select("author", [(3, "Cid")]));
        populate_defaults(&mut form, &article(), &joins());
        assert_eq!(form.control("author").unwrap().value(), Some(&Value::Int(3)));
    }

    #[test]
    fn test_reference_on_plain_control_sets_key() {
        let mut form = Form::new("article");
        form.add(FormControl::hidden("author"));
        populate_defaults(&mut form, &article(), &joins());
        assert_eq!(form.control("author").unwrap().value(), Some(&Value::Int(3)));
    }

    #[test]
    fn test_joined_row_requires_join_map_entry() {
        let mut form = Form::new("article");
        form.add(FormControl::select("category", [(9, "News")]));
        populate_defaults(&mut form, &article(), &joins());
        assert_eq!(form.control("category").unwrap().value(), Some(&Value::Int(9)));

        let mut form = Form::new("article");
        form.add(FormControl::select("category", [(9, "News")]));
        populate_defaults(&mut form, &article(), &RelationJoinMap::new());
        assert_eq!(form.control("category").unwrap().value(), None);
    }

    #[test]
    fn test_nested_controls_are_populated() {
        let mut form = Form::new("article");
        form.add_group(
            "main",
            vec![crate::form::Component::Control(FormControl::text("title"))],
        );
        assert_eq!(populate_defaults(&mut form, &article(), &joins()), 1);
        assert_eq!(
            form.control("title").unwrap().value(),
            Some(&Value::from("Hello"))
        );
    }
}
