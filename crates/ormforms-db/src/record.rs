//! A dynamic, map-backed [`Entity`].
//!
//! [`Record`] suits entity types that are only known at runtime (schemas
//! loaded from configuration) and is what the in-memory persistence layer
//! stores. Typed structs implementing [`Entity`] by hand work the same way.

use std::collections::BTreeMap;
use std::sync::Arc;

use ormforms_core::FormsResult;

use crate::entity::{unsupported, Entity, EntityCapabilities, FieldValue, Property, Related};
use crate::value::Value;

/// A dynamic entity holding its properties in a map.
#[derive(Debug, Clone)]
pub struct Record {
    entity_type: String,
    id: Option<Value>,
    properties: BTreeMap<String, Property>,
    capabilities: Arc<EntityCapabilities>,
}

impl Record {
    /// Creates an unsaved record of `entity_type` with the given capabilities.
    pub fn new(entity_type: impl Into<String>, capabilities: Arc<EntityCapabilities>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: None,
            properties: BTreeMap::new(),
            capabilities,
        }
    }

    /// Sets the primary key.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets a property.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, property: Property) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    /// Sets a scalar property.
    #[must_use]
    pub fn with_value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(name, Property::Scalar(value.into()))
    }

    /// Returns the scalar value of `name`, if it is a scalar property.
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.properties.get(name) {
            Some(Property::Scalar(v)) => Some(v),
            _ => None,
        }
    }

    fn write(&mut self, name: &str, value: FieldValue) {
        let current = self.properties.get(name);
        let property = match (current, value) {
            (_, FieldValue::Entity(e)) => {
                Property::Reference(e.and_then(|e| e.id()).unwrap_or(Value::Null))
            }
            (_, FieldValue::Entities(es)) => {
                Property::Collection(es.iter().filter_map(|e| e.id()).collect())
            }
            (Some(Property::Reference(_)), FieldValue::Value(v)) => Property::Reference(v),
            (Some(Property::Collection(_)), FieldValue::Value(Value::List(keys))) => {
                Property::Collection(keys)
            }
            (Some(Property::Scalar(Value::Bool(_))), FieldValue::Value(v)) => {
                Property::Scalar(as_flag(v))
            }
            (_, FieldValue::Value(v)) => Property::Scalar(v),
        };
        self.properties.insert(name.to_string(), property);
    }

    fn link(&mut self, relation: &str, key: Value) {
        match self.properties.get_mut(relation) {
            Some(Property::Collection(keys)) => {
                if !keys.iter().any(|k| k.key_eq(&key)) {
                    keys.push(key);
                }
            }
            _ => {
                self.properties
                    .insert(relation.to_string(), Property::Reference(key));
            }
        }
    }
}

/// Submitted checkbox values arrive as `1`/`0` or their string forms.
fn as_flag(value: Value) -> Value {
    match value {
        Value::Int(n) => Value::Bool(n != 0),
        Value::String(s) => Value::Bool(matches!(s.trim(), "1" | "true" | "on")),
        Value::Null => Value::Bool(false),
        other => other,
    }
}

impl Entity for Record {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn id(&self) -> Option<Value> {
        self.id.clone()
    }

    fn set_id(&mut self, id: Value) {
        self.id = Some(id).filter(|id| !id.is_none());
    }

    fn capabilities(&self) -> &EntityCapabilities {
        &self.capabilities
    }

    fn get(&self, name: &str) -> Option<Property> {
        if name == "id" {
            return Some(Property::Scalar(self.id.clone().unwrap_or(Value::Null)));
        }
        self.properties.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: FieldValue) -> FormsResult<()> {
        if !self.capabilities.has_setter(name) {
            return Err(unsupported(&self.entity_type, "set", name));
        }
        self.write(name, value);
        Ok(())
    }

    fn assign(&mut self, name: &str, value: FieldValue) -> FormsResult<()> {
        if !self.capabilities.has_property(name) {
            return Err(unsupported(&self.entity_type, "assign", name));
        }
        self.write(name, value);
        Ok(())
    }

    fn add(&mut self, relation: &str, related: Related) -> FormsResult<()> {
        if !self.capabilities.has_adder(relation) {
            return Err(unsupported(&self.entity_type, "add", relation));
        }
        match related {
            Related::One(entity) => {
                if let Some(key) = entity.id() {
                    self.link(relation, key);
                }
            }
            Related::Many(entities) => {
                for key in entities.iter().filter_map(|e| e.id()) {
                    self.link(relation, key);
                }
            }
        }
        Ok(())
    }

    fn boxed_clone(&self) -> Box<dyn Entity> {
        Box::new(self.clone())
    }
}
