//! The entity capability protocol.
//!
//! Any persisted record a form can bind to implements [`Entity`]. Instead of
//! probing for `get*`/`set*`/`add*` methods at runtime, each entity type
//! declares what it supports once, in an [`EntityCapabilities`] value, and
//! the binder consults that declaration before dispatching.
//!
//! # Examples
//!
//! ```
//! use std::sync::LazyLock;
//! use ormforms_db::entity::{Entity, EntityCapabilities, FieldValue, Property};
//! use ormforms_db::value::Value;
//! use ormforms_core::FormsResult;
//!
//! static CAPS: LazyLock<EntityCapabilities> = LazyLock::new(|| {
//!     EntityCapabilities::new().property("id").property("name").setter("name")
//! });
//!
//! #[derive(Debug, Clone, Default)]
//! struct Tag { id: Option<i64>, name: String }
//!
//! impl Entity for Tag {
//!     fn entity_type(&self) -> &str { "tag" }
//!     fn id(&self) -> Option<Value> { self.id.map(Value::Int) }
//!     fn set_id(&mut self, id: Value) { self.id = id.as_int(); }
//!     fn capabilities(&self) -> &EntityCapabilities { &CAPS }
//!     fn get(&self, name: &str) -> Option<Property> {
//!         match name {
//!             "id" => Some(Property::Scalar(self.id.into())),
//!             "name" => Some(Property::Scalar(self.name.clone().into())),
//!             _ => None,
//!         }
//!     }
//!     fn set(&mut self, name: &str, value: FieldValue) -> FormsResult<()> {
//!         if let ("name", FieldValue::Value(Value::String(s))) = (name, value) {
//!             self.name = s;
//!         }
//!         Ok(())
//!     }
//!     fn boxed_clone(&self) -> Box<dyn Entity> { Box::new(self.clone()) }
//! }
//!
//! let tag = Tag { id: Some(1), name: "rust".into() };
//! assert!(tag.capabilities().has_setter("name"));
//! assert!(!tag.capabilities().has_adder("name"));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ormforms_core::{FormsError, FormsResult};

use crate::value::Value;

/// A property value as read from an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// A plain column value (string, number, boolean, date, ...).
    Scalar(Value),
    /// An eagerly joined related row, exposed as column name to value.
    Joined(BTreeMap<String, Value>),
    /// A reference to one related entity, held by its key. `Null` when unset.
    Reference(Value),
    /// A read-only collection of related entities, held by their keys.
    Collection(Vec<Value>),
}

/// A value written onto an entity by the binder.
#[derive(Debug)]
pub enum FieldValue {
    /// A plain submitted value.
    Value(Value),
    /// A resolved related entity, or `None` when the key matched no row.
    Entity(Option<Box<dyn Entity>>),
    /// A batch of resolved related entities.
    Entities(Vec<Box<dyn Entity>>),
}

/// Related records handed to an `add` mutator.
#[derive(Debug)]
pub enum Related {
    /// One related record.
    One(Box<dyn Entity>),
    /// A batch of related records resolved in a single lookup.
    Many(Vec<Box<dyn Entity>>),
}

/// The capabilities an entity type declares.
///
/// * `properties` - names readable through [`Entity::get`] and writable through
///   [`Entity::assign`]
/// * `setters` - names with a dedicated setter, dispatched through [`Entity::set`]
/// * `adders` - relations with an add mutator, dispatched through [`Entity::add`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityCapabilities {
    properties: BTreeSet<String>,
    setters: BTreeSet<String>,
    adders: BTreeSet<String>,
}

impl EntityCapabilities {
    /// Creates an empty capability set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a readable, directly assignable property.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.properties.insert(name.into());
        self
    }

    /// Declares several properties at once.
    #[must_use]
    pub fn properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties.extend(names.into_iter().map(Into::into));
        self
    }

    /// Declares a setter mutator.
    #[must_use]
    pub fn setter(mut self, name: impl Into<String>) -> Self {
        self.setters.insert(name.into());
        self
    }

    /// Declares an add mutator for a relation.
    #[must_use]
    pub fn adder(mut self, relation: impl Into<String>) -> Self {
        self.adders.insert(relation.into());
        self
    }

    /// Whether `name` is a declared property.
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains(name)
    }

    /// Whether `name` has a setter.
    pub fn has_setter(&self, name: &str) -> bool {
        self.setters.contains(name)
    }

    /// Whether `relation` has an add mutator.
    pub fn has_adder(&self, relation: &str) -> bool {
        self.adders.contains(relation)
    }
}

/// A persisted domain record a form can bind to.
///
/// Only `entity_type`, `id`, `set_id`, `capabilities`, `get`, and
/// `boxed_clone` are required. The mutators default to
/// [`FormsError::UnsupportedMutation`]; implement those declared in
/// [`Entity::capabilities`].
pub trait Entity: Send + Sync + fmt::Debug {
    /// The entity type name the persistence layer knows this entity by.
    fn entity_type(&self) -> &str;

    /// The primary key, or `None` for an unsaved instance.
    fn id(&self) -> Option<Value>;

    /// Assigns the primary key (used by the persistence layer on insert).
    /// `Value::Null` clears it.
    fn set_id(&mut self, id: Value);

    /// The capabilities declared for this entity type.
    fn capabilities(&self) -> &EntityCapabilities;

    /// Reads a property. `None` means the entity has no such property.
    fn get(&self, name: &str) -> Option<Property>;

    /// Invokes the setter for `name`.
    fn set(&mut self, name: &str, value: FieldValue) -> FormsResult<()> {
        let _ = value;
        Err(unsupported(self.entity_type(), "set", name))
    }

    /// Writes the raw property `name`, bypassing any setter.
    fn assign(&mut self, name: &str, value: FieldValue) -> FormsResult<()> {
        let _ = value;
        Err(unsupported(self.entity_type(), "assign", name))
    }

    /// Invokes the add mutator for `relation`.
    fn add(&mut self, relation: &str, related: Related) -> FormsResult<()> {
        let _ = related;
        Err(unsupported(self.entity_type(), "add", relation))
    }

    /// Clones this entity into a new box.
    fn boxed_clone(&self) -> Box<dyn Entity>;
}

impl Clone for Box<dyn Entity> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// Builds the error returned by the default mutator implementations.
pub fn unsupported(entity_type: &str, operation: &'static str, field: &str) -> FormsError {
    FormsError::UnsupportedMutation {
        entity_type: entity_type.to_string(),
        operation,
        field: field.to_string(),
    }
}
