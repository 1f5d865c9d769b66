//! Column and relation metadata supplied by the persistence layer.
//!
//! A [`FieldMapping`] describes one mapped column (type, length,
//! nullability); a [`RelationMapping`] describes one association to another
//! entity type. Both are read-only from the point of view of a form.

use std::collections::{BTreeMap, HashMap};

use ormforms_core::{FormsError, FormsResult};

/// The scalar type of a mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Bounded string (`VARCHAR`).
    String,
    /// Unbounded text.
    Text,
    /// 16-bit integer.
    SmallInt,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInt,
    /// Boolean.
    Boolean,
    /// Floating-point number.
    Float,
    /// Fixed-precision decimal.
    Decimal,
    /// Date without time.
    Date,
    /// Date and time.
    DateTime,
    /// UUID.
    Uuid,
    /// JSON document.
    Json,
}

impl ColumnType {
    /// `true` for string and text columns.
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::String | Self::Text)
    }

    /// `true` only for the plain `integer` column type.
    ///
    /// Small and big integers are deliberately excluded: the integer-format
    /// rule is inferred for `integer` columns alone.
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Integer)
    }
}

/// Metadata for one mapped column.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldMapping {
    /// The property name.
    pub name: String,
    /// The column type.
    pub column_type: ColumnType,
    /// Maximum length for string columns.
    pub length: Option<usize>,
    /// Whether NULL is allowed.
    pub nullable: bool,
}

impl FieldMapping {
    /// Creates a non-nullable mapping without a length bound.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            length: None,
            nullable: false,
        }
    }

    /// Sets the maximum length.
    #[must_use]
    pub const fn length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Marks the column as nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Whether a relation points at one related record or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Many-to-one or one-to-one.
    Single,
    /// One-to-many or many-to-many.
    Collection,
}

/// Metadata for one association.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RelationMapping {
    /// The relation (property) name on the owning entity.
    pub name: String,
    /// The target entity type.
    pub target: String,
    /// Single-valued or collection-valued.
    pub cardinality: Cardinality,
    /// Join columns on the owning table. Empty for inverse sides.
    pub join_columns: Vec<String>,
}

impl RelationMapping {
    /// A single-valued relation joined through one column.
    pub fn single(
        name: impl Into<String>,
        target: impl Into<String>,
        join_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::Single,
            join_columns: vec![join_column.into()],
        }
    }

    /// A collection-valued relation.
    pub fn collection(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::Collection,
            join_columns: Vec::new(),
        }
    }

    /// Replaces the join columns.
    #[must_use]
    pub fn join_columns(mut self, columns: Vec<String>) -> Self {
        self.join_columns = columns;
        self
    }

    /// The join column if this relation is single-valued and joined through
    /// exactly one column.
    pub fn single_join_column(&self) -> Option<&str> {
        match (self.cardinality, self.join_columns.as_slice()) {
            (Cardinality::Single, [column]) => Some(column.as_str()),
            _ => None,
        }
    }
}

/// Relation mappings keyed by relation name.
pub type RelationMap = BTreeMap<String, RelationMapping>;

/// Relation name to join column, for every relation eagerly joined on load.
pub type RelationJoinMap = BTreeMap<String, String>;

/// Builds the join map for the relations that qualify for eager joining.
pub fn join_map(relations: &RelationMap) -> RelationJoinMap {
    relations
        .iter()
        .filter_map(|(name, relation)| {
            relation
                .single_join_column()
                .map(|column| (name.clone(), column.to_string()))
        })
        .collect()
}

/// Anything that can answer column-metadata lookups by field name.
pub trait FieldMappingSource {
    /// Returns the mapping for `name`, or [`FormsError::UnmappedField`].
    fn field_mapping(&self, name: &str) -> FormsResult<FieldMapping>;
}

impl FieldMappingSource for HashMap<String, FieldMapping> {
    fn field_mapping(&self, name: &str) -> FormsResult<FieldMapping> {
        self.get(name).cloned().ok_or_else(|| unmapped("-", name))
    }
}

impl FieldMappingSource for BTreeMap<String, FieldMapping> {
    fn field_mapping(&self, name: &str) -> FormsResult<FieldMapping> {
        self.get(name).cloned().ok_or_else(|| unmapped("-", name))
    }
}

pub(crate) fn unmapped(entity_type: &str, field: &str) -> FormsError {
    FormsError::UnmappedField {
        entity_type: entity_type.to_string(),
        field: field.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_classes() {
        assert!(ColumnType::String.is_textual());
        assert!(ColumnType::Text.is_textual());
        assert!(!ColumnType::Integer.is_textual());
        assert!(ColumnType::Integer.is_integer());
        assert!(!ColumnType::BigInt.is_integer());
    }

    #[test]
    fn test_field_mapping_builder() {
        let m = FieldMapping::new("title", ColumnType::String).length(50).nullable();
        assert_eq!(m.length, Some(50));
        assert!(m.nullable);
    }

    #[test]
    fn test_single_join_column() {
        let author = RelationMapping::single("author", "user", "author_id");
        assert_eq!(author.single_join_column(), Some("author_id"));

        let tags = RelationMapping::collection("tags", "tag");
        assert_eq!(tags.single_join_column(), None);

        let composite = RelationMapping::single("owner", "account", "owner_a")
            .join_columns(vec!["owner_a".into(), "owner_b".into()]);
        assert_eq!(composite.single_join_column(), None);
    }

    #[test]
    fn test_join_map_keeps_single_column_relations() {
        let mut relations = RelationMap::new();
        relations.insert(
            "author".into(),
            RelationMapping::single("author", "user", "author_id"),
        );
        relations.insert("tags".into(), RelationMapping::collection("tags", "tag"));
        let joins = join_map(&relations);
        assert_eq!(joins.len(), 1);
        assert_eq!(joins.get("author").map(String::as_str), Some("author_id"));
    }

    #[test]
    fn test_mapping_source_for_map() {
        let mut fields = HashMap::new();
        fields.insert(
            "title".to_string(),
            FieldMapping::new("title", ColumnType::String),
        );
        assert!(fields.field_mapping("title").is_ok());
        let err = fields.field_mapping("missing").unwrap_err();
        assert!(err.is_configuration_condition());
    }
}
