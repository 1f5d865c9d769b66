//! An in-memory persistence layer.
//!
//! [`MemoryPersistence`] keeps rows per entity type in memory, stages
//! persisted entities until `flush`, and discards staged writes on
//! `rollback`. Repositories count their lookups, and a flush can be made to
//! fail, which makes the layer suitable for exercising binders in tests.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use ormforms_db::memory::{EntitySchema, MemoryPersistence};
//! use ormforms_db::mapping::{ColumnType, FieldMapping};
//! use ormforms_db::entity::EntityCapabilities;
//! use ormforms_db::record::Record;
//!
//! let caps = Arc::new(EntityCapabilities::new().property("name").setter("name"));
//! let layer = MemoryPersistence::new().register(
//!     EntitySchema::new(Record::new("tag", caps))
//!         .field(FieldMapping::new("name", ColumnType::String).length(32)),
//! );
//! assert!(layer.memory_repository("tag").is_some());
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ormforms_core::{FormsError, FormsResult};
use tokio::sync::Mutex;

use crate::entity::Entity;
use crate::mapping::{unmapped, FieldMapping, FieldMappingSource, RelationMap, RelationMapping};
use crate::persistence::{PersistenceLayer, Repository};
use crate::value::Value;

/// Everything the memory layer needs to know about one entity type.
#[derive(Debug)]
pub struct EntitySchema {
    prototype: Box<dyn Entity>,
    fields: BTreeMap<String, FieldMapping>,
    relations: RelationMap,
}

impl EntitySchema {
    /// Creates a schema whose new instances are clones of `prototype`.
    pub fn new(prototype: impl Entity + 'static) -> Self {
        Self {
            prototype: Box::new(prototype),
            fields: BTreeMap::new(),
            relations: RelationMap::new(),
        }
    }

    /// Adds a column mapping.
    #[must_use]
    pub fn field(mut self, mapping: FieldMapping) -> Self {
        self.fields.insert(mapping.name.clone(), mapping);
        self
    }

    /// Adds a relation mapping.
    #[must_use]
    pub fn relation(mut self, mapping: RelationMapping) -> Self {
        self.relations.insert(mapping.name.clone(), mapping);
        self
    }

    /// The entity type name, taken from the prototype.
    pub fn entity_type(&self) -> &str {
        self.prototype.entity_type()
    }
}

/// Lookup counters of a [`MemoryRepository`].
#[derive(Debug, Default)]
pub struct LookupStats {
    find: AtomicUsize,
    find_many: AtomicUsize,
}

impl LookupStats {
    /// Number of single-key lookups (`find` and `find_joined`).
    pub fn find_calls(&self) -> usize {
        self.find.load(Ordering::SeqCst)
    }

    /// Number of batch lookups.
    pub fn find_many_calls(&self) -> usize {
        self.find_many.load(Ordering::SeqCst)
    }

    /// Total number of lookups.
    pub fn total(&self) -> usize {
        self.find_calls() + self.find_many_calls()
    }
}

/// The rows of one entity type.
#[derive(Debug)]
pub struct MemoryRepository {
    schema: EntitySchema,
    rows: Mutex<Vec<Box<dyn Entity>>>,
    next_id: AtomicI64,
    stats: LookupStats,
    last_joins: Mutex<Vec<String>>,
}

impl MemoryRepository {
    fn new(schema: EntitySchema) -> Self {
        Self {
            schema,
            rows: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            stats: LookupStats::default(),
            last_joins: Mutex::new(Vec::new()),
        }
    }

    /// Lookup counters.
    pub const fn stats(&self) -> &LookupStats {
        &self.stats
    }

    /// The relations joined by the most recent `find_joined` call.
    pub async fn last_joins(&self) -> Vec<String> {
        self.last_joins.lock().await.clone()
    }

    /// Returns a copy of the stored row with `key`, without counting a lookup.
    pub async fn snapshot(&self, key: &Value) -> Option<Box<dyn Entity>> {
        self.rows
            .lock()
            .await
            .iter()
            .find(|row| row.id().is_some_and(|id| id.key_eq(key)))
            .cloned()
    }

    /// Number of stored rows.
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    /// Whether no rows are stored.
    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }

    fn allocate_id(&self) -> Value {
        Value::Int(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Inserts or replaces a row, allocating a key if it has none.
    async fn upsert(&self, mut entity: Box<dyn Entity>) -> Value {
        let key = match entity.id().filter(|key| !key.is_none()) {
            Some(key) => {
                if let Some(n) = key.as_int() {
                    self.next_id.fetch_max(n.saturating_add(1), Ordering::SeqCst);
                }
                key
            }
            None => {
                let key = self.allocate_id();
                entity.set_id(key.clone());
                key
            }
        };
        let mut rows = self.rows.lock().await;
        if let Some(slot) = rows
            .iter_mut()
            .find(|row| row.id().is_some_and(|id| id.key_eq(&key)))
        {
            *slot = entity;
        } else {
            rows.push(entity);
        }
        key
    }
}

impl FieldMappingSource for MemoryRepository {
    fn field_mapping(&self, name: &str) -> FormsResult<FieldMapping> {
        self.schema
            .fields
            .get(name)
            .cloned()
            .ok_or_else(|| unmapped(self.schema.entity_type(), name))
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    fn entity_type(&self) -> &str {
        self.schema.entity_type()
    }

    fn create(&self) -> Box<dyn Entity> {
        self.schema.prototype.clone()
    }

    async fn find(&self, key: &Value) -> FormsResult<Option<Box<dyn Entity>>> {
        self.stats.find.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot(key).await)
    }

    async fn find_joined(
        &self,
        key: &Value,
        joins: &[String],
    ) -> FormsResult<Option<Box<dyn Entity>>> {
        *self.last_joins.lock().await = joins.to_vec();
        self.find(key).await
    }

    async fn find_many(&self, keys: &[Value]) -> FormsResult<Vec<Box<dyn Entity>>> {
        self.stats.find_many.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|row| {
                row.id()
                    .is_some_and(|id| keys.iter().any(|k| k.key_eq(&id)))
            })
            .cloned()
            .collect())
    }

    fn relation_mappings(&self) -> &RelationMap {
        &self.schema.relations
    }
}

/// An in-memory [`PersistenceLayer`].
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    repositories: HashMap<String, Arc<MemoryRepository>>,
    staged: Mutex<Vec<Box<dyn Entity>>>,
    fail_next_flush: AtomicBool,
    flushes: AtomicUsize,
}

impl MemoryPersistence {
    /// Creates a layer with no registered entity types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity type.
    #[must_use]
    pub fn register(mut self, schema: EntitySchema) -> Self {
        let name = schema.entity_type().to_string();
        self.repositories
            .insert(name, Arc::new(MemoryRepository::new(schema)));
        self
    }

    /// The concrete repository for `entity_type`, for inspection in tests.
    pub fn memory_repository(&self, entity_type: &str) -> Option<Arc<MemoryRepository>> {
        self.repositories.get(entity_type).cloned()
    }

    /// Stores `entity` directly, bypassing staging. Returns its key.
    pub async fn seed(&self, entity: impl Entity + 'static) -> FormsResult<Value> {
        let repo = self.repo_for(entity.entity_type())?;
        Ok(repo.upsert(Box::new(entity)).await)
    }

    /// Makes the next `flush` fail with a [`FormsError::PersistenceFault`].
    pub fn fail_next_flush(&self) {
        self.fail_next_flush.store(true, Ordering::SeqCst);
    }

    /// Number of successful flushes.
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Number of entities staged and not yet flushed.
    pub async fn staged_count(&self) -> usize {
        self.staged.lock().await.len()
    }

    fn repo_for(&self, entity_type: &str) -> FormsResult<Arc<MemoryRepository>> {
        self.repositories
            .get(entity_type)
            .cloned()
            .ok_or_else(|| FormsError::UnknownEntityType(entity_type.to_string()))
    }
}

#[async_trait]
impl PersistenceLayer for MemoryPersistence {
    fn repository(&self, entity_type: &str) -> Option<Arc<dyn Repository>> {
        self.repositories
            .get(entity_type)
            .map(|repo| Arc::clone(repo) as Arc<dyn Repository>)
    }

    async fn persist(&self, entity: &mut dyn Entity) -> FormsResult<()> {
        let repo = self.repo_for(entity.entity_type())?;
        if entity.id().map_or(true, |id| id.is_none()) {
            entity.set_id(repo.allocate_id());
        }
        self.staged.lock().await.push(entity.boxed_clone());
        Ok(())
    }

    async fn flush(&self) -> FormsResult<()> {
        if self.fail_next_flush.swap(false, Ordering::SeqCst) {
            return Err(FormsError::PersistenceFault(
                "flush rejected by storage".to_string(),
            ));
        }
        let staged: Vec<Box<dyn Entity>> = self.staged.lock().await.drain(..).collect();
        for entity in staged {
            let repo = self.repo_for(entity.entity_type())?;
            repo.upsert(entity).await;
        }
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self) -> FormsResult<()> {
        self.staged.lock().await.clear();
        Ok(())
    }
}
