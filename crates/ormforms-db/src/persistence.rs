//! Persistence contracts consumed by the binder.
//!
//! [`PersistenceLayer`] is the unit of work for one request; it hands out a
//! [`Repository`] per entity type. Both traits are async, matching the
//! storage drivers they front. Implementations are request-scoped: a layer is
//! never shared between concurrent form lifecycles.

use std::sync::Arc;

use async_trait::async_trait;
use ormforms_core::FormsResult;

use crate::entity::Entity;
use crate::mapping::{FieldMappingSource, RelationMap};
use crate::value::Value;

/// Gateway to one entity type: lookups plus column and relation metadata.
#[async_trait]
pub trait Repository: FieldMappingSource + Send + Sync {
    /// The entity type this repository serves.
    fn entity_type(&self) -> &str;

    /// Constructs a new, unsaved, empty entity.
    fn create(&self) -> Box<dyn Entity>;

    /// Looks up one entity by primary key.
    async fn find(&self, key: &Value) -> FormsResult<Option<Box<dyn Entity>>>;

    /// Looks up one entity by primary key, eagerly joining `joins` (relation
    /// names) so their join columns are available without another roundtrip.
    ///
    /// The default implementation ignores `joins`.
    async fn find_joined(
        &self,
        key: &Value,
        joins: &[String],
    ) -> FormsResult<Option<Box<dyn Entity>>> {
        let _ = joins;
        self.find(key).await
    }

    /// Looks up all entities whose key is in `keys`, in one query.
    async fn find_many(&self, keys: &[Value]) -> FormsResult<Vec<Box<dyn Entity>>>;

    /// All relation mappings of this entity type, keyed by relation name.
    fn relation_mappings(&self) -> &RelationMap;
}

/// The persistence session of one request.
///
/// `begin`, `commit`, and `rollback` default to no-ops for layers whose
/// `flush` is already atomic.
#[async_trait]
pub trait PersistenceLayer: Send + Sync {
    /// Returns the repository for `entity_type`, or `None` if the type is unknown.
    fn repository(&self, entity_type: &str) -> Option<Arc<dyn Repository>>;

    /// Opens a transaction.
    async fn begin(&self) -> FormsResult<()> {
        Ok(())
    }

    /// Schedules `entity` for insert (no key) or update (has a key).
    async fn persist(&self, entity: &mut dyn Entity) -> FormsResult<()>;

    /// Writes all scheduled changes.
    async fn flush(&self) -> FormsResult<()>;

    /// Commits the open transaction.
    async fn commit(&self) -> FormsResult<()> {
        Ok(())
    }

    /// Rolls back the open transaction.
    async fn rollback(&self) -> FormsResult<()> {
        Ok(())
    }
}

/// Persists and flushes `entity` as one transactional unit.
///
/// On failure the transaction is rolled back and the original error is
/// returned; a failing rollback does not mask it. A key assigned during the
/// failed attempt is taken back, so an entity that was never stored stays
/// unsaved.
pub async fn persist_atomic(
    layer: &dyn PersistenceLayer,
    entity: &mut dyn Entity,
) -> FormsResult<()> {
    let key_before = entity.id();
    layer.begin().await?;

    let result = async {
        layer.persist(entity).await?;
        layer.flush().await
    }
    .await;

    match result {
        Ok(()) => layer.commit().await,
        Err(e) => {
            if let Err(rollback_err) = layer.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback failed");
            }
            if entity.id() != key_before {
                entity.set_id(key_before.unwrap_or(Value::Null));
            }
            Err(e)
        }
    }
}
