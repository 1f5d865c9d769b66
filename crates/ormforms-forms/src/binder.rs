//! Binding a form to one persisted entity.
//!
//! An [`EntityBinder`] serves exactly one form lifecycle:
//!
//! ```text
//! Unbound -> Loaded(none|insert|update) -> Populated -> Reconciling -> Committed | Failed
//! ```
//!
//! [`EntityBinder::load`] fetches or creates the entity,
//! [`EntityBinder::populate`] copies its properties into empty controls, and
//! [`EntityBinder::reconcile`] writes submitted values back and persists the
//! entity in one transaction. [`EntityBinder::submit`] wraps reconciliation
//! with validation and the before/after observer lists.
//!
//! Persistence faults never escape `reconcile`: they are logged and returned
//! as [`BindingResult::Failed`].

use std::fmt;
use std::sync::Arc;

use ormforms_core::{FormsError, FormsResult};
use ormforms_db::entity::{Entity, FieldValue, Related};
use ormforms_db::mapping::{join_map, Cardinality, RelationJoinMap};
use ormforms_db::persistence::{persist_atomic, PersistenceLayer, Repository};
use ormforms_db::value::Value;
use ormforms_signals::Signal;
use serde::{Deserialize, Serialize};

use crate::form::{Form, FormErrors, FormValues};
use crate::populate::populate_defaults;

/// Observer called with the submitted values, the entity (if any) and the form.
pub type SuccessHandler = dyn Fn(&FormValues, Option<&dyn Entity>, &Form) + Send + Sync;

/// Observer called with the submitted values and the form after a failed write.
pub type ErrorHandler = dyn Fn(&FormValues, &Form) + Send + Sync;

/// How a submission will be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseMethod {
    /// No entity is bound; nothing is written.
    None,
    /// A new entity will be inserted.
    Insert,
    /// A loaded entity will be updated.
    Update,
}

impl fmt::Display for DatabaseMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Insert => "insert",
            Self::Update => "update",
        };
        write!(f, "{name}")
    }
}

/// Lifecycle state of a binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinderState {
    /// `load` has not run.
    Unbound,
    /// An entity was loaded or created (or found absent).
    Loaded(DatabaseMethod),
    /// Defaults were copied into the form.
    Populated,
    /// Submitted values are being written.
    Reconciling,
    /// The entity was persisted.
    Committed,
    /// Loading or persisting failed.
    Failed,
}

impl BinderState {
    /// `Committed` and `Failed` end the lifecycle.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Failed)
    }
}

/// Outcome of a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingResult {
    /// No entity is bound, so nothing was written.
    Skipped,
    /// The entity was written with the given method.
    Committed(DatabaseMethod),
    /// The form rejected the submitted values; the binder was not involved.
    Rejected(FormErrors),
    /// Writing failed. The entity state is uncertain.
    Failed(FormsError),
}

impl BindingResult {
    /// `true` for `Skipped` and `Committed`.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Skipped | Self::Committed(_))
    }
}

/// Binds one form lifecycle to one entity.
pub struct EntityBinder {
    layer: Arc<dyn PersistenceLayer>,
    state: BinderState,
    entity_type: Option<String>,
    entity: Option<Box<dyn Entity>>,
    repository: Option<Arc<dyn Repository>>,
    joins: RelationJoinMap,
    before_success: Signal<SuccessHandler>,
    after_success: Signal<SuccessHandler>,
    after_error: Signal<ErrorHandler>,
}

impl fmt::Debug for EntityBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityBinder")
            .field("state", &self.state)
            .field("entity_type", &self.entity_type)
            .field("entity", &self.entity)
            .field("before_success", &self.before_success)
            .field("after_success", &self.after_success)
            .field("after_error", &self.after_error)
            .finish_non_exhaustive()
    }
}

impl EntityBinder {
    /// Creates an unbound binder over `layer`.
    pub fn new(layer: Arc<dyn PersistenceLayer>) -> Self {
        Self {
            layer,
            state: BinderState::Unbound,
            entity_type: None,
            entity: None,
            repository: None,
            joins: RelationJoinMap::new(),
            before_success: Signal::new(),
            after_success: Signal::new(),
            after_error: Signal::new(),
        }
    }

    /// The current lifecycle state.
    pub const fn state(&self) -> BinderState {
        self.state
    }

    /// The bound entity, if any.
    pub fn entity(&self) -> Option<&dyn Entity> {
        self.entity.as_deref()
    }

    /// The entity type passed to `load`.
    pub fn entity_type(&self) -> Option<&str> {
        self.entity_type.as_deref()
    }

    /// The repository of the bound entity type.
    pub fn repository(&self) -> Option<&Arc<dyn Repository>> {
        self.repository.as_ref()
    }

    /// Classifies how a submission would be written right now.
    pub fn database_method(&self) -> DatabaseMethod {
        match &self.entity {
            None => DatabaseMethod::None,
            Some(entity) if entity.id().is_some_and(|id| !id.is_none()) => DatabaseMethod::Update,
            Some(_) => DatabaseMethod::Insert,
        }
    }

    /// Connects an observer that runs before reconciliation.
    pub fn on_before_success<F>(&mut self, id: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&FormValues, Option<&dyn Entity>, &Form) + Send + Sync + 'static,
    {
        self.before_success.connect(id, Arc::new(handler));
        self
    }

    /// Connects an observer that runs after a successful reconciliation.
    pub fn on_after_success<F>(&mut self, id: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&FormValues, Option<&dyn Entity>, &Form) + Send + Sync + 'static,
    {
        self.after_success.connect(id, Arc::new(handler));
        self
    }

    /// Connects an observer that runs after a failed reconciliation.
    pub fn on_after_error<F>(&mut self, id: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&FormValues, &Form) + Send + Sync + 'static,
    {
        self.after_error.connect(id, Arc::new(handler));
        self
    }

    /// Disconnects an observer from all three lists. Returns `true` if any was removed.
    pub fn disconnect(&mut self, id: &str) -> bool {
        let before = self.before_success.disconnect(id);
        let after = self.after_success.disconnect(id);
        let error = self.after_error.disconnect(id);
        before || after || error
    }

    /// Loads (with a key) or creates (without one) the entity for this lifecycle.
    ///
    /// Returns the relation join map: relation name to join column for every
    /// single-valued, single-column relation, all of which are joined eagerly
    /// by the lookup. An unknown entity type leaves the binder without an
    /// entity and is not an error.
    pub async fn load(
        &mut self,
        entity_type: Option<&str>,
        key: Option<Value>,
    ) -> FormsResult<RelationJoinMap> {
        if self.state == BinderState::Reconciling {
            return Err(FormsError::LifecycleViolation(
                "load called while reconciling".to_string(),
            ));
        }
        self.entity = None;
        self.repository = None;
        self.joins.clear();
        self.entity_type = entity_type.filter(|t| !t.is_empty()).map(str::to_string);

        let Some(entity_type) = self.entity_type.clone() else {
            self.state = BinderState::Loaded(DatabaseMethod::None);
            return Ok(RelationJoinMap::new());
        };
        let Some(repository) = self.layer.repository(&entity_type) else {
            tracing::warn!(entity_type = %entity_type, "unknown entity type, form is not bound");
            self.state = BinderState::Loaded(DatabaseMethod::None);
            return Ok(RelationJoinMap::new());
        };

        match key.filter(|k| !k.is_none()) {
            None => {
                self.entity = Some(repository.create());
            }
            Some(key) => {
                let joins = join_map(repository.relation_mappings());
                let names: Vec<String> = joins.keys().cloned().collect();
                match repository.find_joined(&key, &names).await {
                    Ok(found) => {
                        if found.is_none() {
                            tracing::debug!(entity_type = %entity_type, key = %key, "no row for key");
                        }
                        self.entity = found;
                        self.joins = joins;
                    }
                    Err(e) => {
                        tracing::error!(entity_type = %entity_type, error = %e, "entity lookup failed");
                        self.state = BinderState::Failed;
                        return Err(e);
                    }
                }
            }
        }

        self.repository = Some(repository);
        self.state = BinderState::Loaded(self.database_method());
        Ok(self.joins.clone())
    }

    /// Adds a hidden `id` control holding the entity key, unless the form
    /// already declares a top-level `id` or no entity is bound.
    pub fn ensure_id_control(&self, form: &mut Form) -> bool {
        let Some(entity) = &self.entity else {
            return false;
        };
        if form.has_component("id") {
            return false;
        }
        form.add_hidden("id", entity.id());
        true
    }

    /// Copies entity properties into empty controls.
    ///
    /// With `expose_id`, a hidden `id` control is ensured first. Returns the
    /// number of controls that received a default.
    pub fn populate(
        &mut self,
        form: &mut Form,
        joins: &RelationJoinMap,
        expose_id: bool,
    ) -> FormsResult<usize> {
        match self.state {
            BinderState::Loaded(_) | BinderState::Populated => {}
            other => {
                return Err(FormsError::LifecycleViolation(format!(
                    "populate called in state {other:?}"
                )));
            }
        }
        if expose_id {
            self.ensure_id_control(form);
        }
        let populated = self
            .entity
            .as_deref()
            .map_or(0, |entity| populate_defaults(form, entity, joins));
        self.state = BinderState::Populated;
        Ok(populated)
    }

    /// Writes `values` onto the bound entity and persists it atomically.
    ///
    /// Without a bound entity this does nothing and returns
    /// [`BindingResult::Skipped`]. Failures are logged and returned, never
    /// propagated.
    pub async fn reconcile(&mut self, form: &Form, values: &FormValues) -> BindingResult {
        if self.entity.is_none() {
            tracing::debug!(form = form.name(), "no entity bound, nothing to write");
            return BindingResult::Skipped;
        }
        if self.state.is_terminal() || self.state == BinderState::Unbound {
            return BindingResult::Failed(FormsError::LifecycleViolation(format!(
                "reconcile called in state {:?}",
                self.state
            )));
        }

        self.state = BinderState::Reconciling;
        match self.write_values(values).await {
            Ok(method) => {
                self.state = BinderState::Committed;
                tracing::info!(
                    form = form.name(),
                    method = %method,
                    key = ?self.entity.as_ref().and_then(|e| e.id()),
                    "entity committed"
                );
                BindingResult::Committed(method)
            }
            Err(e) => {
                self.state = BinderState::Failed;
                tracing::error!(form = form.name(), error = %e, "entity write failed");
                BindingResult::Failed(e)
            }
        }
    }

    /// Validates `values` against `form`, then runs the observers around
    /// [`EntityBinder::reconcile`].
    ///
    /// Invalid values are rejected before any observer runs.
    pub async fn submit(&mut self, form: &Form, values: &FormValues) -> BindingResult {
        if let Err(errors) = form.validate(values) {
            tracing::debug!(form = form.name(), fields = errors.len(), "submission rejected");
            return BindingResult::Rejected(errors);
        }

        self.before_success
            .dispatch(|handler| handler(values, self.entity.as_deref(), form));

        let result = self.reconcile(form, values).await;
        if result.is_success() {
            self.after_success
                .dispatch(|handler| handler(values, self.entity.as_deref(), form));
        } else {
            self.after_error.dispatch(|handler| handler(values, form));
        }
        result
    }

    async fn write_values(&mut self, values: &FormValues) -> FormsResult<DatabaseMethod> {
        let mut values = values.clone();
        if let Some(id) = values.remove("id").filter(|id| !id.is_none()) {
            if self.database_method() == DatabaseMethod::Insert {
                self.rebind(&id).await?;
            }
        }

        let repository = self
            .repository
            .clone()
            .ok_or_else(|| FormsError::LifecycleViolation("no repository bound".to_string()))?;
        let relations = repository.relation_mappings();

        for (name, raw) in values {
            let mut value = FieldValue::Value(raw.clone());

            if let Some(relation) = relations.get(&name) {
                if raw.is_none() {
                    if relation.cardinality == Cardinality::Collection {
                        tracing::debug!(field = %name, "empty value for collection relation, ignored");
                        continue;
                    }
                    value = FieldValue::Entity(None);
                } else {
                    let Some(target) = self.layer.repository(&relation.target) else {
                        tracing::debug!(field = %name, target = %relation.target, "unknown target type, skipping");
                        continue;
                    };
                    let entity = self.bound_entity()?;
                    if entity.capabilities().has_adder(&name) {
                        add_related(entity, &name, target.as_ref(), &raw).await?;
                        continue;
                    }
                    value = match &raw {
                        Value::List(keys) => FieldValue::Entities(target.find_many(keys).await?),
                        key => FieldValue::Entity(target.find(key).await?),
                    };
                }
            }

            assign(self.bound_entity()?, &name, value)?;
        }

        let method = self.database_method();
        let entity = self
            .entity
            .as_deref_mut()
            .ok_or_else(|| FormsError::LifecycleViolation("no entity bound".to_string()))?;
        persist_atomic(self.layer.as_ref(), entity).await?;
        Ok(method)
    }

    async fn rebind(&mut self, id: &Value) -> FormsResult<()> {
        let repository = self
            .repository
            .clone()
            .ok_or_else(|| FormsError::LifecycleViolation("no repository bound".to_string()))?;
        let joins: Vec<String> = join_map(repository.relation_mappings())
            .into_keys()
            .collect();
        match repository.find_joined(id, &joins).await? {
            Some(found) => {
                tracing::debug!(key = %id, "entity bound late from submitted id");
                self.entity = Some(found);
                Ok(())
            }
            None => Err(FormsError::EntityNotFound {
                entity_type: repository.entity_type().to_string(),
                key: id.to_string(),
            }),
        }
    }

    fn bound_entity(&mut self) -> FormsResult<&mut (dyn Entity + 'static)> {
        self.entity
            .as_deref_mut()
            .ok_or_else(|| FormsError::LifecycleViolation("no entity bound".to_string()))
    }
}

/// Resolves `raw` against `target` and hands the result to the entity's add
/// mutator. A list of keys is resolved with one batch lookup.
async fn add_related(
    entity: &mut dyn Entity,
    relation: &str,
    target: &dyn Repository,
    raw: &Value,
) -> FormsResult<()> {
    match raw {
        Value::List(keys) => {
            let found = target.find_many(keys).await?;
            entity.add(relation, Related::Many(found))
        }
        key => match target.find(key).await? {
            Some(found) => entity.add(relation, Related::One(found)),
            None => {
                tracing::debug!(relation, key = %key, "related key not found, skipping");
                Ok(())
            }
        },
    }
}

/// Setter first, then the raw property; anything else is skipped.
fn assign(entity: &mut dyn Entity, name: &str, value: FieldValue) -> FormsResult<()> {
    let capabilities = entity.capabilities();
    let (has_setter, has_property) = (capabilities.has_setter(name), capabilities.has_property(name));
    if has_setter {
        entity.set(name, value)
    } else if has_property {
        entity.assign(name, value)
    } else {
        tracing::debug!(field = name, "entity has no such property, skipping");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::FormControl;
    use ormforms_db::entity::{EntityCapabilities, Property};
    use ormforms_db::mapping::{ColumnType, FieldMapping, RelationMapping};
    use ormforms_db::memory::{EntitySchema, MemoryPersistence};
    use ormforms_db::record::Record;
    use std::sync::Mutex;

    fn article_caps() -> Arc<EntityCapabilities> {
        Arc::new(
            EntityCapabilities::new()
                .properties(["title", "author"])
                .setter("title"),
        )
    }

    fn layer() -> Arc<MemoryPersistence> {
        Arc::new(
            MemoryPersistence::new()
                .register(
                    EntitySchema::new(Record::new("article", article_caps()))
                        .field(FieldMapping::new("title", ColumnType::String).length(50))
                        .relation(RelationMapping::single("author", "user", "author_id")),
                )
                .register(EntitySchema::new(Record::new(
                    "user",
                    Arc::new(EntityCapabilities::new().property("name")),
                ))),
        )
    }

    fn values(pairs: &[(&str, Value)]) -> FormValues {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_load_classifies_database_method() {
        let layer = layer();
        layer
            .seed(Record::new("article", article_caps()).with_id(1))
            .await
            .unwrap();

        let mut binder = EntityBinder::new(layer.clone());
        binder.load(Some("article"), None).await.unwrap();
        assert_eq!(binder.database_method(), DatabaseMethod::Insert);
        assert_eq!(binder.state(), BinderState::Loaded(DatabaseMethod::Insert));

        let joins = binder.load(Some("article"), Some(Value::Int(1))).await.unwrap();
        assert_eq!(binder.database_method(), DatabaseMethod::Update);
        assert_eq!(joins.get("author").map(String::as_str), Some("author_id"));

        binder.load(Some("article"), Some(Value::Int(99))).await.unwrap();
        assert_eq!(binder.database_method(), DatabaseMethod::None);
    }

    #[tokio::test]
    async fn test_unknown_entity_type_is_not_an_error() {
        let mut binder = EntityBinder::new(layer());
        let joins = binder.load(Some("invoice"), None).await.unwrap();
        assert!(joins.is_empty());
        assert!(binder.entity().is_none());
        assert_eq!(binder.database_method(), DatabaseMethod::None);
    }

    #[tokio::test]
    async fn test_reconcile_without_entity_is_skipped() {
        let mut binder = EntityBinder::new(layer());
        binder.load(None, None).await.unwrap();
        let result = binder
            .reconcile(&Form::new("f"), &values(&[("title", "x".into())]))
            .await;
        assert_eq!(result, BindingResult::Skipped);
    }

    #[tokio::test]
    async fn test_populate_requires_load() {
        let mut binder = EntityBinder::new(layer());
        let err = binder
            .populate(&mut Form::new("f"), &RelationJoinMap::new(), false)
            .unwrap_err();
        assert!(matches!(err, FormsError::LifecycleViolation(_)));
    }

    #[tokio::test]
    async fn test_ensure_id_control_once() {
        let mut binder = EntityBinder::new(layer());
        binder.load(Some("article"), None).await.unwrap();
        let mut form = Form::new("article");
        assert!(binder.ensure_id_control(&mut form));
        assert!(!binder.ensure_id_control(&mut form));
        assert_eq!(form.components().len(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_insert_commits() {
        let layer = layer();
        let mut binder = EntityBinder::new(layer.clone());
        binder.load(Some("article"), None).await.unwrap();

        let result = binder
            .reconcile(
                &Form::new("article"),
                &values(&[("title", "Hello".into()), ("unknown", Value::Int(1))]),
            )
            .await;
        assert_eq!(result, BindingResult::Committed(DatabaseMethod::Insert));
        assert_eq!(binder.state(), BinderState::Committed);

        let repo = layer.memory_repository("article").unwrap();
        assert_eq!(repo.len().await, 1);
        let stored = repo.snapshot(&Value::Int(1)).await.unwrap();
        assert_eq!(
            stored.get("title"),
            Some(Property::Scalar(Value::from("Hello")))
        );
    }

    #[tokio::test]
    async fn test_terminal_state_rejects_second_reconcile() {
        let mut binder = EntityBinder::new(layer());
        binder.load(Some("article"), None).await.unwrap();
        let form = Form::new("article");
        binder.reconcile(&form, &FormValues::new()).await;
        let again = binder.reconcile(&form, &FormValues::new()).await;
        assert!(matches!(
            again,
            BindingResult::Failed(FormsError::LifecycleViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_value_clears_single_relation() {
        let layer = layer();
        layer
            .seed(
                Record::new("article", article_caps())
                    .with_id(1)
                    .with("author", Property::Reference(Value::Int(4))),
            )
            .await
            .unwrap();
        let mut binder = EntityBinder::new(layer.clone());
        binder.load(Some("article"), Some(Value::Int(1))).await.unwrap();
        let result = binder
            .reconcile(&Form::new("article"), &values(&[("author", "".into())]))
            .await;
        assert_eq!(result, BindingResult::Committed(DatabaseMethod::Update));
        assert_eq!(
            binder.entity().unwrap().get("author"),
            Some(Property::Reference(Value::Null))
        );
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_values_without_observers() {
        let mut binder = EntityBinder::new(layer());
        binder.load(Some("article"), None).await.unwrap();
        let calls = Arc::new(Mutex::new(0));
        let c = calls.clone();
        binder.on_before_success("count", move |_, _, _| *c.lock().unwrap() += 1);

        let mut form = Form::new("article");
        form.add(FormControl::text("title").required());
        let result = binder.submit(&form, &values(&[("title", "".into())])).await;
        assert!(matches!(result, BindingResult::Rejected(_)));
        assert_eq!(*calls.lock().unwrap(), 0);
        assert_eq!(binder.state(), BinderState::Loaded(DatabaseMethod::Insert));
    }

    #[test]
    fn test_database_method_display() {
        assert_eq!(DatabaseMethod::Insert.to_string(), "insert");
        assert_eq!(
            serde_json::to_string(&DatabaseMethod::Update).unwrap(),
            "\"update\""
        );
    }
}
