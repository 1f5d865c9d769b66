//! Entity-backed form factory.
//!
//! [`EntityFormFactory`] composes a user-supplied form definition with
//! [`FormSettings`] and an [`EntityBinder`]. Building a form runs:
//!
//! 1. `load` the entity (insert path without a key, update path with one)
//! 2. the definition closure
//! 3. rule inference from the entity type's column metadata
//! 4. default population (plus the hidden `id` control with `expose_id`)
//! 5. the generated submit button with `submit_button`
//!
//! ```
//! use std::sync::Arc;
//! use ormforms_core::FormSettings;
//! use ormforms_db::memory::{EntitySchema, MemoryPersistence};
//! use ormforms_db::entity::EntityCapabilities;
//! use ormforms_db::record::Record;
//! use ormforms_forms::control::FormControl;
//! use ormforms_forms::factory::EntityFormFactory;
//!
//! let caps = Arc::new(EntityCapabilities::new().property("name"));
//! let layer = Arc::new(
//!     MemoryPersistence::new().register(EntitySchema::new(Record::new("tag", caps))),
//! );
//! let factory = EntityFormFactory::new("tag_form", layer, FormSettings::default(), |form, _| {
//!     form.add(FormControl::text("name"));
//! });
//! assert_eq!(factory.name(), "tag_form");
//! ```

use std::fmt;
use std::sync::Arc;

use ormforms_core::logging::form_span;
use ormforms_core::{FormSettings, FormsResult};
use ormforms_db::entity::Entity;
use ormforms_db::persistence::PersistenceLayer;
use ormforms_db::value::Value;
use tracing::Instrument;

use crate::binder::{BindingResult, DatabaseMethod, EntityBinder};
use crate::form::{Form, FormValues};
use crate::inference::annotate;
use crate::layout::RenderLayout;

/// Name of the generated submit button.
pub const SUBMIT_NAME: &str = "save";

/// Declares the controls of a form. Receives the bound entity, if any.
pub type FormDefinition = dyn Fn(&mut Form, Option<&dyn Entity>) + Send + Sync;

/// Builds entity-backed forms and processes their submissions.
pub struct EntityFormFactory {
    name: String,
    settings: FormSettings,
    define: Arc<FormDefinition>,
    binder: EntityBinder,
}

impl fmt::Debug for EntityFormFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityFormFactory")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("binder", &self.binder)
            .finish_non_exhaustive()
    }
}

impl EntityFormFactory {
    /// Creates a factory for forms named `name`.
    pub fn new<F>(
        name: impl Into<String>,
        layer: Arc<dyn PersistenceLayer>,
        settings: FormSettings,
        define: F,
    ) -> Self
    where
        F: Fn(&mut Form, Option<&dyn Entity>) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            settings,
            define: Arc::new(define),
            binder: EntityBinder::new(layer),
        }
    }

    /// The form name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The settings this factory was created with.
    pub const fn settings(&self) -> &FormSettings {
        &self.settings
    }

    /// The layout values for the renderer.
    pub fn layout(&self) -> RenderLayout {
        RenderLayout::from(&self.settings)
    }

    /// The binder, for inspection.
    pub const fn binder(&self) -> &EntityBinder {
        &self.binder
    }

    /// The binder, for connecting observers.
    pub fn binder_mut(&mut self) -> &mut EntityBinder {
        &mut self.binder
    }

    /// How a submission of the built form will be written.
    pub fn database_method(&self) -> DatabaseMethod {
        self.binder.database_method()
    }

    /// Loads the entity and builds the form.
    ///
    /// # Errors
    ///
    /// Fails only when the entity lookup itself fails.
    pub async fn build(&mut self, entity_type: Option<&str>, key: Option<Value>) -> FormsResult<Form> {
        let span = form_span(&self.name, entity_type);
        self.build_inner(entity_type, key).instrument(span).await
    }

    async fn build_inner(&mut self, entity_type: Option<&str>, key: Option<Value>) -> FormsResult<Form> {
        let joins = self.binder.load(entity_type, key).await?;

        let mut form = Form::new(self.name.clone());
        (self.define)(&mut form, self.binder.entity());

        if self.binder.entity().is_some() {
            if let Some(repository) = self.binder.repository() {
                let added = annotate(&mut form, repository.as_ref());
                tracing::debug!(rules = added, "inferred rules attached");
            }
        }

        let populated = self.binder.populate(&mut form, &joins, self.settings.expose_id)?;
        tracing::debug!(controls = populated, "defaults populated");

        if self.settings.submit_button && !form.has_submit() {
            let caption = match self.binder.database_method() {
                DatabaseMethod::Insert => &self.settings.submit_label_insert,
                DatabaseMethod::Update | DatabaseMethod::None => &self.settings.submit_label_update,
            };
            form.add_submit(SUBMIT_NAME, caption.clone());
        }

        Ok(form)
    }

    /// Validates and writes a submission of `form`.
    pub async fn submit(&mut self, form: &Form, values: &FormValues) -> BindingResult {
        let span = form_span(&self.name, self.binder.entity_type());
        self.binder.submit(form, values).instrument(span).await
    }
}
