//! # ormforms-forms
//!
//! Entity-backed forms. Provides the form surface (controls, rules,
//! validation), rule inference from column metadata, the entity binder that
//! moves values between a form and a persisted entity, and the form factory
//! that ties them together.
//!
//! ## Module Overview
//!
//! - [`control`] - [`FormControl`], [`ControlKind`] and validation [`Rule`]s
//! - [`form`] - [`Form`], the control tree, and validation
//! - [`inference`] - [`annotate`]: rules from column metadata
//! - [`populate`] - [`populate_defaults`]: control defaults from an entity
//! - [`binder`] - [`EntityBinder`]: load, populate, reconcile, submit
//! - [`layout`] - [`RenderLayout`]: values for an external renderer
//! - [`factory`] - [`EntityFormFactory`]: definition closure plus settings

#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::return_self_not_must_use)]

pub mod binder;
pub mod control;
pub mod factory;
pub mod form;
pub mod inference;
pub mod layout;
pub mod populate;

pub use binder::{BinderState, BindingResult, DatabaseMethod, EntityBinder};
pub use control::{ControlKind, FormControl, Rule, RuleKind};
pub use factory::EntityFormFactory;
pub use form::{Component, Form, FormErrors, FormValues};
pub use inference::annotate;
pub use layout::RenderLayout;
pub use populate::populate_defaults;
