//! Logging integration for ormforms.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`FormSettings`](crate::settings::FormSettings) and for creating the span
//! that wraps one form lifecycle.

use crate::settings::FormSettings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The log level is read from `settings.log_level`. In debug mode a pretty,
/// human-readable format is used; otherwise a structured JSON format is used.
/// Installing a second subscriber is a no-op.
pub fn setup_logging(settings: &FormSettings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one build-then-submit form lifecycle.
///
/// # Examples
///
/// ```
/// use ormforms_core::logging::form_span;
///
/// let span = form_span("article_form", Some("article"));
/// let _guard = span.enter();
/// tracing::info!("building form");
/// ```
pub fn form_span(form_name: &str, entity_type: Option<&str>) -> tracing::Span {
    tracing::info_span!(
        "form",
        name = form_name,
        entity = entity_type.unwrap_or("-")
    )
}
