//! Release name, description, and comment templates.

use super::ReleaseContext;
use minijinja::Environment;
use serde_json::{Map, Value};
use thiserror::Error;

/// Default template for version names, e.g. `[DAILY] v1.2.0`.
pub const DEFAULT_VERSION_TEMPLATE: &str = "{% if stage %}[{{ stage }}] {% endif %}v{{ version }}";

/// Default template for version descriptions.
pub const DEFAULT_DESCRIPTION_TEMPLATE: &str =
    "Automated release {{ version }}{% if notes %}\n\n{{ notes }}{% endif %}";

/// Default template for ticket comments.
pub const DEFAULT_COMMENT_TEMPLATE: &str = "This ticket was released and moved to {{ new_state }}.";

/// Error raised when a template cannot be parsed or rendered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to render {purpose} template: {reason}")]
pub struct TemplateError {
    /// Which template failed.
    pub purpose: &'static str,
    /// Renderer diagnostic.
    pub reason: String,
}

/// Templates used to name and describe the tracker version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTemplates {
    version_name: String,
    description: String,
}

impl Default for ReleaseTemplates {
    fn default() -> Self {
        Self {
            version_name: DEFAULT_VERSION_TEMPLATE.to_owned(),
            description: DEFAULT_DESCRIPTION_TEMPLATE.to_owned(),
        }
    }
}

impl ReleaseTemplates {
    /// Overrides the version name template.
    #[must_use]
    pub fn with_version_name(mut self, template: impl Into<String>) -> Self {
        self.version_name = template.into();
        self
    }

    /// Overrides the description template.
    #[must_use]
    pub fn with_description(mut self, template: impl Into<String>) -> Self {
        self.description = template.into();
        self
    }

    /// Checks that both templates parse.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] for the first template that fails to parse.
    pub fn validate(&self) -> Result<(), TemplateError> {
        check_syntax("version name", &self.version_name)?;
        check_syntax("description", &self.description)
    }

    /// Renders the version name from `version` and `stage`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when rendering fails.
    pub fn render_version_name(&self, release: &ReleaseContext) -> Result<String, TemplateError> {
        render("version name", &self.version_name, release_context(release))
    }

    /// Renders the version description from `version` and `notes`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when rendering fails.
    pub fn render_description(&self, release: &ReleaseContext) -> Result<String, TemplateError> {
        render("description", &self.description, release_context(release))
    }
}

/// Renders a ticket comment, substituting the target state's display name.
///
/// The name is bound as both `new_state` and `newState`. Falls back to
/// [`DEFAULT_COMMENT_TEMPLATE`] when `template` is `None`.
///
/// # Errors
///
/// Returns [`TemplateError`] when rendering fails.
pub fn render_comment(template: Option<&str>, new_state: &str) -> Result<String, TemplateError> {
    let mut context = Map::new();
    for name in ["new_state", "newState"] {
        context.insert(name.to_owned(), Value::String(new_state.to_owned()));
    }
    render(
        "comment",
        template.unwrap_or(DEFAULT_COMMENT_TEMPLATE),
        context,
    )
}

/// Checks that a comment template parses.
///
/// # Errors
///
/// Returns [`TemplateError`] when the template is malformed.
pub fn validate_comment_template(template: &str) -> Result<(), TemplateError> {
    check_syntax("comment", template)
}

fn release_context(release: &ReleaseContext) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert(
        "version".to_owned(),
        Value::String(release.version().to_string()),
    );
    context.insert("notes".to_owned(), Value::String(release.notes().to_owned()));
    if let Some(stage) = release.stage() {
        context.insert("stage".to_owned(), Value::String(stage.as_str().to_owned()));
    }
    context
}

fn render(
    purpose: &'static str,
    template: &str,
    context: Map<String, Value>,
) -> Result<String, TemplateError> {
    let environment = Environment::new();
    environment
        .render_str(template, context)
        .map_err(|err| TemplateError {
            purpose,
            reason: err.to_string(),
        })
}

fn check_syntax(purpose: &'static str, template: &str) -> Result<(), TemplateError> {
    let environment = Environment::new();
    environment
        .template_from_str(template)
        .map(|_| ())
        .map_err(|err| TemplateError {
            purpose,
            reason: err.to_string(),
        })
}
