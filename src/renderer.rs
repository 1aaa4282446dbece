//! Template rendering for nothelm.
//! Wraps MiniJinja for both single-string rendering (values interpolation)
//! and file rendering scoped to a source directory.
use crate::error::{Error, Result};
use minijinja::{path_loader, AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use serde::Serialize;
use std::path::Path;

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given context.
    ///
    /// # Arguments
    /// * `template` - Template string to render
    /// * `context` - Context variables for rendering
    ///
    /// # Returns
    /// * `Result<String>` - Rendered template string
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String>;
}

/// MiniJinja-based renderer for standalone template strings.
///
/// Undefined variables render as empty strings here. Strict rendering is
/// reserved for project files, see [`DirectoryTemplates`].
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a new MiniJinjaRenderer instance with default environment.
    pub fn new() -> Self {
        let env = Environment::new();
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String> {
        let mut env = self.env.clone();
        env.add_template("temp", template).map_err(|e| template_error("temp", e))?;

        let tmpl = env.get_template("temp").map_err(|e| template_error("temp", e))?;

        tmpl.render(context).map_err(|e| template_error("temp", e))
    }
}

/// Templates loaded from a source directory.
///
/// Includes, imports and `extends` resolve relative to the directory root,
/// and referencing an undefined variable is an error. Output is never
/// escaped, whatever the file extension.
pub struct DirectoryTemplates {
    env: Environment<'static>,
}

impl DirectoryTemplates {
    pub fn new<P: AsRef<Path>>(source_dir: P) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(source_dir.as_ref()));
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        Self { env }
    }

    /// Renders the template stored at `name` (a `/`-separated path relative to
    /// the source directory) against `context`.
    pub fn render<S: Serialize>(&self, name: &str, context: &S) -> Result<String> {
        let tmpl = self.env.get_template(name).map_err(|e| template_error(name, e))?;
        tmpl.render(context).map_err(|e| template_error(name, e))
    }
}

/// Sorts a MiniJinja failure into the matching [`Error`] variant.
pub fn template_error(template: &str, source: minijinja::Error) -> Error {
    let template = template.to_string();
    match source.kind() {
        ErrorKind::UndefinedError => Error::UndefinedVariableError { template, source },
        ErrorKind::SyntaxError => Error::TemplateSyntaxError { template, source },
        _ => Error::TemplateError { template, source },
    }
}
