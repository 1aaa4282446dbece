//! Project composition.
//! A project is a directory with an optional `values.yaml`, an optional
//! `templates/` subtree and an optional `commands/` subtree. Several projects
//! can be rendered into the same target, later ones overwriting earlier files.

use crate::constants::{COMMANDS_DIR, TEMPLATES_DIR, VALUES_FILE};
use crate::env::EnvSnapshot;
use crate::error::{Error, Result};
use crate::processor::{render_dir, TemplatePolicy};
use crate::values::{load_values, merge, ValueMap};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Paths making up a project directory.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn values_file(&self) -> PathBuf {
        self.root.join(VALUES_FILE)
    }

    /// Subtrees to render, in rendering order, with the target subdirectory they map to.
    pub fn subtrees(&self) -> [(PathBuf, &'static str); 2] {
        [
            (self.root.join(TEMPLATES_DIR), TEMPLATES_DIR),
            (self.root.join(COMMANDS_DIR), COMMANDS_DIR),
        ]
    }

    /// Loads the project's own values; a missing values file is an empty mapping.
    pub fn default_values(&self, env: &EnvSnapshot) -> Result<ValueMap> {
        let values_file = self.values_file();
        if values_file.is_file() {
            load_values(&values_file, env)
        } else {
            debug!("No values file in '{}'", self.root.display());
            Ok(ValueMap::new())
        }
    }

    /// Project defaults overridden by the caller's values.
    pub fn effective_values(
        &self,
        caller_values: &ValueMap,
        env: &EnvSnapshot,
    ) -> Result<ValueMap> {
        let defaults = self.default_values(env)?;
        Ok(merge([&defaults, caller_values]))
    }
}

/// Renders a project into `dest_dir`.
///
/// `templates/` is fully rendered before `commands/`. Absent subtrees are skipped.
///
/// # Errors
/// * `Error::ProjectDoesNotExistError` if `project_dir` is not a directory
/// * Any error from loading values or rendering the subtrees
pub fn compose_project<P: AsRef<Path>, Q: AsRef<Path>>(
    project_dir: P,
    dest_dir: Q,
    caller_values: &ValueMap,
    policy: TemplatePolicy,
    env: &EnvSnapshot,
) -> Result<()> {
    let project = Project::new(project_dir.as_ref());
    let dest_dir = dest_dir.as_ref();

    if !project.root().is_dir() {
        return Err(Error::ProjectDoesNotExistError {
            project_dir: project.root().display().to_string(),
        });
    }

    info!("Composing project '{}'", project.root().display());
    let values = project.effective_values(caller_values, env)?;

    for (source, subdir) in project.subtrees() {
        if source.is_dir() {
            render_dir(&source, dest_dir.join(subdir), &values, policy)?;
        } else {
            debug!("Project '{}' has no {}/ directory", project.root().display(), subdir);
        }
    }
    Ok(())
}
