//! Deploy orchestration.
//! Loads override values, prepares the target directory, composes every
//! project into it and runs the deploy hook.

use crate::env::EnvSnapshot;
use crate::error::{Error, Result};
use crate::hooks::{run_deploy_hook, ScriptInvoker};
use crate::processor::TemplatePolicy;
use crate::project::compose_project;
use crate::values::{load_values, merge, ValueMap};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Inputs of a deploy run, already parsed by the caller.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Projects in composition order; later projects overwrite earlier files
    pub project_dirs: Vec<PathBuf>,
    /// Explicit target directory; a temporary one is used when absent
    pub target_dir: Option<PathBuf>,
    /// Override values files, merged in order
    pub values_files: Vec<PathBuf>,
    /// Render only, skip the deploy hook
    pub dry_run: bool,
    pub policy: TemplatePolicy,
}

/// Target directory of a run. A temporary directory is removed when dropped.
#[derive(Debug)]
pub enum Target {
    Explicit(PathBuf),
    Temporary(TempDir),
}

impl Target {
    /// Prepares the target directory.
    ///
    /// An explicit directory that already exists is cleared so that files from
    /// earlier runs do not leak into this one.
    ///
    /// # Errors
    /// * `Error::TargetIsFileError` if the explicit target is a regular file
    pub fn acquire(target_dir: Option<&Path>) -> Result<Self> {
        let Some(target_dir) = target_dir else {
            let temp_dir = TempDir::new()?;
            debug!("Using temporary target '{}'", temp_dir.path().display());
            return Ok(Target::Temporary(temp_dir));
        };

        if target_dir.is_file() {
            return Err(Error::TargetIsFileError { target: target_dir.display().to_string() });
        }
        if target_dir.exists() {
            debug!("Clearing target '{}'", target_dir.display());
            fs::remove_dir_all(target_dir)?;
        }
        Ok(Target::Explicit(target_dir.to_path_buf()))
    }

    pub fn path(&self) -> &Path {
        match self {
            Target::Explicit(path) => path,
            Target::Temporary(temp_dir) => temp_dir.path(),
        }
    }
}

/// Loads and merges the override values files in order.
pub fn load_overrides<P: AsRef<Path>>(values_files: &[P], env: &EnvSnapshot) -> Result<ValueMap> {
    let loaded = values_files
        .iter()
        .map(|path| load_values(path, env))
        .collect::<Result<Vec<_>>>()?;
    Ok(merge(&loaded))
}

/// Renders all projects into the target and, unless this is a dry run, runs the deploy hook.
///
/// A temporary target is removed on return, whether the run succeeded or not.
pub fn deploy(
    options: &DeployOptions,
    env: &EnvSnapshot,
    invoker: &dyn ScriptInvoker,
) -> Result<()> {
    let overrides = load_overrides(&options.values_files, env)?;

    let target = Target::acquire(options.target_dir.as_deref())?;
    let target_dir = target.path();

    for project_dir in &options.project_dirs {
        compose_project(project_dir, target_dir, &overrides, options.policy, env)?;
    }

    if options.dry_run {
        info!("Dry run, skipping deploy hook");
        return Ok(());
    }

    run_deploy_hook(target_dir, invoker, env)?;
    info!("Deployment from '{}' completed", target_dir.display());
    Ok(())
}
