//! Deploy hook execution.
//! After rendering, `commands/deploy.sh` from the target directory is run
//! with the caller's environment. Its exit status decides the outcome.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::info;

use crate::constants::{DEPLOY_SCRIPT, SHELL, TEMPLATES_DIR};
use crate::env::EnvSnapshot;
use crate::error::{Error, Result};

/// Runs a script and reports its exit code.
pub trait ScriptInvoker {
    /// Runs `script` in `work_dir` with exactly the variables in `env`.
    ///
    /// # Returns
    /// * `Ok(Some(code))` - the script exited with `code`
    /// * `Ok(None)` - the script was terminated by a signal
    fn invoke(&self, script: &Path, work_dir: &Path, env: &EnvSnapshot) -> Result<Option<i32>>;
}

/// Runs scripts through bash, blocking until they finish.
#[derive(Debug, Default)]
pub struct ShellInvoker;

impl ScriptInvoker for ShellInvoker {
    fn invoke(&self, script: &Path, work_dir: &Path, env: &EnvSnapshot) -> Result<Option<i32>> {
        let status = Command::new(SHELL)
            .arg(script)
            .current_dir(work_dir)
            .env_clear()
            .envs(env.iter_os())
            .status()?;
        Ok(status.code())
    }
}

/// Returns the deploy script and working directory for a target directory.
///
/// The script runs from `templates/`, falling back to the target root when no
/// project contributed templates.
pub fn get_deploy_hook<P: AsRef<Path>>(target_dir: P) -> (PathBuf, PathBuf) {
    let target_dir = target_dir.as_ref();
    let script = target_dir.join(DEPLOY_SCRIPT);
    let templates = target_dir.join(TEMPLATES_DIR);
    let work_dir = if templates.is_dir() { templates } else { target_dir.to_path_buf() };
    (script, work_dir)
}

/// Runs the deploy hook of a rendered target directory.
///
/// # Errors
/// * `Error::MissingScriptError` if `commands/deploy.sh` was not rendered
/// * `Error::NonZeroExitError` if the script fails
pub fn run_deploy_hook<P: AsRef<Path>>(
    target_dir: P,
    invoker: &dyn ScriptInvoker,
    env: &EnvSnapshot,
) -> Result<()> {
    let (script, work_dir) = get_deploy_hook(target_dir);
    if !script.is_file() {
        return Err(Error::MissingScriptError { script: script.display().to_string() });
    }
    // must resolve from work_dir, not from the caller's cwd
    let script = std::fs::canonicalize(&script)?;

    info!("Running '{}' in '{}'", script.display(), work_dir.display());
    match invoker.invoke(&script, &work_dir, env)? {
        Some(0) => Ok(()),
        Some(code) => Err(Error::NonZeroExitError {
            script: script.display().to_string(),
            status: format!("exit code {code}"),
        }),
        None => Err(Error::NonZeroExitError {
            script: script.display().to_string(),
            status: "termination by signal".to_string(),
        }),
    }
}
