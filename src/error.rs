//! Error handling for nothelm.
//! Defines the error type and result alias used throughout the crate.

use std::io;
use thiserror::Error;

/// Errors that can occur while loading values, rendering projects or running the deploy hook.
///
/// Every error aborts the current invocation. Files written before the failure
/// stay in the target directory; re-running with the same inputs is the recovery path.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// Represents errors raised while walking a source directory
    #[error("Failed to walk the source directory: {0}.")]
    WalkError(#[from] walkdir::Error),

    /// A values file could not be parsed as YAML
    #[error("Failed to parse values file '{path}': {source}.")]
    YamlError { path: String, source: serde_yaml::Error },

    /// A values mapping contains keys that cannot be used as value names
    #[error("Unsupported keys in values file '{path}': {source}.")]
    ValuesKeyError { path: String, source: serde_json::Error },

    /// A values file parsed to something other than a mapping at top level
    #[error("File at '{path}' did not contain a YAML dictionary at top level.")]
    ShapeError { path: String },

    /// A template referenced a value that is not present in the values mapping
    #[error("Undefined variable in template '{template}': {source}.")]
    UndefinedVariableError { template: String, source: minijinja::Error },

    /// A template body could not be parsed
    #[error("Syntax error in template '{template}': {source}.")]
    TemplateSyntaxError { template: String, source: minijinja::Error },

    /// Any other template failure (missing include, failing filter, ...)
    #[error("Failed to render template '{template}': {source}.")]
    TemplateError { template: String, source: minijinja::Error },

    /// A source path cannot be used as a template name
    #[error("Path '{path}' is not valid UTF-8.")]
    InvalidPathError { path: String },

    /// A project directory passed by the caller does not exist
    #[error("Project directory '{project_dir}' does not exist.")]
    ProjectDoesNotExistError { project_dir: String },

    /// An explicit target path exists and is a regular file
    #[error("Target '{target}' is a file.")]
    TargetIsFileError { target: String },

    /// The deploy hook script was not rendered into the target
    #[error("Deploy script '{script}' does not exist.")]
    MissingScriptError { script: String },

    /// The deploy hook script failed
    #[error("Deploy script '{script}' failed with {status}.")]
    NonZeroExitError { script: String, status: String },

    /// The environment expansion pattern failed to compile
    #[error("Regex error: {0}.")]
    RegexError(#[from] regex::Error),
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
