//! nothelm renders layered project directories of templates into a target
//! directory and runs the deploy script found there.

/// Command-line interface module for the nothelm application
pub mod cli;

/// Common constants: template suffixes and project layout names
pub mod constants;

/// Deploy orchestration: override values, target directory, projects, hook
pub mod deploy;

/// Read-only snapshot of process environment variables
pub mod env;

/// Error types and handling for the nothelm application
pub mod error;

/// Deploy hook execution (commands/deploy.sh)
pub mod hooks;

/// Logger initialization
pub mod logger;

/// Directory templating: walks a source tree and renders or copies each file
pub mod processor;

/// Project composition: values.yaml, templates/ and commands/
pub mod project;

/// MiniJinja template rendering
pub mod renderer;

/// Values loading, environment interpolation and merging
pub mod values;
