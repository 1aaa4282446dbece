//! Common constants used throughout nothelm.

/// Filename suffixes that mark a file as a template
pub const TEMPLATE_SUFFIXES: [&str; 2] = [".j2", ".jinja2"];

/// Values file looked up inside every project directory
pub const VALUES_FILE: &str = "values.yaml";

/// Project subtree holding deployment templates
pub const TEMPLATES_DIR: &str = "templates";

/// Project subtree holding deployment commands
pub const COMMANDS_DIR: &str = "commands";

/// Deploy hook, relative to the target directory
pub const DEPLOY_SCRIPT: &str = "commands/deploy.sh";

/// Interpreter used to run the deploy hook
pub const SHELL: &str = "/bin/bash";

/// Namespace under which interpolated values files see the environment
pub const ENV_NAMESPACE: &str = "nothelm";
