//! Command-line interface implementation for nothelm.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, ArgAction, Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use crate::deploy::DeployOptions;
use crate::processor::TemplatePolicy;

/// Command-line arguments structure for nothelm.
#[derive(Parser, Debug)]
#[command(author, version, about = "nothelm: templated deployments", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy a project.
    ///
    /// To override files in a project, pass --project-dir/-p multiple times.
    /// To override values, pass --values/-f multiple times.
    Deploy(DeployArgs),
}

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Project directory; later projects override files of earlier ones
    #[arg(short, long = "project-dir", value_name = "DIR", required = true)]
    pub project_dir: Vec<PathBuf>,

    /// Target directory. A temporary directory is used when omitted
    #[arg(short, long, value_name = "DIR")]
    pub target_dir: Option<PathBuf>,

    /// Values file; later files override earlier ones
    #[arg(short = 'f', long = "values", value_name = "FILE")]
    pub values: Vec<PathBuf>,

    /// Render only and skip executing the deployment
    #[arg(long)]
    pub dry_run: bool,

    /// Treat every file as a template, not only files ending in .j2/.jinja2
    #[arg(long)]
    pub all_files_as_template: bool,

    /// Strip .j2/.jinja2 from rendered file names.
    /// Defaults to on, or off when --all-files-as-template is set
    #[arg(long, overrides_with = "no_strip_template_file_endings")]
    pub strip_template_file_endings: bool,

    /// Keep .j2/.jinja2 in rendered file names
    #[arg(long, overrides_with = "strip_template_file_endings")]
    pub no_strip_template_file_endings: bool,

    /// Increase logging verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl DeployArgs {
    /// Resolves the strip flag pair; `None` when neither was given.
    pub fn strip_template_file_endings(&self) -> Option<bool> {
        match (self.strip_template_file_endings, self.no_strip_template_file_endings) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    pub fn policy(&self) -> TemplatePolicy {
        TemplatePolicy::new(self.all_files_as_template, self.strip_template_file_endings())
    }

    pub fn to_options(&self) -> DeployOptions {
        DeployOptions {
            project_dirs: self.project_dir.clone(),
            target_dir: self.target_dir.clone(),
            values_files: self.values.clone(),
            dry_run: self.dry_run,
            policy: self.policy(),
        }
    }
}

/// Parses command line arguments and returns the Cli structure.
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Cli {
    match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let _ = Cli::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
