//! Directory templating for nothelm.
//! Walks a source tree and mirrors it into a destination tree, rendering
//! template files and copying everything else verbatim.

use crate::constants::TEMPLATE_SUFFIXES;
use crate::error::{Error, Result};
use crate::renderer::DirectoryTemplates;
use crate::values::ValueMap;
use log::{debug, info};
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Policy deciding which files are templates and how they are named in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplatePolicy {
    /// Render every file, not only the ones carrying a template suffix
    pub all_files_as_template: bool,
    /// Drop the template suffix from rendered file names
    pub strip_template_suffix: bool,
}

impl TemplatePolicy {
    /// Builds a policy. When `strip_template_suffix` is not given it defaults to
    /// `!all_files_as_template`.
    pub fn new(all_files_as_template: bool, strip_template_suffix: Option<bool>) -> Self {
        Self {
            all_files_as_template,
            strip_template_suffix: strip_template_suffix.unwrap_or(!all_files_as_template),
        }
    }
}

impl Default for TemplatePolicy {
    fn default() -> Self {
        Self::new(false, None)
    }
}

/// How a single source file is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Rendered through the template engine. `suffix` is the template suffix the
    /// file name carries, if any.
    Template { suffix: Option<&'static str> },
    /// Copied byte for byte, metadata included.
    Verbatim,
}

/// Operation to perform for a source file.
#[derive(Debug, PartialEq, Eq)]
pub enum FileOperation {
    Render { template: String, target: PathBuf },
    Copy { target: PathBuf },
}

/// Returns the template suffix `filename` ends with, if any.
pub fn template_suffix(filename: &str) -> Option<&'static str> {
    TEMPLATE_SUFFIXES.iter().copied().find(|suffix| filename.ends_with(suffix))
}

/// Classifies a file by name under the given policy.
pub fn classify(filename: &str, policy: &TemplatePolicy) -> FileKind {
    let suffix = template_suffix(filename);
    if suffix.is_some() || policy.all_files_as_template {
        FileKind::Template { suffix }
    } else {
        FileKind::Verbatim
    }
}

/// Computes the output file name for a file of the given kind.
pub fn target_file_name(filename: &str, kind: FileKind, policy: &TemplatePolicy) -> String {
    match kind {
        FileKind::Template { suffix: Some(suffix) } if policy.strip_template_suffix => {
            match filename.strip_suffix(suffix) {
                Some(stripped) if !stripped.is_empty() => stripped.to_string(),
                _ => filename.to_string(),
            }
        }
        _ => filename.to_string(),
    }
}

/// Turns a path relative to the source root into a loader template name.
fn template_name(relative_path: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in relative_path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(|| {
                Error::InvalidPathError { path: relative_path.display().to_string() }
            })?),
            _ => {
                return Err(Error::InvalidPathError {
                    path: relative_path.display().to_string(),
                })
            }
        }
    }
    Ok(parts.join("/"))
}

/// Mirrors one source directory into a destination directory.
pub struct Processor<'a> {
    source_dir: &'a Path,
    dest_dir: &'a Path,
    values: &'a ValueMap,
    policy: TemplatePolicy,
    templates: DirectoryTemplates,
}

impl<'a> Processor<'a> {
    pub fn new(
        source_dir: &'a Path,
        dest_dir: &'a Path,
        values: &'a ValueMap,
        policy: TemplatePolicy,
    ) -> Self {
        let templates = DirectoryTemplates::new(source_dir);
        Self { source_dir, dest_dir, values, policy, templates }
    }

    /// Decides what to do with a regular file below the source directory.
    pub fn plan(&self, source: &Path) -> Result<FileOperation> {
        let relative_path = source
            .strip_prefix(self.source_dir)
            .map_err(|_| Error::InvalidPathError { path: source.display().to_string() })?;
        let filename = relative_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidPathError { path: source.display().to_string() })?;

        let kind = classify(filename, &self.policy);
        let target = self
            .dest_dir
            .join(relative_path)
            .with_file_name(target_file_name(filename, kind, &self.policy));

        Ok(match kind {
            FileKind::Template { .. } => {
                FileOperation::Render { template: template_name(relative_path)?, target }
            }
            FileKind::Verbatim => FileOperation::Copy { target },
        })
    }

    /// Executes a planned operation for `source`.
    pub fn apply(&self, source: &Path, operation: &FileOperation) -> Result<()> {
        match operation {
            FileOperation::Render { template, target } => {
                debug!("Rendering '{}' to '{}'", template, target.display());
                let content = self.templates.render(template, self.values)?;
                write_private_file(target, &content)
            }
            FileOperation::Copy { target } => {
                debug!("Copying '{}' to '{}'", source.display(), target.display());
                copy_file(source, target)
            }
        }
    }

    /// Walks the source directory and processes every entry.
    /// Stops at the first failure; files written before it remain in place.
    pub fn run(&self) -> Result<()> {
        info!("Rendering '{}' into '{}'", self.source_dir.display(), self.dest_dir.display());
        fs::create_dir_all(self.dest_dir)?;

        for entry in WalkDir::new(self.source_dir).follow_links(true).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();

            if entry.file_type().is_dir() {
                let relative_path = path
                    .strip_prefix(self.source_dir)
                    .map_err(|_| Error::InvalidPathError { path: path.display().to_string() })?;
                fs::create_dir_all(self.dest_dir.join(relative_path))?;
                continue;
            }

            let operation = self.plan(path)?;
            self.apply(path, &operation)?;
        }
        Ok(())
    }
}

/// Renders `source_dir` into `dest_dir` with the given values and policy.
pub fn render_dir<P: AsRef<Path>, Q: AsRef<Path>>(
    source_dir: P,
    dest_dir: Q,
    values: &ValueMap,
    policy: TemplatePolicy,
) -> Result<()> {
    Processor::new(source_dir.as_ref(), dest_dir.as_ref(), values, policy).run()
}

/// Writes rendered content readable and writable by the owner only.
fn write_private_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // mode() only applies on creation
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Copies a file with its permissions and timestamps.
fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, dest)?;

    let metadata = fs::metadata(source)?;
    filetime::set_file_times(
        dest,
        filetime::FileTime::from_last_access_time(&metadata),
        filetime::FileTime::from_last_modification_time(&metadata),
    )?;
    Ok(())
}
