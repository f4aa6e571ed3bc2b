use std::path::{Path, PathBuf};

use keel_build_model::{EnumerationError, MemberEnumerator, WorkspaceMember};
use walkdir::WalkDir;

use crate::description::{project_description_path, read_project_description};

/// Directories that never contain workspace projects of their own.
const SKIPPED_DIRS: &[&str] = &["build", "target", "node_modules", "out", "bin"];

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// How many directory levels below the workspace root are searched.
    pub max_depth: usize,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self { max_depth: 8 }
    }
}

/// Lists the projects under a workspace root: every directory holding a `.project` file.
#[derive(Debug, Clone)]
pub struct FsMemberEnumerator {
    root: PathBuf,
    options: DiscoveryOptions,
}

impl FsMemberEnumerator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_options(root, DiscoveryOptions::default())
    }

    pub fn with_options(root: impl Into<PathBuf>, options: DiscoveryOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MemberEnumerator for FsMemberEnumerator {
    fn all_members(&self) -> Result<Vec<WorkspaceMember>, EnumerationError> {
        let metadata = std::fs::metadata(&self.root).map_err(|source| EnumerationError::Io {
            path: self.root.clone(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(EnumerationError::message(format!(
                "workspace root {} is not a directory",
                self.root.display()
            )));
        }

        let walker = WalkDir::new(&self.root)
            .max_depth(self.options.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));

        let mut members = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(
                        target: "keel.project",
                        path = ?err.path(),
                        error = %err,
                        "skipping unreadable directory during workspace discovery"
                    );
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            let dir = entry.path();
            if !project_description_path(dir).is_file() {
                continue;
            }
            members.push(WorkspaceMember::new(member_name(dir), dir));
        }

        members.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(members)
    }
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

/// The `<name>` from the project descriptor, or the directory name when it has none.
fn member_name(dir: &Path) -> String {
    let from_description = match read_project_description(dir) {
        Ok(description) => description.and_then(|d| d.name),
        Err(err) => {
            // The enablement check reports broken descriptors; naming only needs a fallback.
            tracing::debug!(
                target: "keel.project",
                dir = %dir.display(),
                error = %err,
                "failed to read project name"
            );
            None
        }
    };

    from_description.unwrap_or_else(|| {
        dir.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string())
    })
}
