//! Filesystem-backed workspace collaborators for Keel.
//!
//! This crate answers the questions the workspace build registry asks, using the files projects
//! keep on disk:
//! - which directories are projects (`.project` descriptors),
//! - which projects are part of a Gradle build (the Gradle nature),
//! - which build a project belongs to (persisted settings merged with workspace defaults).

mod builder;
mod description;
mod discover;
mod resolver;
mod settings;

pub use builder::DescriptorBuilder;
pub use description::{
    parse_project_description, project_description_path, read_project_description,
    ProjectDescription, GRADLE_NATURE, PROJECT_DESCRIPTION_FILE,
};
pub use discover::{DiscoveryOptions, FsMemberEnumerator};
pub use resolver::FsIdentityResolver;
pub use settings::{
    join_arguments, project_settings_path, read_project_settings, split_arguments,
    write_project_settings, ProjectSettings, PROJECT_SETTINGS_FILE,
};

use std::path::{Path, PathBuf};

use keel_config::{ConfigError, KeelConfig};

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A workspace on disk with its configuration loaded.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    pub root: PathBuf,
    pub config: KeelConfig,
    pub config_path: Option<PathBuf>,
}

impl FsWorkspace {
    /// Canonicalize `root` and load its `keel.toml` (or defaults when there is none).
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let root = root.as_ref();
        let root = dunce::canonicalize(root).map_err(|source| ProjectError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let (config, config_path) = keel_config::load_for_workspace(&root)?;
        Ok(Self {
            root,
            config,
            config_path,
        })
    }

    pub fn identity_resolver(&self) -> FsIdentityResolver {
        FsIdentityResolver::new(self.config.build.clone())
    }

    pub fn member_enumerator(&self) -> FsMemberEnumerator {
        FsMemberEnumerator::new(self.root.clone())
    }
}
