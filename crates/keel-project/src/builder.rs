use std::path::{Path, PathBuf};

use keel_build_model::{BuildDescriptor, IdentityError};
use keel_config::WorkspaceBuildDefaults;

use crate::settings::{ProjectSettings, KEY_PROJECT_DIR, PROJECT_SETTINGS_FILE};

/// Turns a project's persisted settings into the descriptor of the build it belongs to.
#[derive(Debug, Clone)]
pub struct DescriptorBuilder<'a> {
    project_dir: &'a Path,
    settings: &'a ProjectSettings,
    defaults: &'a WorkspaceBuildDefaults,
}

impl<'a> DescriptorBuilder<'a> {
    pub fn from_project_settings(
        project_dir: &'a Path,
        settings: &'a ProjectSettings,
        defaults: &'a WorkspaceBuildDefaults,
    ) -> Self {
        Self {
            project_dir,
            settings,
            defaults,
        }
    }

    pub fn build(&self) -> Result<BuildDescriptor, IdentityError> {
        let root_dir = self.root_dir()?;
        let settings = self.settings;

        let mut descriptor = if settings.override_workspace_settings {
            BuildDescriptor {
                root_dir,
                distribution: settings.distribution.clone().unwrap_or_default(),
                gradle_user_home: settings
                    .gradle_user_home
                    .as_deref()
                    .map(|p| self.resolve(p)),
                java_home: settings.java_home.as_deref().map(|p| self.resolve(p)),
                jvm_arguments: settings.jvm_arguments.clone(),
                arguments: settings.arguments.clone(),
                offline_mode: settings.offline_mode,
                build_scans: settings.build_scans,
                output: settings.output,
            }
        } else {
            let defaults = self.defaults;
            BuildDescriptor {
                root_dir,
                distribution: defaults.distribution.clone(),
                gradle_user_home: defaults.gradle_user_home.clone(),
                java_home: defaults.java_home.clone(),
                jvm_arguments: defaults.jvm_arguments.clone(),
                arguments: defaults.arguments.clone(),
                offline_mode: defaults.offline_mode,
                build_scans: defaults.build_scans,
                output: settings.output,
            }
        };

        if let keel_build_model::GradleDistribution::LocalInstallation(path) =
            &mut descriptor.distribution
        {
            *path = self.resolve(path);
        }

        descriptor.validate()?;
        Ok(descriptor)
    }

    /// The canonical build root: the project directory joined with `connection.project.dir`.
    fn root_dir(&self) -> Result<PathBuf, IdentityError> {
        let candidate = self.resolve(&self.settings.project_dir);
        let root = dunce::canonicalize(&candidate).map_err(|source| IdentityError::Io {
            path: candidate.clone(),
            source,
        })?;

        if !root.is_dir() {
            return Err(IdentityError::InvalidSetting {
                path: self.project_dir.join(PROJECT_SETTINGS_FILE),
                key: KEY_PROJECT_DIR,
                value: self.settings.project_dir.display().to_string(),
                reason: format!("{} is not a directory", root.display()),
            });
        }
        Ok(root)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }
}
