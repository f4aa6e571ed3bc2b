use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::IdentityError;

/// Which Gradle distribution a build runs with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum GradleDistribution {
    /// Whatever the build's own `gradlew` wrapper pins.
    #[default]
    Wrapper,
    /// A Gradle installation on the local filesystem.
    LocalInstallation(PathBuf),
    /// A distribution archive downloaded from a URI.
    RemoteDistribution(String),
    /// A released Gradle version, e.g. `8.5`.
    Version(String),
}

const DISTRIBUTION_PREFIX: &str = "GRADLE_DISTRIBUTION(";

impl fmt::Display for GradleDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradleDistribution::Wrapper => write!(f, "{DISTRIBUTION_PREFIX}WRAPPER)"),
            GradleDistribution::LocalInstallation(path) => write!(
                f,
                "{DISTRIBUTION_PREFIX}LOCAL_INSTALLATION({}))",
                path.display()
            ),
            GradleDistribution::RemoteDistribution(uri) => {
                write!(f, "{DISTRIBUTION_PREFIX}REMOTE_DISTRIBUTION({uri}))")
            }
            GradleDistribution::Version(version) => {
                write!(f, "{DISTRIBUTION_PREFIX}VERSION({version}))")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized Gradle distribution `{0}`")]
pub struct ParseDistributionError(pub String);

impl FromStr for GradleDistribution {
    type Err = ParseDistributionError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(GradleDistribution::Wrapper);
        }

        let err = || ParseDistributionError(text.to_string());
        let inner = text
            .strip_prefix(DISTRIBUTION_PREFIX)
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(err)?;

        if inner == "WRAPPER" {
            return Ok(GradleDistribution::Wrapper);
        }

        let (kind, arg) = inner
            .split_once('(')
            .and_then(|(kind, rest)| Some((kind, rest.strip_suffix(')')?)))
            .ok_or_else(err)?;

        match kind {
            "LOCAL_INSTALLATION" => Ok(GradleDistribution::LocalInstallation(PathBuf::from(arg))),
            "REMOTE_DISTRIBUTION" => Ok(GradleDistribution::RemoteDistribution(arg.to_string())),
            "VERSION" => Ok(GradleDistribution::Version(arg.to_string())),
            _ => Err(err()),
        }
    }
}

/// Progress/output presentation preferences that travel with a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OutputPreferences {
    pub show_console_view: bool,
    pub show_executions_view: bool,
}

/// Identity of one build root plus the configuration it is run with.
///
/// Two projects belong to the same build exactly when their descriptors are equal. Every field
/// participates in equality, so two projects pointing at the same root with different JVM
/// arguments are two different builds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildDescriptor {
    /// Canonical root directory of the build. This is also the working directory the build is
    /// invoked from.
    pub root_dir: PathBuf,
    #[serde(default)]
    pub distribution: GradleDistribution,
    #[serde(default)]
    pub gradle_user_home: Option<PathBuf>,
    #[serde(default)]
    pub java_home: Option<PathBuf>,
    #[serde(default)]
    pub jvm_arguments: Vec<String>,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub offline_mode: bool,
    #[serde(default)]
    pub build_scans: bool,
    #[serde(default)]
    pub output: OutputPreferences,
}

impl BuildDescriptor {
    /// Descriptor for `root_dir` with default settings (wrapper distribution, no overrides).
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            distribution: GradleDistribution::Wrapper,
            gradle_user_home: None,
            java_home: None,
            jvm_arguments: Vec::new(),
            arguments: Vec::new(),
            offline_mode: false,
            build_scans: false,
            output: OutputPreferences::default(),
        }
    }

    /// Check that the descriptor can identify a build at all.
    ///
    /// Descriptors built from persisted settings always pass; this guards descriptors that
    /// callers assemble (or deserialize) themselves.
    pub fn validate(&self) -> Result<(), IdentityError> {
        if self.root_dir.as_os_str().is_empty() {
            return Err(IdentityError::InvalidDescriptor(
                "build root directory is empty".to_string(),
            ));
        }
        require_absolute("build root directory", &self.root_dir)?;

        match &self.distribution {
            GradleDistribution::Wrapper => {}
            GradleDistribution::LocalInstallation(path) => {
                require_absolute("local Gradle installation", path)?;
            }
            GradleDistribution::RemoteDistribution(uri) if uri.trim().is_empty() => {
                return Err(IdentityError::InvalidDescriptor(
                    "remote Gradle distribution URI is empty".to_string(),
                ));
            }
            GradleDistribution::Version(version) if version.trim().is_empty() => {
                return Err(IdentityError::InvalidDescriptor(
                    "Gradle version is empty".to_string(),
                ));
            }
            GradleDistribution::RemoteDistribution(_) | GradleDistribution::Version(_) => {}
        }

        if let Some(home) = &self.gradle_user_home {
            require_absolute("Gradle user home", home)?;
        }
        if let Some(home) = &self.java_home {
            require_absolute("Java home", home)?;
        }
        Ok(())
    }
}

fn require_absolute(what: &str, path: &Path) -> Result<(), IdentityError> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(IdentityError::InvalidDescriptor(format!(
            "{what} `{}` is not an absolute path",
            path.display()
        )))
    }
}

/// A project in the workspace.
///
/// The registry treats members as opaque keys; only identity resolvers look inside.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkspaceMember {
    pub name: String,
    /// Directory the project lives in.
    pub location: PathBuf,
}

impl WorkspaceMember {
    pub fn new(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }
}

impl fmt::Display for WorkspaceMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.location.display())
    }
}
