//! Workspace configuration for Keel.
//!
//! The config file holds the workspace-wide build defaults that project settings inherit, plus
//! logging settings. See [`discover_config_path`] for where it is looked up.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use keel_build_model::GradleDistribution;
use parking_lot::ReentrantMutex;
use thiserror::Error;

mod logging;

pub use logging::{init_tracing, LoggingConfig};

/// Build settings applied to every project that does not override workspace settings.
///
/// ```toml
/// [build]
/// distribution = "GRADLE_DISTRIBUTION(VERSION(8.5))"
/// java_home = "/usr/lib/jvm/temurin-21"
/// jvm_arguments = ["-Xmx2g"]
/// arguments = ["--stacktrace"]
/// offline_mode = false
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceBuildDefaults {
    /// Gradle distribution in its persisted text form. Defaults to the project's wrapper.
    #[serde(
        default,
        deserialize_with = "distribution_serde::deserialize",
        serialize_with = "distribution_serde::serialize"
    )]
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
}

impl Default for WorkspaceBuildDefaults {
    fn default() -> Self {
        Self {
            distribution: GradleDistribution::Wrapper,
            gradle_user_home: None,
            java_home: None,
            jvm_arguments: Vec::new(),
            arguments: Vec::new(),
            offline_mode: false,
            build_scans: false,
        }
    }
}

impl WorkspaceBuildDefaults {
    /// Resolve relative paths against `base` (the directory holding the config file).
    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        if let Some(home) = self.gradle_user_home.as_mut() {
            resolve(home);
        }
        if let Some(home) = self.java_home.as_mut() {
            resolve(home);
        }
        if let GradleDistribution::LocalInstallation(path) = &mut self.distribution {
            resolve(path);
        }
    }
}

mod distribution_serde {
    use keel_build_model::GradleDistribution;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<GradleDistribution, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }

    pub(super) fn serialize<S>(value: &GradleDistribution, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }
}

/// Top-level workspace configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeelConfig {
    #[serde(default)]
    pub build: WorkspaceBuildDefaults,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

/// Remove quoted user values from TOML/serde error messages.
///
/// Config errors end up in logs; values such as proxy credentials inside JVM arguments must not.
fn sanitize_toml_error_message(message: &str) -> String {
    static QUOTED_STRING_RE: OnceLock<Option<regex::Regex>> = OnceLock::new();
    static BACKTICK_VALUE_RE: OnceLock<Option<regex::Regex>> = OnceLock::new();

    let quoted = QUOTED_STRING_RE.get_or_init(|| regex::Regex::new(r#""(?:\\.|[^"\\])*""#).ok());
    let mut out = match quoted {
        Some(re) => re.replace_all(message, r#""<redacted>""#).into_owned(),
        None => message.to_owned(),
    };

    // `unknown field `x``, `invalid type: string `x`` carry user input; `missing field `x`` does
    // not.
    if out.contains("unknown field") || out.contains("unknown variant") {
        let backtick = BACKTICK_VALUE_RE.get_or_init(|| regex::Regex::new(r"`[^`]*`").ok());
        if let Some(re) = backtick {
            out = re.replacen(&out, 1, "`<redacted>`").into_owned();
        }
    }

    out
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // `Display` includes a source snippet; keep only the message.
        ConfigError::Toml(sanitize_toml_error_message(err.message()))
    }
}

impl KeelConfig {
    /// Load a config file from TOML. Relative paths (build and log file) are resolved against the
    /// file's directory.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::load_from_str(&text)?;
        if let Some(dir) = path.parent() {
            config.build.resolve_paths(dir);
            config.logging.resolve_paths(dir);
        }
        Ok(config)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

pub const KEEL_CONFIG_ENV_VAR: &str = "KEEL_CONFIG_PATH";

static CONFIG_ENV_LOCK: OnceLock<ReentrantMutex<()>> = OnceLock::new();

fn config_env_lock() -> &'static ReentrantMutex<()> {
    CONFIG_ENV_LOCK.get_or_init(|| ReentrantMutex::new(()))
}

/// Run `f` while holding Keel's config environment lock.
///
/// Environment variables are process-global; tests that set [`KEEL_CONFIG_ENV_VAR`] wrap the
/// mutation and the discovery call in this so concurrent discovery does not observe it.
pub fn with_config_env_lock<R>(f: impl FnOnce() -> R) -> R {
    let _guard = config_env_lock().lock();
    f()
}

/// Discover the Keel configuration file for a workspace root.
///
/// Search order:
/// 1) `KEEL_CONFIG_PATH` (absolute or relative to `workspace_root`)
/// 2) `keel.toml` in `workspace_root`
/// 3) `.keel.toml` in `workspace_root`
/// 4) `.keel/config.toml` in `workspace_root`
pub fn discover_config_path(workspace_root: &Path) -> Option<PathBuf> {
    let _guard = config_env_lock().lock();
    if let Some(value) = std::env::var_os(KEEL_CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(value);
        let path = if candidate.is_absolute() {
            candidate
        } else {
            workspace_root.join(candidate)
        };
        return Some(dunce::canonicalize(&path).unwrap_or(path));
    }

    ["keel.toml", ".keel.toml", ".keel/config.toml"]
        .into_iter()
        .map(|name| workspace_root.join(name))
        .find(|path| path.is_file())
        .map(|path| dunce::canonicalize(&path).unwrap_or(path))
}

/// Load the Keel configuration for a workspace root.
///
/// If no config is present, returns [`KeelConfig::default`] and `None`.
pub fn load_for_workspace(
    workspace_root: &Path,
) -> Result<(KeelConfig, Option<PathBuf>), ConfigError> {
    let Some(path) = discover_config_path(workspace_root) else {
        return Ok((KeelConfig::default(), None));
    };

    let config = KeelConfig::load_from_path(&path)?;
    tracing::debug!(
        target: "keel.config",
        path = %path.display(),
        "loaded workspace config"
    );
    Ok((config, Some(path)))
}
