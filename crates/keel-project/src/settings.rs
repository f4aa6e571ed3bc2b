use std::path::{Path, PathBuf};

use keel_build_model::{GradleDistribution, IdentityError, OutputPreferences};

/// Per-project build settings file, relative to the project directory.
pub const PROJECT_SETTINGS_FILE: &str = ".settings/org.eclipse.buildship.core.prefs";

pub(crate) const KEY_PROJECT_DIR: &str = "connection.project.dir";
pub(crate) const KEY_DISTRIBUTION: &str = "connection.gradle.distribution";
pub(crate) const KEY_GRADLE_USER_HOME: &str = "gradle.user.home";
pub(crate) const KEY_JAVA_HOME: &str = "java.home";
pub(crate) const KEY_JVM_ARGUMENTS: &str = "jvm.arguments";
pub(crate) const KEY_ARGUMENTS: &str = "arguments";
pub(crate) const KEY_OFFLINE_MODE: &str = "offline.mode";
pub(crate) const KEY_BUILD_SCANS: &str = "build.scans.enabled";
pub(crate) const KEY_SHOW_CONSOLE: &str = "show.console.view";
pub(crate) const KEY_SHOW_EXECUTIONS: &str = "show.executions.view";
pub(crate) const KEY_OVERRIDE_WORKSPACE: &str = "override.workspace.settings";

/// Typed view of a project's persisted build settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSettings {
    /// Path from the project directory to the build root. Empty means the project itself.
    pub project_dir: PathBuf,
    /// When `false`, the workspace defaults replace every build setting below except the
    /// output preferences.
    pub override_workspace_settings: bool,
    pub distribution: Option<GradleDistribution>,
    pub gradle_user_home: Option<PathBuf>,
    pub java_home: Option<PathBuf>,
    pub jvm_arguments: Vec<String>,
    pub arguments: Vec<String>,
    pub offline_mode: bool,
    pub build_scans: bool,
    pub output: OutputPreferences,
}

impl ProjectSettings {
    /// Settings for a project whose build root is `project_dir` (relative to the project).
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            override_workspace_settings: false,
            distribution: None,
            gradle_user_home: None,
            java_home: None,
            jvm_arguments: Vec::new(),
            arguments: Vec::new(),
            offline_mode: false,
            build_scans: false,
            output: OutputPreferences::default(),
        }
    }

    /// Parse settings from `.properties` text. `path` is only used in errors.
    pub fn parse(path: &Path, text: &str) -> Result<Self, IdentityError> {
        let props = keel_properties::parse(text);
        let invalid = |key: &'static str, value: &str, reason: String| {
            IdentityError::InvalidSetting {
                path: path.to_path_buf(),
                key,
                value: value.to_string(),
                reason,
            }
        };
        let parse_bool = |key: &'static str| -> Result<bool, IdentityError> {
            match props.get(key).map(str::trim) {
                None | Some("") => Ok(false),
                Some(value) if value.eq_ignore_ascii_case("true") => Ok(true),
                Some(value) if value.eq_ignore_ascii_case("false") => Ok(false),
                Some(value) => Err(invalid(key, value, "expected `true` or `false`".to_string())),
            }
        };
        let parse_path = |key: &'static str| {
            props
                .get(key)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        };

        let project_dir = props
            .get(KEY_PROJECT_DIR)
            .map(|value| PathBuf::from(value.trim()))
            .ok_or_else(|| IdentityError::MissingSetting {
                path: path.to_path_buf(),
                key: KEY_PROJECT_DIR,
            })?;

        let distribution = match props.get(KEY_DISTRIBUTION).map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(
                value
                    .parse::<GradleDistribution>()
                    .map_err(|err| invalid(KEY_DISTRIBUTION, value, err.to_string()))?,
            ),
        };

        let arguments_of = |key: &'static str| -> Result<Vec<String>, IdentityError> {
            let value = props.get(key).unwrap_or_default();
            split_arguments(value).map_err(|reason| invalid(key, value, reason))
        };

        Ok(Self {
            project_dir,
            override_workspace_settings: parse_bool(KEY_OVERRIDE_WORKSPACE)?,
            distribution,
            gradle_user_home: parse_path(KEY_GRADLE_USER_HOME),
            java_home: parse_path(KEY_JAVA_HOME),
            jvm_arguments: arguments_of(KEY_JVM_ARGUMENTS)?,
            arguments: arguments_of(KEY_ARGUMENTS)?,
            offline_mode: parse_bool(KEY_OFFLINE_MODE)?,
            build_scans: parse_bool(KEY_BUILD_SCANS)?,
            output: OutputPreferences {
                show_console_view: parse_bool(KEY_SHOW_CONSOLE)?,
                show_executions_view: parse_bool(KEY_SHOW_EXECUTIONS)?,
            },
        })
    }

    /// Render the settings in their persisted `.properties` form.
    pub fn to_properties_string(&self) -> String {
        let project_dir = self.project_dir.to_string_lossy();
        let distribution = self
            .distribution
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        let gradle_user_home = path_text(self.gradle_user_home.as_deref());
        let java_home = path_text(self.java_home.as_deref());
        let jvm_arguments = join_arguments(&self.jvm_arguments);
        let arguments = join_arguments(&self.arguments);

        keel_properties::render([
            (KEY_ARGUMENTS, arguments.as_str()),
            (KEY_BUILD_SCANS, bool_text(self.build_scans)),
            (KEY_DISTRIBUTION, distribution.as_str()),
            (KEY_PROJECT_DIR, project_dir.as_ref()),
            (KEY_GRADLE_USER_HOME, gradle_user_home.as_str()),
            (KEY_JAVA_HOME, java_home.as_str()),
            (KEY_JVM_ARGUMENTS, jvm_arguments.as_str()),
            (KEY_OFFLINE_MODE, bool_text(self.offline_mode)),
            (
                KEY_OVERRIDE_WORKSPACE,
                bool_text(self.override_workspace_settings),
            ),
            (KEY_SHOW_CONSOLE, bool_text(self.output.show_console_view)),
            (
                KEY_SHOW_EXECUTIONS,
                bool_text(self.output.show_executions_view),
            ),
        ])
    }
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn path_text(path: Option<&Path>) -> String {
    path.map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn project_settings_path(project_dir: &Path) -> PathBuf {
    project_dir.join(PROJECT_SETTINGS_FILE)
}

/// Read the persisted settings of the project in `project_dir`.
///
/// `Ok(None)` when the project has no settings file yet. The file is ISO-8859-1, like every
/// `.properties` file.
pub fn read_project_settings(project_dir: &Path) -> Result<Option<ProjectSettings>, IdentityError> {
    let path = project_settings_path(project_dir);
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(IdentityError::Io { path, source }),
    };
    ProjectSettings::parse(&path, &keel_properties::decode_latin1(&bytes)).map(Some)
}

/// Persist `settings` for the project in `project_dir`, creating `.settings/` if needed.
pub fn write_project_settings(
    project_dir: &Path,
    settings: &ProjectSettings,
) -> Result<(), IdentityError> {
    let path = project_settings_path(project_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| IdentityError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(&path, settings.to_properties_string())
        .map_err(|source| IdentityError::Io { path, source })
}

/// Split a command-line style argument string on whitespace. Double quotes group words and are
/// removed.
pub fn split_arguments(text: &str) -> Result<Vec<String>, String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;

    for c in text.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    out.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated double quote".to_string());
    }
    if in_token {
        out.push(current);
    }
    Ok(out)
}

/// Inverse of [`split_arguments`] for arguments without embedded double quotes.
pub fn join_arguments(arguments: &[String]) -> String {
    arguments
        .iter()
        .map(|arg| {
            if arg.is_empty() || arg.chars().any(char::is_whitespace) {
                format!("\"{arg}\"")
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
