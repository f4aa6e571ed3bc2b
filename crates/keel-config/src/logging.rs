use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Once};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt, TestWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// `[logging]` section of the workspace config.
///
/// ```toml
/// [logging]
/// level = "keel.workspace=debug,info"
/// json = false
/// file = "logs/keel.log"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A plain level (`info`, `Warning`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,

    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Log file, appended to. Relative paths are resolved against the config file's directory.
    /// When it cannot be opened, logging carries on without it.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
        }
    }
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    pub(crate) fn resolve_paths(&mut self, base: &Path) {
        if let Some(file) = self.file.as_mut() {
            if file.is_relative() {
                *file = base.join(&*file);
            }
        }
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            level @ ("trace" | "debug" | "info" | "warn" | "error" | "off") => level.to_owned(),
            "warning" => "warn".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    /// The filter for this config with `rust_log` directives appended.
    ///
    /// Directives that do not parse are dropped: first the combined string is tried, then
    /// `rust_log` alone, then the configured level alone, and finally plain `info`.
    fn filter_with(&self, rust_log: Option<&str>) -> EnvFilter {
        let configured = Self::normalize_level_directives(&self.level);
        let rust_log = rust_log.map(str::trim).filter(|value| !value.is_empty());

        let mut candidates = Vec::with_capacity(3);
        if let Some(rust_log) = rust_log {
            candidates.push(format!("{configured},{rust_log}"));
            candidates.push(rust_log.to_owned());
        }
        candidates.push(configured);

        candidates
            .into_iter()
            .find_map(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::default().add_directive(LevelFilter::INFO.into()))
    }

    /// The effective filter: the configured level merged with `RUST_LOG`, if set.
    pub fn env_filter(&self) -> EnvFilter {
        self.filter_with(std::env::var("RUST_LOG").ok().as_deref())
    }

    fn open_file(&self) -> Option<File> {
        let path = self.file.as_ref()?;
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    }
}

/// Cloneable handle to the log file; every event locks it for the duration of one write.
#[derive(Clone)]
struct SharedLogFile(Arc<Mutex<File>>);

struct LockedWrite(Arc<Mutex<File>>);

impl Write for LockedWrite {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut file = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut file = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        file.flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedLogFile {
    type Writer = LockedWrite;

    fn make_writer(&'a self) -> Self::Writer {
        LockedWrite(Arc::clone(&self.0))
    }
}

fn build_writer(config: &LoggingConfig, file: Option<File>) -> BoxMakeWriter {
    let console = match (config.stderr, cfg!(debug_assertions)) {
        (false, _) => BoxMakeWriter::new(std::io::sink),
        // Captured by the test harness in debug builds.
        (true, true) => BoxMakeWriter::new(TestWriter::with_stderr),
        (true, false) => BoxMakeWriter::new(std::io::stderr),
    };

    match file {
        Some(file) => BoxMakeWriter::new(console.and(SharedLogFile(Arc::new(Mutex::new(file))))),
        None => console,
    }
}

static TRACING_INIT: Once = Once::new();

/// Install the process-wide tracing subscriber for `config`.
///
/// Only the first call has any effect; it returns `true` if it installed the subscriber.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let mut installed = false;

    TRACING_INIT.call_once(|| {
        let file = config.open_file();
        let missing_file = config.file.as_ref().filter(|_| file.is_none());
        let writer = build_writer(config, file);

        let format = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        let format: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if config.json {
            format.json().boxed()
        } else {
            format.boxed()
        };

        let subscriber = tracing_subscriber::registry()
            .with(config.env_filter())
            .with(format);
        installed = tracing::subscriber::set_global_default(subscriber).is_ok();

        if let (true, Some(path)) = (installed, missing_file) {
            tracing::warn!(
                target: "keel.config",
                path = %path.display(),
                "cannot open log file; logging to stderr only"
            );
        }
    });

    installed
}
