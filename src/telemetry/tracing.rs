use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::paths::{PathError, Paths};
use crate::config::schema::LoggingConfig;

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub level: Level,
    pub log_to_stderr: bool,
    pub json_format: bool,
    /// Appended to in addition to stderr. Relative paths live in the state directory.
    pub log_file: Option<PathBuf>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_to_stderr: true,
            json_format: false,
            log_file: None,
        }
    }
}

impl TracingConfig {
    /// Combines the `[logging]` section with command-line overrides.
    ///
    /// `verbose` forces debug; `json` only ever turns JSON output on.
    pub fn from_logging(logging: &LoggingConfig, verbose: bool, json: bool) -> Self {
        let level = if verbose {
            Level::DEBUG
        } else {
            Level::from_str(&logging.level).unwrap_or(Level::INFO)
        };
        Self {
            level,
            log_to_stderr: true,
            json_format: json || logging.json,
            log_file: logging.file.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Failed to initialize state directory: {0}")]
    StateDir(#[from] PathError),

    #[error("Failed to open log file {path}: {source}")]
    LogFileOpen { path: PathBuf, source: io::Error },

    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Keeps the log file open; flushes it on drop.
#[derive(Debug)]
pub struct TracingGuard {
    file: Option<Arc<File>>,
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = (&**file).flush();
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn fmt_layer<W>(json: bool, writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_level(true)
        .with_timer(SystemTime);
    if json {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

/// Builds the subscriber without installing it.
pub fn build_subscriber(
    config: &TracingConfig,
) -> Result<(impl Subscriber + Send + Sync + 'static, TracingGuard), TracingError> {
    let file = match &config.log_file {
        Some(path) => {
            let path = if path.is_relative() {
                Paths::ensure_state_dir()?.join(path)
            } else {
                path.clone()
            };
            let file = File::options()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| TracingError::LogFileOpen { path, source })?;
            Some(Arc::new(file))
        }
        None => None,
    };

    let mut layers: Vec<BoxedLayer> = Vec::new();
    if config.log_to_stderr {
        layers.push(fmt_layer(config.json_format, io::stderr));
    }
    if let Some(file) = &file {
        layers.push(fmt_layer(config.json_format, Arc::clone(file)));
    }

    let subscriber = tracing_subscriber::registry()
        .with(layers)
        .with(resolve_env_filter(config));
    Ok((subscriber, TracingGuard { file }))
}

/// Installs the process-wide subscriber. Call once, from `main`.
pub fn init_tracing(config: &TracingConfig) -> Result<TracingGuard, TracingError> {
    let (subscriber, guard) = build_subscriber(config)?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|_| TracingError::AlreadyInitialized)?;
    Ok(guard)
}

fn resolve_env_filter(config: &TracingConfig) -> EnvFilter {
    if config.level == Level::DEBUG {
        EnvFilter::new(Level::DEBUG.as_str())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ENV_LOCK;
    use std::env;

    fn set_env_var(key: &str, value: impl AsRef<std::ffi::OsStr>) {
        unsafe {
            env::set_var(key, value);
        }
    }

    fn remove_env_var(key: &str) {
        unsafe {
            env::remove_var(key);
        }
    }

    #[test]
    fn logging_section_sets_level_and_file() {
        let logging = LoggingConfig {
            level: "warn".to_string(),
            json: true,
            file: Some(PathBuf::from("/tmp/notifier.log")),
        };

        let config = TracingConfig::from_logging(&logging, false, false);

        assert_eq!(config.level, Level::WARN);
        assert!(config.json_format);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/notifier.log")));
    }

    #[test]
    fn verbose_flag_forces_debug() {
        let logging = LoggingConfig {
            level: "error".to_string(),
            ..LoggingConfig::default()
        };
        let config = TracingConfig::from_logging(&logging, true, false);
        assert_eq!(config.level, Level::DEBUG);
        assert!(!config.json_format);
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let logging = LoggingConfig {
            level: "loud".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(TracingConfig::from_logging(&logging, false, false).level, Level::INFO);
    }

    #[test]
    fn env_filter_uses_rust_log_when_set() {
        let _lock = ENV_LOCK.lock().unwrap();
        set_env_var("RUST_LOG", "warn");
        let filter = resolve_env_filter(&TracingConfig::default());
        assert!(filter.to_string().contains("warn"));
        remove_env_var("RUST_LOG");
    }

    #[test]
    fn debug_level_overrides_rust_log() {
        let _lock = ENV_LOCK.lock().unwrap();
        set_env_var("RUST_LOG", "error");
        let config = TracingConfig {
            level: Level::DEBUG,
            ..TracingConfig::default()
        };
        assert!(resolve_env_filter(&config).to_string().contains("debug"));
        remove_env_var("RUST_LOG");
    }

    #[test]
    fn json_entries_are_appended_to_log_file() {
        let _lock = ENV_LOCK.lock().unwrap();
        remove_env_var("RUST_LOG");
        let temp = tempfile::tempdir().unwrap();
        let log_path = temp.path().join("notifier.log");

        let config = TracingConfig {
            level: Level::INFO,
            log_to_stderr: false,
            json_format: true,
            log_file: Some(log_path.clone()),
        };

        let (subscriber, guard) = build_subscriber(&config).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(channel = "email", "telemetry test log");
            tracing::debug!("filtered out");
        });
        drop(guard);

        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert!(contents.contains("telemetry test log"));
        assert!(contents.contains("\"level\""));
        assert!(contents.contains("\"channel\""));
        assert!(!contents.contains("filtered out"));
    }

    #[test]
    fn relative_log_file_is_placed_in_state_dir() {
        let _lock = ENV_LOCK.lock().unwrap();
        remove_env_var("RUST_LOG");
        let temp = tempfile::tempdir().unwrap();
        let state_dir = temp.path().join("state");
        set_env_var("NOTIFIER_STATE", &state_dir);

        let config = TracingConfig {
            log_to_stderr: false,
            log_file: Some(PathBuf::from("notifier.log")),
            ..TracingConfig::default()
        };
        let (subscriber, guard) = build_subscriber(&config).unwrap();
        tracing::subscriber::with_default(subscriber, || tracing::warn!("into state dir"));
        drop(guard);
        remove_env_var("NOTIFIER_STATE");

        let contents = std::fs::read_to_string(state_dir.join("notifier.log")).unwrap();
        assert!(contents.contains("into state dir"));
    }

    #[test]
    fn unopenable_log_file_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        let config = TracingConfig {
            log_file: Some(temp.path().join("missing").join("notifier.log")),
            ..TracingConfig::default()
        };

        let err = build_subscriber(&config).err().unwrap();
        assert!(matches!(err, TracingError::LogFileOpen { .. }));
    }
}
