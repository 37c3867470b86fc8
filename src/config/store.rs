use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::paths::Paths;
use crate::config::schema::{ChannelConfig, Config, NotifiersConfig};
use crate::notify::channel::ChannelKind;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Lock acquisition timeout")]
    LockTimeout,
}

/// The TOML file backing a [`Config`], with locked atomic writes.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl ConfigFile {
    pub fn new() -> Self {
        Self::with_path(Paths::config_file())
    }

    pub fn with_path(path: PathBuf) -> Self {
        let lock_path = path.with_extension("toml.lock");
        Self {
            path,
            lock_path,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the config; a missing file yields the built-in defaults.
    ///
    /// Reading never creates the lock file. When no lock file can be opened (none was
    /// ever written, or the directory belongs to someone else) the file is read without
    /// a lock.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Config file not found; using defaults");
            return Ok(Config::default());
        }

        match OpenOptions::new().read(true).open(&self.lock_path) {
            Ok(lock_file) => {
                self.lock_with_timeout(|| fs2::FileExt::try_lock_shared(&lock_file))?;
                self.read_unlocked()
            }
            Err(err) => {
                debug!(
                    path = %self.lock_path.display(),
                    error = %err,
                    "Lock file unavailable; reading config unlocked"
                );
                self.read_unlocked()
            }
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let lock_file = self.open_lock_file()?;
        self.lock_with_timeout(|| fs2::FileExt::try_lock_exclusive(&lock_file))?;
        self.write_unlocked(config)
    }

    /// Read-modify-write under a single exclusive lock.
    pub fn update<F>(&self, apply: F) -> Result<Config, ConfigError>
    where
        F: FnOnce(&mut Config),
    {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let lock_file = self.open_lock_file()?;
        self.lock_with_timeout(|| fs2::FileExt::try_lock_exclusive(&lock_file))?;

        let mut config = if self.path.exists() {
            self.read_unlocked()?
        } else {
            Config::default()
        };
        apply(&mut config);
        self.write_unlocked(&config)?;
        Ok(config)
    }

    fn read_unlocked(&self) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write_unlocked(&self, config: &Config) -> Result<(), ConfigError> {
        let temp_path = self.path.with_extension("toml.tmp");
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;

        let contents = toml::to_string_pretty(config)?;
        temp_file.write_all(contents.as_bytes())?;
        temp_file.sync_all()?;
        apply_owner_permissions(&temp_path)?;

        fs::rename(&temp_path, &self.path)?;
        info!(path = %self.path.display(), "Config persisted");
        Ok(())
    }

    fn open_lock_file(&self) -> Result<File, ConfigError> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)?;
        apply_owner_permissions(&self.lock_path)?;
        Ok(file)
    }

    fn lock_with_timeout<F>(&self, mut try_lock: F) -> Result<(), ConfigError>
    where
        F: FnMut() -> io::Result<()>,
    {
        let start = Instant::now();
        loop {
            match try_lock() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    if start.elapsed() >= self.lock_timeout {
                        return Err(ConfigError::LockTimeout);
                    }
                    sleep(Duration::from_millis(50));
                }
                Err(err) => return Err(ConfigError::Io(err)),
            }
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_owner_permissions(path: &Path) -> Result<(), ConfigError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Per-channel settings for the lifetime of the process.
///
/// Dispatch borrows the store immutably and `toggle` needs `&mut self`, so a toggle can
/// never overlap an in-flight dispatch.
#[derive(Debug, Clone)]
pub struct ChannelConfigStore {
    notifiers: NotifiersConfig,
    file: Option<ConfigFile>,
}

impl ChannelConfigStore {
    /// In-memory store; toggles are not persisted.
    pub fn new(notifiers: NotifiersConfig) -> Self {
        Self {
            notifiers,
            file: None,
        }
    }

    /// Store whose toggles are written back to `file`.
    pub fn with_file(notifiers: NotifiersConfig, file: ConfigFile) -> Self {
        Self {
            notifiers,
            file: Some(file),
        }
    }

    pub fn load(file: ConfigFile) -> Result<Self, ConfigError> {
        let config = file.load()?;
        Ok(Self::with_file(config.notifiers, file))
    }

    pub fn get(&self, kind: ChannelKind) -> ChannelConfig {
        self.notifiers.get(kind)
    }

    pub fn is_enabled(&self, kind: ChannelKind) -> bool {
        self.get(kind).enabled()
    }

    /// Flips the enabled flag of `kind` and persists it. Returns the new state.
    pub fn toggle(&mut self, kind: ChannelKind) -> Result<bool, ConfigError> {
        let enabled = !self.is_enabled(kind);
        if let Some(file) = &self.file {
            file.update(|config| *config.notifiers.enabled_mut(kind) = enabled)?;
        }
        *self.notifiers.enabled_mut(kind) = enabled;
        info!(channel = kind.label(), enabled, "Toggled channel state");
        Ok(enabled)
    }

    pub fn notifiers(&self) -> &NotifiersConfig {
        &self.notifiers
    }
}
