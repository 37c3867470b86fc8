use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Platform-specific path resolution for notifier.
pub struct Paths;

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory { path: PathBuf, source: io::Error },
}

impl Paths {
    /// Returns the configuration directory path.
    /// - Linux: ~/.config/notifier/
    /// - macOS: ~/Library/Application Support/notifier/
    /// - Override: NOTIFIER_CONFIG env var (directory derived from file path)
    pub fn config_dir() -> PathBuf {
        if let Ok(path) = env::var("NOTIFIER_CONFIG") {
            let path = PathBuf::from(path);
            return path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or(path);
        }

        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("notifier")
    }

    /// Returns the full config file path.
    pub fn config_file() -> PathBuf {
        if let Ok(path) = env::var("NOTIFIER_CONFIG") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Returns the state directory path (default log location).
    /// - Linux: ~/.local/state/notifier/
    /// - elsewhere: the config directory
    /// - Override: NOTIFIER_STATE env var
    pub fn state_dir() -> PathBuf {
        if let Ok(path) = env::var("NOTIFIER_STATE") {
            return PathBuf::from(path);
        }

        #[cfg(target_os = "linux")]
        {
            dirs::state_dir()
                .or_else(|| dirs::home_dir().map(|home| home.join(".local/state")))
                .unwrap_or_else(|| PathBuf::from(".local/state"))
                .join("notifier")
        }

        #[cfg(not(target_os = "linux"))]
        {
            Self::config_dir()
        }
    }

    /// Ensures the state directory exists, creating it if necessary.
    pub fn ensure_state_dir() -> Result<PathBuf, PathError> {
        let dir = Self::state_dir();
        fs::create_dir_all(&dir).map_err(|source| PathError::CreateDirectory {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ENV_LOCK;

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
    fn test_env_override_config_file() {
        let _lock = ENV_LOCK.lock().unwrap();
        let temp = tempfile::tempdir().unwrap();
        let config_path = temp.path().join("config.toml");

        set_env_var("NOTIFIER_CONFIG", &config_path);
        assert_eq!(Paths::config_file(), config_path);
        assert_eq!(Paths::config_dir(), temp.path());
        remove_env_var("NOTIFIER_CONFIG");
    }

    #[test]
    fn test_env_override_state_dir() {
        let _lock = ENV_LOCK.lock().unwrap();
        let temp = tempfile::tempdir().unwrap();
        let state_path = temp.path().join("state");

        set_env_var("NOTIFIER_STATE", &state_path);
        assert_eq!(Paths::state_dir(), state_path);
        remove_env_var("NOTIFIER_STATE");
    }

    #[test]
    fn test_default_config_file_name() {
        let _lock = ENV_LOCK.lock().unwrap();
        remove_env_var("NOTIFIER_CONFIG");

        let file = Paths::config_file();
        assert!(file.ends_with("notifier/config.toml"));
    }

    #[test]
    fn test_ensure_state_dir_creates_missing_directory() {
        let _lock = ENV_LOCK.lock().unwrap();
        let temp = tempfile::tempdir().unwrap();
        let state_path = temp.path().join("nested").join("state");

        set_env_var("NOTIFIER_STATE", &state_path);
        let state_dir = Paths::ensure_state_dir().unwrap();
        assert!(state_dir.exists());
        remove_env_var("NOTIFIER_STATE");
    }
}
