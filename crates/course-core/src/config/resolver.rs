//! Locating and loading the configuration file
//!
//! The `ConfigResolver` finds `config.yml`, writes the commented template on
//! first use, reads it, and layers environment overrides on top.

use std::fs;
use std::path::{Path, PathBuf};

use course_fs::ConfigStore;
use tracing::{debug, warn};

use super::settings::Config;
use crate::{Error, Result};

/// Commented starting point written when no config file exists yet
pub const CONFIG_TEMPLATE: &str = include_str!("template.yml");

/// Name of the configuration directory below the platform config dir
pub const APP_DIR: &str = "coursework";

/// Name of the configuration file
pub const CONFIG_FILE: &str = "config.yml";

/// Resolves the configuration file location and its contents
///
/// The file lives at `<config_dir>/coursework/config.yml`:
/// - Linux: `~/.config/coursework/config.yml`
/// - macOS: `~/Library/Application Support/coursework/config.yml`
/// - Windows: `%APPDATA%\coursework\config.yml`
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    /// Explicit config file, e.g. from `--config-path`.
    path: Option<PathBuf>,

    /// Override for the config directory (used for testing).
    /// When `None`, the platform-appropriate directory is used via `dirs::config_dir()`.
    config_dir_override: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit configuration file. It must already exist.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config_dir_override: None,
        }
    }

    /// Create a resolver with a custom config directory.
    ///
    /// This is primarily useful for testing, where you need to control
    /// the config path without affecting the real user config.
    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: None,
            config_dir_override: Some(config_dir.into()),
        }
    }

    fn config_dir(&self) -> Option<PathBuf> {
        if let Some(ref override_dir) = self.config_dir_override {
            return Some(override_dir.clone());
        }
        dirs::config_dir().map(|d| d.join(APP_DIR))
    }

    /// Path of the configuration file this resolver reads.
    pub fn config_path(&self) -> Option<PathBuf> {
        match &self.path {
            Some(path) => Some(path.clone()),
            None => self.config_dir().map(|d| d.join(CONFIG_FILE)),
        }
    }

    /// Load the configuration file without environment overrides.
    ///
    /// The default location is initialized from [`CONFIG_TEMPLATE`] if it
    /// does not exist; an explicit path must exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if no path can be determined or an
    /// explicit path is missing, and a filesystem error if the file cannot
    /// be created or parsed.
    pub fn load_file(&self) -> Result<Config> {
        let path = self.config_path().ok_or_else(|| {
            Error::Configuration(vec!["Could not determine the configuration directory".into()])
        })?;

        if self.path.is_some() {
            if !path.exists() {
                return Err(Error::Configuration(vec![format!(
                    "Config path does not exist: {}",
                    path.display()
                )]));
            }
        } else if !path.exists() {
            init_config(&path)?;
        }

        debug!(path = %path.display(), "Loading configuration");
        Ok(ConfigStore::new().load(&path)?)
    }

    /// Load the configuration and apply `COURSEWORK_*` environment
    /// overrides.
    pub fn resolve(&self) -> Result<Config> {
        Ok(self.load_file()?.apply_env(|key| std::env::var(key).ok()))
    }
}

/// Write the configuration template to `path`, creating its directory
/// (mode 0700 on unix).
pub fn init_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_private_dir(parent)?;
    }
    course_fs::io::write_text(path, CONFIG_TEMPLATE)?;
    warn!(
        path = %path.display(),
        "Created configuration template; fill in api_token, base_url and root_dir"
    );
    Ok(())
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
        .map_err(|e| course_fs::Error::io(dir, e).into())
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| course_fs::Error::io(dir, e).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn template_is_written_on_first_use() {
        let dir = TempDir::new().unwrap();
        let resolver = ConfigResolver::with_config_dir(dir.path().join("coursework"));

        let config = resolver.load_file().unwrap();

        let path = dir.path().join("coursework").join(CONFIG_FILE);
        assert!(path.exists());
        assert_eq!(config.root_dir.as_deref(), Some("~/courses"));
        assert_eq!(config.regexes.map(|r| r.len()), Some(7));
    }

    #[cfg(unix)]
    #[test]
    fn config_dir_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join("coursework");
        ConfigResolver::with_config_dir(&config_dir).load_file().unwrap();

        let mode = fs::metadata(&config_dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let resolver = ConfigResolver::with_path(dir.path().join("missing.yml"));
        assert!(matches!(resolver.load_file(), Err(Error::Configuration(_))));
    }

    #[test]
    fn explicit_path_is_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cw.yml");
        fs::write(&path, "api_token: abc\nworkers: 3\n").unwrap();

        let config = ConfigResolver::with_path(&path).load_file().unwrap();

        assert_eq!(config.api_token.as_deref(), Some("abc"));
        assert_eq!(config.workers(), 3);
    }
}
