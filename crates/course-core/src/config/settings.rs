//! Raw configuration as read from `config.yml`

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Environment variable overriding `api_token`
pub const TOKEN_ENV: &str = "COURSEWORK_TOKEN";

/// Environment variable overriding `base_url`
pub const BASE_URL_ENV: &str = "COURSEWORK_BASE_URL";

/// Environment variable overriding `root_dir`
pub const ROOT_DIR_ENV: &str = "COURSEWORK_ROOT_DIR";

/// Batch concurrency when `workers` is not configured
pub const DEFAULT_WORKERS: usize = 5;

/// Configuration file contents before validation.
///
/// Every field is optional here so that validation can report all missing
/// keys at once instead of failing on the first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<String>,

    /// Course metadata extraction rules, validated into
    /// [`RegexRule`](crate::course::RegexRule)s.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regexes: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

impl Config {
    /// Apply environment overrides from `lookup` (normally
    /// `std::env::var(..).ok()`).
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(token) = lookup(TOKEN_ENV) {
            self.api_token = Some(token);
        }
        if let Some(url) = lookup(BASE_URL_ENV) {
            self.base_url = Some(url);
        }
        if let Some(root) = lookup(ROOT_DIR_ENV) {
            self.root_dir = Some(root);
        }
        self
    }

    /// `root_dir` with a leading `~` expanded.
    pub fn root_dir_path(&self) -> Option<PathBuf> {
        self.root_dir.as_deref().map(expand_home)
    }

    pub fn workers(&self) -> usize {
        self.workers.filter(|w| *w > 0).unwrap_or(DEFAULT_WORKERS)
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let path = path.trim();
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn env_overrides_file_values() {
        let config = Config {
            api_token: Some("file-token".into()),
            base_url: Some("https://file/api/v1".into()),
            ..Config::default()
        };

        let config = config.apply_env(|key| match key {
            TOKEN_ENV => Some("env-token".into()),
            ROOT_DIR_ENV => Some("/srv/courses".into()),
            _ => None,
        });

        assert_eq!(config.api_token.as_deref(), Some("env-token"));
        assert_eq!(config.base_url.as_deref(), Some("https://file/api/v1"));
        assert_eq!(config.root_dir.as_deref(), Some("/srv/courses"));
    }

    #[test]
    fn workers_default_and_zero() {
        assert_eq!(Config::default().workers(), DEFAULT_WORKERS);
        let config = Config {
            workers: Some(0),
            ..Config::default()
        };
        assert_eq!(config.workers(), DEFAULT_WORKERS);
    }

    #[test]
    fn absolute_paths_are_untouched() {
        assert_eq!(expand_home("/srv/courses"), PathBuf::from("/srv/courses"));
    }

    #[test]
    fn deserializes_template_shape() {
        let config: Config = serde_yaml::from_str(
            "api_token: t\nbase_url: https://lms/api/v1\nroot_dir: /tmp\nregexes:\n  - key: name\n    regex: ^(?P<name>.*)$\n",
        )
        .unwrap();
        assert_eq!(config.regexes.map(|r| r.len()), Some(1));
    }
}
