//! Configuration validation
//!
//! Validation collects every problem before failing so a user fixes their
//! config in one pass. The remote probe only runs when both the base URL and
//! the token are present.

use std::path::PathBuf;
use std::sync::Arc;

use course_remote::{Api, HttpClient};
use course_remote::metadata::DEFAULT_NAMESPACE;
use tracing::debug;

use super::settings::Config;
use crate::course::RegexRule;
use crate::{Error, Result};

/// A configuration that passed every check.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub api: Api,
    pub root_dir: PathBuf,
    pub rules: Vec<RegexRule>,
    pub namespace: String,
    pub workers: usize,
}

/// Check a configuration and build the API handle it describes.
///
/// # Errors
///
/// Returns [`Error::Configuration`] listing every reason the configuration
/// is unusable.
pub fn validate(config: &Config, client: Arc<dyn HttpClient>) -> Result<ValidatedConfig> {
    let mut reasons = Vec::new();

    let missing: Vec<&str> = [
        ("api_token", config.api_token.is_none()),
        ("base_url", config.base_url.is_none()),
        ("regexes", config.regexes.is_none()),
        ("root_dir", config.root_dir.is_none()),
    ]
    .into_iter()
    .filter_map(|(key, absent)| absent.then_some(key))
    .collect();
    if !missing.is_empty() {
        reasons.push(format!("The following keys are missing: {}", missing.join(", ")));
    }

    let root_dir = config.root_dir_path();
    if let Some(root) = &root_dir
        && !root.exists()
    {
        reasons.push(format!(
            "Root directory (\"root_dir\") does not exist: {}",
            root.display()
        ));
    }

    let mut rules = Vec::new();
    for (i, value) in config.regexes.iter().flatten().enumerate() {
        match RegexRule::from_value(value) {
            Ok(rule) => rules.push(rule),
            Err(problems) => reasons.push(format!(
                "Invalid regex {} ({value}): {}",
                i + 1,
                problems.join("; ")
            )),
        }
    }

    let api = match (&config.base_url, &config.api_token) {
        (Some(base_url), Some(token)) => {
            let api = Api::new(base_url.trim(), token.trim(), client);
            if let Some(reason) = probe(&api) {
                reasons.push(reason);
            }
            Some(api)
        }
        _ => None,
    };

    match (api, root_dir) {
        (Some(api), Some(root_dir)) if reasons.is_empty() => Ok(ValidatedConfig {
            api,
            root_dir,
            rules,
            namespace: config
                .namespace
                .clone()
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            workers: config.workers(),
        }),
        _ => Err(Error::Configuration(reasons)),
    }
}

/// Ask the LMS who the token belongs to. Returns a reason on failure.
fn probe(api: &Api) -> Option<String> {
    let response = match api.whoami() {
        Ok(response) => response,
        Err(e) => return Some(format!("Problem accessing the API at {}: {e}", api.base_url())),
    };
    debug!(status = response.status, "Probed users/self");
    match response.status {
        _ if response.is_success() => None,
        404 => Some(format!(
            "\"base_url\" does not point at the LMS REST API: {}",
            api.base_url()
        )),
        401 => Some("\"api_token\" does not give access to the LMS REST API".to_string()),
        status => Some(format!(
            "The LMS REST API at {} answered users/self with status {status}; check \"api_token\" and \"base_url\"",
            api.base_url()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_remote::{HttpRequest, HttpResponse};
    use serde_json::json;

    struct Status(u16);

    impl HttpClient for Status {
        fn execute(&self, _request: HttpRequest) -> course_remote::Result<HttpResponse> {
            Ok(HttpResponse::json_body(self.0, &json!({"id": 1})))
        }
    }

    fn config(root: &std::path::Path) -> Config {
        Config {
            api_token: Some("t".into()),
            base_url: Some("https://lms/api/v1".into()),
            root_dir: Some(root.display().to_string()),
            regexes: Some(vec![json!({"key": "name", "regex": "^(?P<name>.*)$"})]),
            ..Config::default()
        }
    }

    fn reasons(result: Result<ValidatedConfig>) -> Vec<String> {
        match result {
            Err(Error::Configuration(reasons)) => reasons,
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("configuration unexpectedly valid"),
        }
    }

    #[test]
    fn valid_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let validated = validate(&config(dir.path()), Arc::new(Status(200))).unwrap();
        assert_eq!(validated.rules.len(), 1);
        assert_eq!(validated.namespace, DEFAULT_NAMESPACE);
        assert_eq!(validated.workers, 5);
    }

    #[test]
    fn every_reason_is_reported() {
        let config = Config {
            root_dir: Some("/definitely/not/here".into()),
            regexes: Some(vec![json!({"regex": "("})]),
            ..Config::default()
        };

        let reasons = reasons(validate(&config, Arc::new(Status(200))));

        assert_eq!(reasons.len(), 3, "{reasons:?}");
        assert!(reasons[0].contains("api_token, base_url"));
        assert!(reasons[1].contains("does not exist"));
        assert!(reasons[2].starts_with("Invalid regex 1"));
    }

    #[test]
    fn probe_statuses_name_the_culprit() {
        let dir = tempfile::tempdir().unwrap();
        let not_found = reasons(validate(&config(dir.path()), Arc::new(Status(404))));
        assert!(not_found[0].contains("\"base_url\""));

        let unauthorized = reasons(validate(&config(dir.path()), Arc::new(Status(401))));
        assert!(unauthorized[0].contains("\"api_token\""));

        let other = reasons(validate(&config(dir.path()), Arc::new(Status(503))));
        assert!(other[0].contains("503"));
    }
}
