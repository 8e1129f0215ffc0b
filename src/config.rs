use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("'{input}' input missing, please include it in your workflow settings 'with' section as '{example}'")]
    MissingSecret {
        input: &'static str,
        example: &'static str,
    },

    #[error("Failed to read CI event payload: {0}")]
    EventRead(#[from] std::io::Error),

    #[error("Failed to parse CI event payload: {0}")]
    EventParse(#[from] serde_json::Error),

    #[error("Could not resolve {0}: pass it as a flag, set the environment variable, or run inside a pull_request workflow")]
    MissingCoordinate(&'static str),
}

/// Everything the pipeline needs to authenticate and locate the pull request.
/// Resolved once at startup; immutable afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub sendgrid_api_key: String,
    pub github_token: String,
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
}

/// Repository coordinates supplied on the command line. Anything left unset
/// falls back to `GITHUB_OWNER`/`GITHUB_REPO`/`GITHUB_PR`, then to the
/// workflow event payload.
#[derive(Debug, Default)]
pub struct Overrides {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub pr_number: Option<u64>,
    pub event_path: Option<PathBuf>,
}

impl Config {
    /// Load secrets and repository coordinates from the environment.
    /// Fails before any network call if either secret is missing or empty.
    pub fn load(overrides: &Overrides) -> Result<Config, ConfigError> {
        let sendgrid_api_key = require_secret(
            "SENDGRID_API_KEY",
            "sendgrid-api-key",
            "sendgrid-api-key: ${{ secrets.sendgrid_api_key }}",
        )?;
        let github_token = require_secret(
            "GITHUB_TOKEN",
            "github-token",
            "github-token: ${{ secrets.github_token }}",
        )?;

        let owner = overrides.owner.clone().or_else(|| env_value("GITHUB_OWNER"));
        let repo = overrides.repo.clone().or_else(|| env_value("GITHUB_REPO"));
        let pr_number = overrides
            .pr_number
            .or_else(|| env_value("GITHUB_PR").and_then(|v| v.parse().ok()));

        // The event payload is only read when a coordinate is still
        // unresolved, so fully specified invocations work outside CI.
        let (owner, repo, pr_number) = match (owner, repo, pr_number) {
            (Some(owner), Some(repo), Some(pr_number)) => (owner, repo, pr_number),
            (owner, repo, pr_number) => {
                let payload = EventPayload::load(&event_path(overrides)?)?;
                (
                    owner
                        .or_else(|| payload.owner())
                        .ok_or(ConfigError::MissingCoordinate("repository owner"))?,
                    repo.or_else(|| payload.repo())
                        .ok_or(ConfigError::MissingCoordinate("repository name"))?,
                    pr_number
                        .or(payload.number)
                        .ok_or(ConfigError::MissingCoordinate("pull request number"))?,
                )
            }
        };

        Ok(Config {
            sendgrid_api_key,
            github_token,
            owner,
            repo,
            pr_number,
        })
    }
}

fn require_secret(
    var: &str,
    input: &'static str,
    example: &'static str,
) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingSecret { input, example }),
    }
}

fn env_value(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

fn event_path(overrides: &Overrides) -> Result<PathBuf, ConfigError> {
    overrides
        .event_path
        .clone()
        .or_else(|| env_value("GITHUB_EVENT_PATH").map(PathBuf::from))
        .ok_or(ConfigError::MissingCoordinate("event payload path"))
}

/// The slice of the GitHub Actions `pull_request` event payload this tool
/// cares about. All fields are optional so non-PR payloads degrade to a
/// coordinate-resolution error instead of a parse error.
#[derive(Debug, Deserialize)]
pub struct EventPayload {
    pub number: Option<u64>,
    pub repository: Option<EventRepository>,
}

#[derive(Debug, Deserialize)]
pub struct EventRepository {
    pub name: String,
    pub owner: EventOwner,
}

#[derive(Debug, Deserialize)]
pub struct EventOwner {
    pub login: String,
}

impl EventPayload {
    pub fn load(path: &Path) -> Result<EventPayload, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn owner(&self) -> Option<String> {
        self.repository.as_ref().map(|r| r.owner.login.clone())
    }

    fn repo(&self) -> Option<String> {
        self.repository.as_ref().map(|r| r.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_missing_secret_message_names_workflow_input() {
        let err = require_secret(
            "MJML2SENDGRID_TEST_UNSET",
            "sendgrid-api-key",
            "sendgrid-api-key: ${{ secrets.sendgrid_api_key }}",
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'sendgrid-api-key' input missing"));
        assert!(message.contains("secrets.sendgrid_api_key"));
    }

    #[test]
    fn test_event_payload_parse() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"number": 7, "repository": {{"name": "emails", "owner": {{"login": "acme"}}}}}}"#
        )
        .unwrap();

        let payload = EventPayload::load(file.path()).unwrap();
        assert_eq!(payload.number, Some(7));
        assert_eq!(payload.owner().as_deref(), Some("acme"));
        assert_eq!(payload.repo().as_deref(), Some("emails"));
    }

    #[test]
    fn test_event_payload_without_pr_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"ref": "refs/heads/main"}}"#).unwrap();

        let payload = EventPayload::load(file.path()).unwrap();
        assert_eq!(payload.number, None);
        assert!(payload.owner().is_none());
    }

    #[test]
    #[serial]
    fn test_load_with_full_overrides_never_reads_event_payload() {
        std::env::set_var("SENDGRID_API_KEY", "sg-key");
        std::env::set_var("GITHUB_TOKEN", "gh-token");

        // The event path points at a file that does not exist: if the
        // payload were read, load would fail with EventRead.
        let overrides = Overrides {
            owner: Some("acme".to_string()),
            repo: Some("emails".to_string()),
            pr_number: Some(12),
            event_path: Some(PathBuf::from("/nonexistent/event.json")),
        };

        let config = Config::load(&overrides).unwrap();
        assert_eq!(config.owner, "acme");
        assert_eq!(config.repo, "emails");
        assert_eq!(config.pr_number, 12);
        assert_eq!(config.sendgrid_api_key, "sg-key");
        assert_eq!(config.github_token, "gh-token");
    }

    #[test]
    #[serial]
    fn test_load_coordinate_precedence_override_env_payload() {
        std::env::set_var("SENDGRID_API_KEY", "sg-key");
        std::env::set_var("GITHUB_TOKEN", "gh-token");
        std::env::set_var("GITHUB_OWNER", "env-owner");
        std::env::remove_var("GITHUB_REPO");
        std::env::remove_var("GITHUB_PR");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"number": 9, "repository": {{"name": "payload-repo", "owner": {{"login": "payload-owner"}}}}}}"#
        )
        .unwrap();

        let overrides = Overrides {
            owner: None,
            repo: Some("override-repo".to_string()),
            pr_number: None,
            event_path: Some(file.path().to_path_buf()),
        };

        let config = Config::load(&overrides).unwrap();
        // Flag beats env beats payload; anything unresolved comes from
        // the payload.
        assert_eq!(config.owner, "env-owner");
        assert_eq!(config.repo, "override-repo");
        assert_eq!(config.pr_number, 9);

        std::env::remove_var("GITHUB_OWNER");
    }

    #[test]
    fn test_event_path_prefers_override() {
        let overrides = Overrides {
            event_path: Some(PathBuf::from("/tmp/event.json")),
            ..Overrides::default()
        };
        assert_eq!(
            event_path(&overrides).unwrap(),
            PathBuf::from("/tmp/event.json")
        );
    }
}
