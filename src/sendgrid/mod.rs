pub mod types;

pub use types::TemplateVersion;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use types::{TemplateResponse, VersionPatch};

const API_BASE: &str = "https://api.sendgrid.com";

#[derive(Debug, Error)]
pub enum SendGridError {
    #[error("SendGrid API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("No active version found for template '{0}'")]
    NoActiveVersion(String),
}

/// Seam over the template service. Reads the active version of a template
/// and overwrites its HTML, never touching name or subject.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn active_version(&self, template_id: &str) -> Result<TemplateVersion, SendGridError>;

    async fn patch_version(
        &self,
        template_id: &str,
        version: &TemplateVersion,
        html: &str,
    ) -> Result<(), SendGridError>;
}

pub struct SendGridClient {
    http: reqwest::Client,
    api_key: String,
}

impl SendGridClient {
    pub fn new(api_key: String) -> SendGridClient {
        SendGridClient {
            http: reqwest::Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl TemplateStore for SendGridClient {
    async fn active_version(&self, template_id: &str) -> Result<TemplateVersion, SendGridError> {
        let url = format!("{API_BASE}/v3/templates/{template_id}");
        debug!(%url, "SendGrid GET");
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?;

        let template = response.json::<TemplateResponse>().await?;
        select_active(template.versions)
            .ok_or_else(|| SendGridError::NoActiveVersion(template_id.to_string()))
    }

    async fn patch_version(
        &self,
        template_id: &str,
        version: &TemplateVersion,
        html: &str,
    ) -> Result<(), SendGridError> {
        let url = format!("{API_BASE}/v3/templates/{template_id}/versions/{}", version.id);
        debug!(%url, "SendGrid PATCH");
        self.http
            .patch(&url)
            .bearer_auth(&self.api_key)
            .json(&VersionPatch {
                name: &version.name,
                subject: &version.subject,
                html_content: html,
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

fn select_active(versions: Vec<TemplateVersion>) -> Option<TemplateVersion> {
    versions.into_iter().find(TemplateVersion::is_active)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(id: &str, active: u8) -> TemplateVersion {
        TemplateVersion {
            id: id.to_string(),
            name: format!("{id} name"),
            subject: "subject".to_string(),
            active,
        }
    }

    #[test]
    fn test_select_active_picks_flagged_version() {
        let selected = select_active(vec![version("v1", 0), version("v2", 1), version("v3", 0)]);
        assert_eq!(selected.unwrap().id, "v2");
    }

    #[test]
    fn test_select_active_none_when_no_flag() {
        assert!(select_active(vec![version("v1", 0), version("v2", 0)]).is_none());
    }

    #[test]
    fn test_select_active_empty_list() {
        assert!(select_active(Vec::new()).is_none());
    }
}
