pub mod types;

pub use types::{ChangedFile, PullRequestContext, PullRequestInfo};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;
use tracing::debug;

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "mjml2sendgrid";

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Failed to decode content of '{path}': {reason}")]
    Decode { path: String, reason: String },
}

/// Seam over the hosting API so the resolver and pipeline can be exercised
/// against in-memory fakes. The pull request context is fixed per client.
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// Fetch the pull request's metadata (head ref).
    async fn pull_request(&self) -> Result<PullRequestInfo, GithubError>;

    /// List the files changed in the pull request. Single page only; PRs
    /// larger than the API's default page are out of scope.
    async fn changed_files(&self) -> Result<Vec<ChangedFile>, GithubError>;

    /// Fetch one file's decoded text content at a specific ref.
    async fn file_at_ref(&self, path: &str, git_ref: &str) -> Result<String, GithubError>;

    /// Fetch a blob's decoded text content by SHA.
    async fn blob(&self, sha: &str) -> Result<String, GithubError>;
}

pub struct GithubClient {
    http: reqwest::Client,
    token: String,
    context: PullRequestContext,
}

impl GithubClient {
    pub fn new(token: String, context: PullRequestContext) -> GithubClient {
        GithubClient {
            http: reqwest::Client::new(),
            token,
            context,
        }
    }

    fn repo_url(&self, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            API_BASE, self.context.owner, self.context.repo, tail
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, GithubError> {
        debug!(%url, "GitHub GET");
        let response = self
            .http
            .get(url)
            .header("User-Agent", USER_AGENT)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}

/// Wrapper for the `contents` and `git/blobs` endpoints, both of which return
/// base64 text.
#[derive(serde::Deserialize)]
struct ContentResponse {
    content: String,
}

#[async_trait]
impl HostingApi for GithubClient {
    async fn pull_request(&self) -> Result<PullRequestInfo, GithubError> {
        #[derive(serde::Deserialize)]
        struct Head {
            #[serde(rename = "ref")]
            git_ref: String,
        }

        #[derive(serde::Deserialize)]
        struct PullResponse {
            head: Head,
        }

        let url = self.repo_url(&format!("pulls/{}", self.context.pr_number));
        let pull = self.get_json::<PullResponse>(&url).await?;
        Ok(PullRequestInfo {
            head_ref: pull.head.git_ref,
        })
    }

    async fn changed_files(&self) -> Result<Vec<ChangedFile>, GithubError> {
        let url = self.repo_url(&format!("pulls/{}/files", self.context.pr_number));
        self.get_json(&url).await
    }

    async fn file_at_ref(&self, path: &str, git_ref: &str) -> Result<String, GithubError> {
        let url = format!("{}?ref={}", self.repo_url(&format!("contents/{path}")), git_ref);
        let body = self.get_json::<ContentResponse>(&url).await?;
        decode_content(path, &body.content)
    }

    async fn blob(&self, sha: &str) -> Result<String, GithubError> {
        let url = self.repo_url(&format!("git/blobs/{sha}"));
        let body = self.get_json::<ContentResponse>(&url).await?;
        decode_content(sha, &body.content)
    }
}

/// GitHub wraps base64 payloads with newlines every 60 characters, so strip
/// all whitespace before decoding.
fn decode_content(path: &str, raw: &str) -> Result<String, GithubError> {
    let stripped: String = raw.split_whitespace().collect();
    let bytes = STANDARD
        .decode(stripped)
        .map_err(|err| GithubError::Decode {
            path: path.to_string(),
            reason: err.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|err| GithubError::Decode {
        path: path.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_content_plain() {
        // "hello world"
        let decoded = decode_content("a.txt", "aGVsbG8gd29ybGQ=").unwrap();
        assert_eq!(decoded, "hello world");
    }

    #[test]
    fn test_decode_content_with_embedded_newlines() {
        // GitHub's content responses split the base64 across lines.
        let raw = "PG1qbWw+PG1qLWJvZHk+PG1qLXRleHQ+aGVsbG88\nL21qLXRleHQ+PC9tai1ib2R5\nPjwvbWptbD4=\n";
        let decoded = decode_content("t.mjml", raw).unwrap();
        assert_eq!(
            decoded,
            "<mjml><mj-body><mj-text>hello</mj-text></mj-body></mjml>"
        );
    }

    #[test]
    fn test_decode_content_rejects_invalid_base64() {
        let err = decode_content("bad.txt", "!!not base64!!").unwrap_err();
        match err {
            GithubError::Decode { path, .. } => assert_eq!(path, "bad.txt"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_repo_url_layout() {
        let client = GithubClient::new(
            "token".to_string(),
            PullRequestContext {
                owner: "acme".to_string(),
                repo: "emails".to_string(),
                pr_number: 12,
            },
        );
        assert_eq!(
            client.repo_url("pulls/12/files"),
            "https://api.github.com/repos/acme/emails/pulls/12/files"
        );
    }
}
