use serde::Deserialize;

/// Coordinates of the pull request this run operates on.
/// Resolved once from configuration; immutable for the rest of the run.
#[derive(Debug, Clone)]
pub struct PullRequestContext {
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
}

/// The subset of pull request metadata the pipeline needs: the head ref is
/// where include partials and the repository config file are read from.
#[derive(Debug, Clone)]
pub struct PullRequestInfo {
    pub head_ref: String,
}

/// One entry from the PR's changed-files listing. Field names match the
/// GitHub REST response so this deserializes directly.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    pub sha: String,
}
