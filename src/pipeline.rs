use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::github::{ChangedFile, GithubError, HostingApi};
use crate::report::{FileOutcome, FileReport, RunSummary};
use crate::sendgrid::{SendGridError, TemplateStore};
use crate::template::{self, CompileError, ResolveError};

/// Repository path of the tool's own configuration file, read at the PR head
/// ref. The schema is not interpreted here; it only has to be valid JSON.
pub const REPO_CONFIG_PATH: &str = "mjmj2sendgrid.json";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Github(#[from] GithubError),

    #[error("Failed to parse mjmj2sendgrid.json: {0}")]
    RepoConfig(#[from] serde_json::Error),
}

/// Errors inside a single file's sub-pipeline. These are isolated per file
/// and surfaced through the run summary, never aborting sibling files.
#[derive(Debug, Error)]
enum FileSyncError {
    #[error(transparent)]
    Github(#[from] GithubError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    SendGrid(#[from] SendGridError),
}

/// Run the whole pipeline: resolve the PR, filter changed files to `.mjml`,
/// and sync each qualifying file independently. All per-file futures are
/// joined before returning, and one file's failure never stops the others.
pub async fn run(
    repo: &dyn HostingApi,
    store: &dyn TemplateStore,
) -> Result<RunSummary, PipelineError> {
    let pr = repo.pull_request().await?;
    debug!(head_ref = %pr.head_ref, "resolved pull request head");

    let raw_config = repo.file_at_ref(REPO_CONFIG_PATH, &pr.head_ref).await?;
    let _repo_config: serde_json::Value = serde_json::from_str(&raw_config)?;
    debug!("loaded repository config");

    let changed = repo.changed_files().await?;
    let mjml_files: Vec<ChangedFile> = changed
        .into_iter()
        .filter(|file| file.filename.contains(".mjml"))
        .collect();

    if mjml_files.is_empty() {
        warn!("No mjml file found");
        return Ok(RunSummary::default());
    }
    info!(files = mjml_files.len(), "syncing changed mjml files");

    let reports = join_all(mjml_files.iter().map(|file| {
        sync_file(repo, store, file, &pr.head_ref)
            .instrument(info_span!("sync_file", file = %file.filename))
    }))
    .await;

    Ok(RunSummary { files: reports })
}

async fn sync_file(
    repo: &dyn HostingApi,
    store: &dyn TemplateStore,
    file: &ChangedFile,
    head_ref: &str,
) -> FileReport {
    let outcome = match sync_file_inner(repo, store, file, head_ref).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(error = %err, "file sync failed");
            FileOutcome::Failed {
                error: err.to_string(),
            }
        }
    };
    FileReport {
        filename: file.filename.clone(),
        outcome,
    }
}

async fn sync_file_inner(
    repo: &dyn HostingApi,
    store: &dyn TemplateStore,
    file: &ChangedFile,
    head_ref: &str,
) -> Result<FileOutcome, FileSyncError> {
    let text = repo.blob(&file.sha).await?;

    let Some(resolved) = template::resolve(repo, &text, head_ref).await? else {
        return Ok(FileOutcome::Skipped {
            reason: "no template marker".to_string(),
        });
    };

    // A marker with an empty capture is treated as "not a template" rather
    // than patching a template with an empty id.
    if resolved.template_id.is_empty() {
        warn!("template marker has an empty id, skipping");
        return Ok(FileOutcome::Skipped {
            reason: "empty template id".to_string(),
        });
    }

    let html = template::compile(&resolved.markup)?;

    let version = store.active_version(&resolved.template_id).await?;
    store
        .patch_version(&resolved.template_id, &version, &html)
        .await?;
    info!(template_id = %resolved.template_id, version = %version.id, "patched active version");

    Ok(FileOutcome::Synced {
        template_id: resolved.template_id,
    })
}
