mod config;
mod github;
mod pipeline;
mod report;
mod sendgrid;
mod template;

use clap::Parser;
use std::path::PathBuf;
use tracing::{info, info_span, warn};
use tracing_subscriber::EnvFilter;

use github::{GithubClient, PullRequestContext};
use sendgrid::SendGridClient;

/// mjml2sendgrid — CI step that compiles the MJML templates changed in a
/// pull request and pushes the HTML to the matching SendGrid template's
/// active version.
///
/// Requires SENDGRID_API_KEY and GITHUB_TOKEN in the environment. Repository
/// coordinates fall back to GITHUB_OWNER/GITHUB_REPO/GITHUB_PR, then to the
/// workflow event payload at GITHUB_EVENT_PATH.
#[derive(Parser, Debug)]
#[command(name = "mjml2sendgrid", version, about)]
struct Cli {
    /// Repository owner (overrides GITHUB_OWNER / event payload)
    #[arg(long)]
    owner: Option<String>,

    /// Repository name (overrides GITHUB_REPO / event payload)
    #[arg(long)]
    repo: Option<String>,

    /// Pull request number (overrides GITHUB_PR / event payload)
    #[arg(long)]
    pr: Option<u64>,

    /// Path to the CI event payload (overrides GITHUB_EVENT_PATH)
    #[arg(long)]
    event_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let cfg = config::Config::load(&config::Overrides {
        owner: cli.owner,
        repo: cli.repo,
        pr_number: cli.pr,
        event_path: cli.event_path,
    })?;

    let _main_span = info_span!(
        "sync",
        owner = %cfg.owner,
        repo = %cfg.repo,
        pr = cfg.pr_number
    )
    .entered();

    let repo = GithubClient::new(
        cfg.github_token.clone(),
        PullRequestContext {
            owner: cfg.owner.clone(),
            repo: cfg.repo.clone(),
            pr_number: cfg.pr_number,
        },
    );
    let store = SendGridClient::new(cfg.sendgrid_api_key.clone());

    info!("running sync pipeline");
    let summary = pipeline::run(&repo, &store).await?;
    report::print_summary(&summary);

    if summary.has_failures() {
        warn!(failed = summary.failed(), "run finished with failures");
        return Err(format!("{} file(s) failed to sync", summary.failed()).into());
    }

    info!(synced = summary.synced(), skipped = summary.skipped(), "done");
    Ok(())
}
