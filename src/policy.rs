use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::{
    actions,
    timeline::{ScanOutcome, TimelineEntry, merge_timeline, scan_timeline},
    types::{BotIdentities, Forge, PrOutcome, PullRequest, Repo},
};

/// Comment body that asks the bot to rebase its PR.
pub const REBASE_COMMAND: &str = "@dependabot rebase";

/// Fetches a PR's full event and comment history, most recent first.
pub async fn fetch_timeline<F>(forge: &F, repo: &Repo, number: u64) -> Result<Vec<TimelineEntry>>
where
    F: Forge + Sync,
{
    let events = forge
        .list_issue_events(repo, number)
        .await
        .with_context(|| format!("Failed to list events for pull request #{number}"))?;

    let comments = forge
        .list_issue_comments(repo, number)
        .await
        .with_context(|| format!("Failed to list comments for pull request #{number}"))?;

    debug!(
        events = events.len(),
        comments = comments.len(),
        "retrieved pull request history"
    );
    Ok(merge_timeline(events, comments))
}

/// Decides from a PR's history whether to ask the bot for a rebase, and
/// does so unless `dry_run` is set.
pub async fn reconcile<F>(
    forge: &F,
    repo: &Repo,
    pr: &PullRequest,
    bots: &BotIdentities,
    dry_run: bool,
) -> Result<PrOutcome>
where
    F: Forge + Sync,
{
    let timeline = fetch_timeline(forge, repo, pr.number).await?;
    if tracing::enabled!(tracing::Level::DEBUG) {
        debug!(
            "history:\n{}",
            serde_json::to_string_pretty(&timeline).context("Failed to serialise history")?
        );
    }

    match scan_timeline(&timeline, bots) {
        ScanOutcome::ForcePushed { at } => {
            info!(%at, "Branch was force-pushed by the bot, not requesting a rebase");
            Ok(PrOutcome::ForcePushed)
        }
        ScanOutcome::RecreateRequested { first_line, .. } => {
            actions::warning(&first_line);
            Ok(PrOutcome::RecreateRequested)
        }
        ScanOutcome::Exhausted => request_rebase(forge, repo, pr, dry_run).await,
    }
}

async fn request_rebase<F>(
    forge: &F,
    repo: &Repo,
    pr: &PullRequest,
    dry_run: bool,
) -> Result<PrOutcome>
where
    F: Forge + Sync,
{
    if dry_run {
        actions::warning(&format!(
            "Dry run: would comment '{}' on {}",
            REBASE_COMMAND, pr.url
        ));
        return Ok(PrOutcome::DryRunSkipped);
    }

    forge
        .create_issue_comment(repo, pr.number, REBASE_COMMAND)
        .await
        .with_context(|| format!("Failed to comment on pull request #{}", pr.number))?;
    info!("Commented '{}' on {}", REBASE_COMMAND, pr.url);
    Ok(PrOutcome::RebaseRequested)
}
