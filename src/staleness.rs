use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::types::{Forge, PullRequest, Repo};

/// How far a PR head lags its base branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    UpToDate,
    Behind(u64),
}

/// Compares the PR head commit against its base branch.
pub async fn check_staleness<F>(forge: &F, repo: &Repo, pr: &PullRequest) -> Result<Staleness>
where
    F: Forge + Sync,
{
    let comparison = forge
        .compare_commits(repo, &pr.base_ref, &pr.head_sha)
        .await
        .with_context(|| {
            format!(
                "Failed to compare {}...{} for pull request #{}",
                pr.base_ref, pr.head_sha, pr.number
            )
        })?;
    debug!(base = %comparison.base, head = %comparison.head, "compared pull request head");

    if comparison.behind_by == 0 {
        info!("Up-to-date");
        Ok(Staleness::UpToDate)
    } else {
        info!(
            ahead_by = comparison.ahead_by,
            "Behind by {} commits", comparison.behind_by
        );
        Ok(Staleness::Behind(comparison.behind_by))
    }
}
