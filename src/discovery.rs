use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::types::{BotIdentities, Forge, PullRequest, Repo};

/// Returns the open, unlocked pull requests authored by one of `bots`.
///
/// With `require_rebaseable` each candidate is re-fetched in full and kept
/// only when the forge explicitly reports it as rebaseable; an unknown
/// rebaseable state counts as not rebaseable.
pub async fn discover_pull_requests<F>(
    forge: &F,
    repo: &Repo,
    bots: &BotIdentities,
    require_rebaseable: bool,
) -> Result<Vec<PullRequest>>
where
    F: Forge + Sync,
{
    let all_prs = forge
        .list_open_pull_requests(repo)
        .await
        .with_context(|| format!("Failed to list open pull requests for {repo}"))?;
    debug!(count = all_prs.len(), "retrieved open pull requests");

    let candidates: Vec<PullRequest> = all_prs
        .into_iter()
        .filter(|pr| pr.is_authored_by(bots))
        .filter(|pr| !pr.locked)
        .collect();

    let mut discovered = Vec::with_capacity(candidates.len());
    for pr in candidates {
        let pr = if require_rebaseable {
            let full = forge
                .get_pull_request(repo, pr.number)
                .await
                .with_context(|| format!("Failed to fetch pull request #{}", pr.number))?;
            if !full.is_rebaseable() {
                debug!(
                    number = full.number,
                    rebaseable = ?full.rebaseable,
                    "skipping pull request that is not rebaseable"
                );
                continue;
            }
            full
        } else {
            pr
        };

        info!("{} {}", pr.url, pr.title);
        discovered.push(pr);
    }

    Ok(discovered)
}
