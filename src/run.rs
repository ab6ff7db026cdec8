use anyhow::Result;
use tracing::info;

use crate::{
    actions,
    discovery::discover_pull_requests,
    policy::reconcile,
    staleness::{Staleness, check_staleness},
    types::{Forge, PrOutcome, PullRequest, RunReport, RunSpec},
};

/// Processes every discovered bot PR in order and reports what happened to
/// each.
///
/// A failure on one PR aborts the run unless `spec.keep_going` is set, in
/// which case it is recorded as [`PrOutcome::Failed`] and the next PR is
/// processed.
pub async fn run<F>(spec: &RunSpec, forge: &F) -> Result<RunReport>
where
    F: Forge + Sync,
{
    let prs = actions::group(
        "Retrieving Dependabot open PRs",
        discover_pull_requests(forge, &spec.repo, &spec.bots, spec.require_rebaseable),
    )
    .await?;

    let mut report = RunReport::default();
    for pr in &prs {
        let title = format!("Processing \"{}\"", pr.title);
        match actions::group(&title, process_pull_request(spec, forge, pr)).await {
            Ok(outcome) => report.record(pr.number, outcome),
            Err(err) if spec.keep_going => {
                actions::set_failed(&format!("Pull request #{}: {err:#}", pr.number));
                report.record(pr.number, PrOutcome::Failed(format!("{err:#}")));
            }
            Err(err) => {
                return Err(err.context(format!("Failed to process pull request #{}", pr.number)));
            }
        }
    }

    info!(
        processed = report.outcomes.len(),
        rebase_requested = report.rebase_requested().len(),
        "run complete"
    );
    Ok(report)
}

async fn process_pull_request<F>(spec: &RunSpec, forge: &F, pr: &PullRequest) -> Result<PrOutcome>
where
    F: Forge + Sync,
{
    if check_staleness(forge, &spec.repo, pr).await? == Staleness::UpToDate {
        return Ok(PrOutcome::UpToDate);
    }

    reconcile(forge, &spec.repo, pr, &spec.bots, spec.dry_run).await
}
