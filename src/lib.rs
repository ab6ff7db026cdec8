//! dependabot-rebase: keeps dependency-update pull requests current.
//!
//! Finds open pull requests authored by the dependency-update bot, checks
//! which of them have fallen behind their base branch, and asks the bot to
//! rebase those whose history shows no force-push or recreate request since.

pub mod actions;
pub mod cli;
pub mod discovery;
pub mod github;
pub mod policy;
pub mod run;
pub mod staleness;
pub mod timeline;
pub mod types;

pub use cli::parse_args;
pub use discovery::discover_pull_requests;
pub use github::GitHub;
pub use policy::{REBASE_COMMAND, fetch_timeline, reconcile};
pub use run::run;
pub use staleness::{Staleness, check_staleness};
pub use timeline::{
    FORCE_PUSH_EVENT, ScanOutcome, TimelineEntry, is_recreate_directive, merge_timeline,
    scan_timeline,
};
pub use types::{
    BotIdentities, Comparison, Forge, IssueComment, IssueEvent, PrOutcome, PullRequest, Repo,
    RepoError, RunReport, RunSpec,
};
