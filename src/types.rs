use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Logins the dependency-update bot posts and pushes under.
pub const DEFAULT_BOT_LOGINS: [&str; 2] = ["dependabot", "dependabot[bot]"];

/// Errors produced when parsing repository coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    Empty,
    InvalidFormat(String),
    EmptyComponent(String),
}

impl std::fmt::Display for RepoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoError::Empty => write!(f, "repository must not be empty"),
            RepoError::InvalidFormat(s) => {
                write!(f, "repository must be in format 'owner/repo', got: '{s}'")
            }
            RepoError::EmptyComponent(s) => {
                write!(f, "repository owner and name must be non-empty, got: '{s}'")
            }
        }
    }
}

impl std::error::Error for RepoError {}

/// Repository coordinates (`owner/name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repo {
    owner: String,
    name: String,
}

impl Repo {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, RepoError> {
        let owner = owner.into();
        let name = name.into();
        if owner.trim().is_empty() || name.trim().is_empty() {
            return Err(RepoError::EmptyComponent(format!("{owner}/{name}")));
        }
        Ok(Self { owner, name })
    }

    /// Parses `owner/repo`.
    pub fn parse(s: &str) -> Result<Self, RepoError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RepoError::Empty);
        }
        match s.split('/').collect::<Vec<_>>().as_slice() {
            [owner, name] => Self::new(*owner, *name),
            _ => Err(RepoError::InvalidFormat(s.to_string())),
        }
    }

    /// Parses a GitHub repository or pull request URL, returning the
    /// repository and the PR number when the URL points at one.
    pub fn parse_url(url_str: &str) -> anyhow::Result<(Self, Option<u64>)> {
        use anyhow::Context;

        let url = url::Url::parse(url_str)
            .with_context(|| format!("Failed to parse URL: '{url_str}'"))?;

        if url.host_str() != Some("github.com") {
            anyhow::bail!("URL must be a GitHub URL, got: '{}'", url_str);
        }

        let segments: Vec<&str> = url
            .path_segments()
            .context("Cannot parse URL path")?
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [owner, name] => Ok((Self::new(*owner, *name)?, None)),
            [owner, name, "pull", number] => {
                let number = number
                    .parse()
                    .with_context(|| format!("Invalid PR number in URL: '{url_str}'"))?;
                Ok((Self::new(*owner, *name)?, Some(number)))
            }
            _ => anyhow::bail!(
                "URL must be in format https://github.com/owner/repo[/pull/123], got: '{}'",
                url_str
            ),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The set of logins recognised as the dependency-update bot.
///
/// Matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentities(BTreeSet<String>);

impl BotIdentities {
    pub fn new<I, S>(logins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(logins.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, login: &str) -> bool {
        self.0.contains(login)
    }
}

impl Default for BotIdentities {
    fn default() -> Self {
        Self::new(DEFAULT_BOT_LOGINS)
    }
}

/// Snapshot of a pull request as reported by the forge.
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub author_login: Option<String>,
    pub locked: bool,
    pub base_ref: String,
    pub head_sha: String,
    /// Only populated on the full representation; `None` means unknown.
    pub rebaseable: Option<bool>,
}

impl PullRequest {
    pub fn is_authored_by(&self, bots: &BotIdentities) -> bool {
        self.author_login
            .as_deref()
            .is_some_and(|login| bots.contains(login))
    }

    pub fn is_rebaseable(&self) -> bool {
        self.rebaseable == Some(true)
    }
}

/// Result of comparing a PR head against its base branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub base: String,
    pub head: String,
    pub ahead_by: u64,
    pub behind_by: u64,
}

/// An issue event (labelled, force-pushed, ...) on a pull request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueEvent {
    pub actor: Option<String>,
    pub event: String,
    pub created_at: DateTime<Utc>,
}

/// A conversation comment on a pull request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueComment {
    pub author: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// What happened to a single pull request during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrOutcome {
    UpToDate,
    ForcePushed,
    RecreateRequested,
    RebaseRequested,
    DryRunSkipped,
    Failed(String),
}

impl std::fmt::Display for PrOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrOutcome::UpToDate => write!(f, "up-to-date"),
            PrOutcome::ForcePushed => write!(f, "already force-pushed by bot"),
            PrOutcome::RecreateRequested => write!(f, "recreate already requested"),
            PrOutcome::RebaseRequested => write!(f, "rebase requested"),
            PrOutcome::DryRunSkipped => write!(f, "rebase skipped (dry run)"),
            PrOutcome::Failed(err) => write!(f, "failed: {err}"),
        }
    }
}

/// Per-PR outcomes of a run, in processing order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<(u64, PrOutcome)>,
}

impl RunReport {
    pub fn record(&mut self, number: u64, outcome: PrOutcome) {
        self.outcomes.push((number, outcome));
    }

    pub fn outcome(&self, number: u64) -> Option<&PrOutcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| *n == number)
            .map(|(_, outcome)| outcome)
    }

    pub fn rebase_requested(&self) -> Vec<u64> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == PrOutcome::RebaseRequested)
            .map(|(n, _)| *n)
            .collect()
    }

    pub fn failures(&self) -> Vec<(u64, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(n, outcome)| match outcome {
                PrOutcome::Failed(err) => Some((*n, err.as_str())),
                _ => None,
            })
            .collect()
    }
}

/// Everything a run needs besides the forge itself.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub repo: Repo,
    pub bots: BotIdentities,
    pub dry_run: bool,
    /// Keep only PRs the forge explicitly reports as rebaseable.
    pub require_rebaseable: bool,
    /// Record per-PR failures and continue instead of aborting the run.
    pub keep_going: bool,
}

impl RunSpec {
    pub fn new(repo: Repo) -> Self {
        Self {
            repo,
            bots: BotIdentities::default(),
            dry_run: false,
            require_rebaseable: true,
            keep_going: false,
        }
    }
}

/// Repository-scoped operations the tool needs from the code forge.
///
/// List operations return every item across all pages.
#[async_trait]
pub trait Forge {
    async fn list_open_pull_requests(&self, repo: &Repo) -> anyhow::Result<Vec<PullRequest>>;

    async fn get_pull_request(&self, repo: &Repo, number: u64) -> anyhow::Result<PullRequest>;

    async fn compare_commits(
        &self,
        repo: &Repo,
        base: &str,
        head: &str,
    ) -> anyhow::Result<Comparison>;

    async fn list_issue_events(&self, repo: &Repo, number: u64)
    -> anyhow::Result<Vec<IssueEvent>>;

    async fn list_issue_comments(
        &self,
        repo: &Repo,
        number: u64,
    ) -> anyhow::Result<Vec<IssueComment>>;

    async fn create_issue_comment(&self, repo: &Repo, number: u64, body: &str)
    -> anyhow::Result<()>;
}
