use std::process::Command;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::{Octocrab, Page, params};
use serde::Deserialize;
use tracing::debug;

use crate::types::{Comparison, Forge, IssueComment, IssueEvent, PullRequest, Repo};

const PER_PAGE: u8 = 100;

/// Resolves the API token: action input first, then the usual environment
/// variables, then the gh CLI.
pub fn get_github_token() -> Result<String> {
    for var in ["INPUT_GITHUBTOKEN", "GITHUB_TOKEN", "GH_TOKEN"] {
        if let Ok(token) = std::env::var(var) {
            if !token.trim().is_empty() {
                debug!(source = var, "using GitHub token from environment");
                return Ok(token.trim().to_string());
            }
        }
    }

    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .context("No token in environment and failed to run 'gh auth token'")?;

    if !output.status.success() {
        anyhow::bail!("Failed to get GitHub token from gh CLI. Please run 'gh auth login' first");
    }

    let token = String::from_utf8(output.stdout)?.trim().to_string();
    if token.is_empty() {
        anyhow::bail!("Empty token returned from gh CLI");
    }

    Ok(token)
}

#[derive(Debug, Deserialize)]
struct Actor {
    login: String,
}

#[derive(Debug, Deserialize)]
struct IssueEventPayload {
    actor: Option<Actor>,
    event: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ComparePayload {
    ahead_by: u64,
    behind_by: u64,
}

/// Builds the compare route with `base...head` as one percent-encoded path
/// segment, so refs containing `/`, `#`, `?` or `%` stay in the path.
fn compare_route(repo: &Repo, base: &str, head: &str) -> Result<String> {
    let range = format!("{base}...{head}");
    let mut url = url::Url::parse("https://api.github.com/")?;
    url.path_segments_mut()
        .map_err(|()| anyhow::anyhow!("Cannot build compare route for {repo}"))?
        .clear()
        .extend([
            "repos",
            repo.owner(),
            repo.name(),
            "compare",
            range.as_str(),
        ]);
    Ok(url.path().to_string())
}

fn pr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        title: pr.title.clone().unwrap_or_default(),
        url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        author_login: pr.user.as_ref().map(|user| user.login.clone()),
        locked: pr.locked,
        base_ref: pr.base.ref_field.clone(),
        head_sha: pr.head.sha.clone(),
        rebaseable: pr.rebaseable,
    }
}

/// [`Forge`] backed by the GitHub REST API.
pub struct GitHub {
    client: Octocrab,
}

impl GitHub {
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Creates an authenticated client using available credentials.
    pub fn from_env() -> Result<Self> {
        let token = get_github_token().context("Failed to obtain GitHub authentication token")?;
        let client = Octocrab::builder()
            .personal_token(token)
            .build()
            .context("Failed to create GitHub client")?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Forge for GitHub {
    async fn list_open_pull_requests(&self, repo: &Repo) -> Result<Vec<PullRequest>> {
        let first_page = self
            .client
            .pulls(repo.owner(), repo.name())
            .list()
            .state(params::State::Open)
            .per_page(PER_PAGE)
            .send()
            .await?;
        let prs = self.client.all_pages(first_page).await?;
        Ok(prs.iter().map(pr_from_octocrab).collect())
    }

    async fn get_pull_request(&self, repo: &Repo, number: u64) -> Result<PullRequest> {
        let pr = self
            .client
            .pulls(repo.owner(), repo.name())
            .get(number)
            .await?;
        Ok(pr_from_octocrab(&pr))
    }

    async fn compare_commits(&self, repo: &Repo, base: &str, head: &str) -> Result<Comparison> {
        let route = compare_route(repo, base, head)?;
        // Only the counts matter; keep the embedded commit list minimal.
        let payload: ComparePayload = self
            .client
            .get(route, Some(&[("per_page", 1), ("page", 1)]))
            .await?;
        Ok(Comparison {
            base: base.to_string(),
            head: head.to_string(),
            ahead_by: payload.ahead_by,
            behind_by: payload.behind_by,
        })
    }

    async fn list_issue_events(&self, repo: &Repo, number: u64) -> Result<Vec<IssueEvent>> {
        let route = format!(
            "/repos/{}/{}/issues/{}/events",
            repo.owner(),
            repo.name(),
            number
        );
        let first_page: Page<IssueEventPayload> = self
            .client
            .get(route, Some(&[("per_page", PER_PAGE)]))
            .await?;
        let events = self.client.all_pages(first_page).await?;
        Ok(events
            .into_iter()
            .map(|e| IssueEvent {
                actor: e.actor.map(|a| a.login),
                event: e.event,
                created_at: e.created_at,
            })
            .collect())
    }

    async fn list_issue_comments(&self, repo: &Repo, number: u64) -> Result<Vec<IssueComment>> {
        let first_page = self
            .client
            .issues(repo.owner(), repo.name())
            .list_comments(number)
            .per_page(PER_PAGE)
            .send()
            .await?;
        let comments = self.client.all_pages(first_page).await?;
        Ok(comments
            .into_iter()
            .map(|c| IssueComment {
                author: Some(c.user.login),
                body: c.body.unwrap_or_default(),
                created_at: c.created_at,
            })
            .collect())
    }

    async fn create_issue_comment(&self, repo: &Repo, number: u64, body: &str) -> Result<()> {
        self.client
            .issues(repo.owner(), repo.name())
            .create_comment(number, body)
            .await?;
        Ok(())
    }
}
