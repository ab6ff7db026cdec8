use anyhow::{Context, Result};
use clap::Parser;

use crate::types::{BotIdentities, Repo, RunSpec};

#[derive(Parser, Default, Debug)]
#[command(
    name = "dependabot-rebase",
    version,
    about = "Ask Dependabot to rebase its open pull requests that have fallen behind their base branch"
)]
struct CliArgs {
    /// GitHub repository as 'owner/repo' or a repository URL
    #[arg(short = 'r', long, env = "GITHUB_REPOSITORY", value_name = "OWNER/REPO")]
    pub repo: String,

    /// Log the rebase requests instead of posting them ('true' enables, anything else disables)
    #[arg(
        long = "dry-run",
        env = "INPUT_DRYRUN",
        value_name = "BOOL",
        default_value = "false",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub dry_run: String,

    /// Login to treat as the dependency-update bot (can specify multiple; replaces the defaults)
    #[arg(long = "bot", value_name = "LOGIN")]
    pub bots: Vec<String>,

    /// Do not require the PR to be reported as rebaseable
    #[arg(long = "skip-rebaseable-check")]
    pub skip_rebaseable_check: bool,

    /// Log per-PR failures and continue with the next PR instead of aborting
    #[arg(long = "keep-going")]
    pub keep_going: bool,
}

/// Interprets an action-style boolean input: only "true" (in any case)
/// enables it.
pub fn parse_dry_run(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

fn parse_repo_arg(repo: &str) -> Result<Repo> {
    let repo = repo.trim();
    if repo.starts_with("https://") || repo.starts_with("http://") {
        let (parsed, pr_number) = Repo::parse_url(repo)?;
        if pr_number.is_some() {
            anyhow::bail!("--repo expects a repository, not a pull request URL: '{repo}'");
        }
        return Ok(parsed);
    }
    Repo::parse(repo).with_context(|| format!("Invalid repository format '{repo}'"))
}

fn bot_identities(bots: &[String]) -> BotIdentities {
    let logins: Vec<&str> = bots
        .iter()
        .map(|b| b.trim())
        .filter(|b| !b.is_empty())
        .collect();

    if logins.is_empty() {
        BotIdentities::default()
    } else {
        BotIdentities::new(logins)
    }
}

fn build_run_spec(cli: CliArgs) -> Result<RunSpec> {
    Ok(RunSpec {
        repo: parse_repo_arg(&cli.repo)?,
        bots: bot_identities(&cli.bots),
        dry_run: parse_dry_run(&cli.dry_run),
        require_rebaseable: !cli.skip_rebaseable_check,
        keep_going: cli.keep_going,
    })
}

/// Parses command-line arguments (and their environment fallbacks) into a
/// run specification.
pub fn parse_args<I, T>(args: I) -> Result<RunSpec>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = CliArgs::try_parse_from(args)?;
    build_run_spec(cli)
}
