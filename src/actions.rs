//! Log grouping and annotations.
//!
//! Everything goes through `tracing`. When running inside a GitHub Actions
//! job the same information is also emitted as workflow commands on stdout
//! so the job log folds groups and surfaces warnings and errors.

use std::future::Future;

use tracing::{Instrument, error, info_span, warn};

pub fn is_github_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

/// Runs `fut` inside a named log group.
pub async fn group<T, Fut>(title: &str, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    let workflow = is_github_actions();
    if workflow {
        println!("::group::{}", escape_data(title));
    }

    let output = fut.instrument(info_span!("group", title = %title)).await;

    if workflow {
        println!("::endgroup::");
    }
    output
}

pub fn warning(message: &str) {
    warn!("{message}");
    if is_github_actions() {
        println!("::warning::{}", escape_data(message));
    }
}

/// Marks the run as failed with `message`.
pub fn set_failed(message: &str) {
    error!("{message}");
    if is_github_actions() {
        println!("::error::{}", escape_data(message));
    }
}

// Workflow command payloads must not contain raw newlines or '%'.
fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
