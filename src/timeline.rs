use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use crate::types::{BotIdentities, IssueComment, IssueEvent};

/// Issue event emitted when a PR's head branch is force-pushed.
pub const FORCE_PUSH_EVENT: &str = "head_ref_force_pushed";

/// Kind reported for entries that came from the comment history.
pub const COMMENT_KIND: &str = "comment";

// The phrase must not be glued to a preceding word character; backticks,
// whitespace and punctuation are all acceptable delimiters.
static RECREATE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\W)@dependabot recreate\b").expect("recreate directive pattern is valid")
});

/// One entry of a PR's merged history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TimelineEntry {
    Event(IssueEvent),
    Comment(IssueComment),
}

impl TimelineEntry {
    /// The acting user: event actor or comment author, empty when absent.
    pub fn login(&self) -> &str {
        let login = match self {
            TimelineEntry::Event(event) => event.actor.as_deref(),
            TimelineEntry::Comment(comment) => comment.author.as_deref(),
        };
        login.unwrap_or_default()
    }

    pub fn kind(&self) -> &str {
        match self {
            TimelineEntry::Event(event) => &event.event,
            TimelineEntry::Comment(_) => COMMENT_KIND,
        }
    }

    /// Comment text; events have none.
    pub fn body(&self) -> &str {
        match self {
            TimelineEntry::Event(_) => "",
            TimelineEntry::Comment(comment) => &comment.body,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            TimelineEntry::Event(event) => event.created_at,
            TimelineEntry::Comment(comment) => comment.created_at,
        }
    }
}

/// Why scanning a timeline stopped, if it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The bot force-pushed the branch itself.
    ForcePushed { at: DateTime<Utc> },
    /// The bot was already asked to recreate the PR.
    RecreateRequested {
        at: DateTime<Utc>,
        first_line: String,
    },
    /// Nothing in the history rules out a rebase request.
    Exhausted,
}

/// Merges events and comments into one timeline, most recent first.
///
/// The sort is stable: entries with equal timestamps keep source order,
/// events ahead of comments.
pub fn merge_timeline(events: Vec<IssueEvent>, comments: Vec<IssueComment>) -> Vec<TimelineEntry> {
    let mut entries: Vec<TimelineEntry> = events
        .into_iter()
        .map(TimelineEntry::Event)
        .chain(comments.into_iter().map(TimelineEntry::Comment))
        .collect();

    entries.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    entries
}

pub fn is_recreate_directive(body: &str) -> bool {
    RECREATE_DIRECTIVE.is_match(body.trim())
}

/// Walks a descending timeline and stops at the first bot entry that makes
/// a rebase request redundant.
pub fn scan_timeline(entries: &[TimelineEntry], bots: &BotIdentities) -> ScanOutcome {
    for entry in entries {
        if !bots.contains(entry.login()) {
            continue;
        }

        if entry.kind() == FORCE_PUSH_EVENT {
            return ScanOutcome::ForcePushed {
                at: entry.created_at(),
            };
        }

        if is_recreate_directive(entry.body()) {
            let first_line = entry.body().trim().lines().next().unwrap_or_default();
            return ScanOutcome::RecreateRequested {
                at: entry.created_at(),
                first_line: first_line.to_string(),
            };
        }
    }

    ScanOutcome::Exhausted
}
