//! The filter/query view: derives a filtered working set from a remote
//! search request.
//!
//! Text input is debounced 300 ms after the last keystroke; the other
//! controls fire immediately. A search response replaces the card set
//! wholesale — it never merges, so any optimistic mutation in flight when
//! a filter changes is superseded by the next render pass.

use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Quiet period after the last keystroke before the text query fires.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Completion-status facet of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Pending => "pending",
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            _ => Err(format!("Invalid status filter: {}", s)),
        }
    }
}

/// The full search input: free-text query plus the faceted controls.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CardFilter {
    pub query: String,
    pub status: StatusFilter,
    pub category: Option<i64>,
    pub assignee: Option<i64>,
    pub include_attachments: bool,
}

impl CardFilter {
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
            && self.status == StatusFilter::All
            && self.category.is_none()
            && self.assignee.is_none()
    }

    /// Query-string pairs for the search endpoint. Empty facets are
    /// omitted entirely rather than sent blank.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.query.is_empty() {
            pairs.push(("q", self.query.clone()));
        }
        match self.status {
            StatusFilter::All => {}
            status => pairs.push(("status", status.as_str().to_string())),
        }
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        if let Some(assignee) = self.assignee {
            pairs.push(("assignee", assignee.to_string()));
        }
        if self.include_attachments {
            pairs.push(("include_attachments", "true".to_string()));
        }
        pairs
    }
}

/// Debounce gate in front of the search request.
///
/// `text_changed` (re)arms a 300 ms deadline; `control_changed` bypasses
/// it. The caller polls `due` from its timer loop (or sleeps until
/// [`SearchDebouncer::deadline`]) and fires the returned filter.
#[derive(Debug, Default)]
pub struct SearchDebouncer {
    pending: Option<CardFilter>,
    deadline: Option<Instant>,
}

impl SearchDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A keystroke in the text field: restart the quiet period.
    pub fn text_changed(&mut self, filter: CardFilter, now: Instant) {
        self.pending = Some(filter);
        self.deadline = Some(now + SEARCH_DEBOUNCE);
    }

    /// A non-text control changed: fire immediately, cancelling any armed
    /// text deadline (the returned filter already carries the text).
    pub fn control_changed(&mut self, filter: CardFilter) -> CardFilter {
        self.pending = None;
        self.deadline = None;
        filter
    }

    /// The filter to fire now, if the quiet period has elapsed.
    pub fn due(&mut self, now: Instant) -> Option<CardFilter> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }
}
