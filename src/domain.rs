use std::time::Duration;

use chrono::{DateTime, Utc};
use compact_str::CompactString;

use crate::id::EventId;

/// Event type GitHub uses for pull request activity
pub const PULL_REQUEST_EVENT: &str = "PullRequestEvent";

/// One slot of the user activity feed, reduced to what the poller needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedEvent {
    pub id: EventId,
    /// Raw `type` discriminant, e.g. `PullRequestEvent`
    pub kind: CompactString,
    /// Pull request closed via merge
    pub is_merge: bool,
}

impl FeedEvent {
    /// The "nothing here" event: absent, unparseable or not modified.
    pub fn sentinel() -> Self {
        Self::default()
    }

    pub fn new(id: EventId, kind: impl Into<CompactString>, is_merge: bool) -> Self {
        // a sentinel never carries a merge flag
        let is_merge = is_merge && !id.is_sentinel();
        Self { id, kind: kind.into(), is_merge }
    }

    pub fn is_sentinel(&self) -> bool {
        self.id.is_sentinel()
    }

    pub fn is_pull_request(&self) -> bool {
        self.kind == PULL_REQUEST_EVENT
    }
}

/// Opaque ETag issued for page 1 of the feed. Empty means none is held.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheToken(CompactString);

impl CacheToken {
    pub fn new(token: impl Into<CompactString>) -> Self {
        Self(token.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheToken {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rate limit values from the `X-RateLimit-*` response headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitInfo {
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Advisory values GitHub attaches to feed responses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResponseHints {
    pub rate_limit: Option<RateLimitInfo>,
    /// `X-Poll-Interval`: the minimum delay GitHub asks pollers to respect
    pub poll_interval: Option<Duration>,
}

impl ResponseHints {
    /// Keeps previously captured values that `newer` does not replace.
    pub fn merge(&mut self, newer: ResponseHints) {
        if newer.rate_limit.is_some() {
            self.rate_limit = newer.rate_limit;
        }
        if newer.poll_interval.is_some() {
            self.poll_interval = newer.poll_interval;
        }
    }
}

/// The result of fetching one single-item page of the feed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventPage {
    pub event: FeedEvent,
    /// ETag of the response, empty when absent or not modified
    pub cache_token: CacheToken,
    pub hints: ResponseHints,
}

impl EventPage {
    pub fn not_modified(hints: ResponseHints) -> Self {
        Self { event: FeedEvent::sentinel(), cache_token: CacheToken::default(), hints }
    }
}
