//! Merge detection over the user activity feed
//!
//! Each cycle walks the newest few single-item pages of the feed and stops as
//! soon as further pages cannot change the answer: nothing changed since the
//! last ETag, the previous watermark was reached, or a merge was found.

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use super::api::ActivityFeed;
use crate::{
    domain::{CacheToken, EventPage, FeedEvent, ResponseHints},
    id::{EventId, Login},
};

/// State carried between cycles. Never persisted, a restart starts over.
#[derive(Debug, Default)]
struct PollerState {
    login: Option<Login>,
    last_seen: FeedEvent,
    cache_token: CacheToken,
    merge_detected: bool,
    hints: ResponseHints,
}

/// Polls a feed for merged pull requests
///
/// Cycles must not overlap; `poll_once` takes `&mut self`, so the owner's
/// loop enforces that.
#[derive(Debug)]
pub struct EventPoller<F> {
    feed: F,
    max_pages: u32,
    state: PollerState,
}

impl<F: ActivityFeed> EventPoller<F> {
    pub fn new(feed: F, max_pages: u32) -> Self {
        Self {
            feed,
            max_pages: max_pages.max(1),
            state: PollerState::default(),
        }
    }

    /// Run one polling cycle
    #[instrument(skip(self), fields(watermark = %self.state.last_seen.id))]
    pub async fn poll_once(&mut self) {
        self.state.merge_detected = false;

        let Some(login) = self.resolve_login().await else {
            return;
        };

        let previous = self.state.last_seen.id;

        for page in 1..=self.max_pages {
            let cache_token = (page == 1)
                .then_some(&self.state.cache_token)
                .filter(|token| !token.is_empty());

            let fetched = match self.feed.fetch_page(&login, page, cache_token).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!(error = %e, page, transient = e.is_transient(), "Feed fetch failed, treating page as empty");
                    EventPage::default()
                },
            };
            self.state.hints.merge(fetched.hints);

            let event = fetched.event.clone();

            if page == 1 {
                if event.is_sentinel() {
                    debug!("No changes detected");
                    break;
                }

                if !self.has_baseline() {
                    // only events newer than this one may ever fire
                    info!(event_id = %event.id, "First run detected, adopting newest event as baseline");
                    self.adopt(fetched);
                    break;
                }

                if event.id < previous {
                    warn!(event_id = %event.id, previous = %previous, "Feed returned an older event than already seen, ignoring");
                    break;
                }

                if event.id == previous {
                    debug!(event_id = %event.id, "Newest event already seen");
                    self.state.cache_token = fetched.cache_token;
                    break;
                }

                self.adopt(fetched);
            } else if event.id <= previous {
                debug!(page, event_id = %event.id, "Reached previously seen events");
                break;
            }

            if event.is_merge {
                info!(event_id = %event.id, page, "Found merged pull request");
                self.state.merge_detected = true;
                break;
            }
        }

        if let Some(rate_limit) = self.state.hints.rate_limit.filter(|r| r.is_exhausted()) {
            warn!(reset_at = %rate_limit.reset_at, "GitHub rate limit exhausted");
        }
    }

    /// Whether the most recent cycle saw a merge
    pub fn merge_detected(&self) -> bool {
        self.state.merge_detected
    }

    pub fn login(&self) -> Option<&Login> {
        self.state.login.as_ref()
    }

    /// Identifier of the newest confirmed event
    pub fn watermark(&self) -> EventId {
        self.state.last_seen.id
    }

    pub fn last_seen(&self) -> &FeedEvent {
        &self.state.last_seen
    }

    pub fn cache_token(&self) -> &CacheToken {
        &self.state.cache_token
    }

    pub fn hints(&self) -> ResponseHints {
        self.state.hints
    }

    /// Delay before the next cycle: `interval`, stretched to GitHub's
    /// `X-Poll-Interval` when that is longer.
    pub fn next_delay(&self, interval: Duration) -> Duration {
        self.state
            .hints
            .poll_interval
            .map_or(interval, |hint| hint.max(interval))
    }

    async fn resolve_login(&mut self) -> Option<Login> {
        if let Some(login) = &self.state.login {
            return Some(login.clone());
        }

        info!("Setting GitHub login from token");
        match self.feed.lookup_login().await {
            Ok(login) => {
                info!(login = %login, "GitHub login resolved");
                self.state.login = Some(login.clone());
                Some(login)
            },
            Err(e) => {
                warn!(error = %e, transient = e.is_transient(), "Failed to resolve GitHub login, will retry next cycle");
                None
            },
        }
    }

    /// A baseline exists once any page-1 event has been adopted
    fn has_baseline(&self) -> bool {
        !self.state.cache_token.is_empty() || !self.state.last_seen.is_sentinel()
    }

    fn adopt(&mut self, page: EventPage) {
        self.state.last_seen = page.event;
        self.state.cache_token = page.cache_token;
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::{
        client::error::ClientError,
        domain::RateLimitInfo,
        test_utils::{ScriptedFeed, event, not_modified, token},
    };

    /// Poller that has already established a baseline at event 100, `"e100"`
    async fn baselined() -> EventPoller<ScriptedFeed> {
        let feed = ScriptedFeed::with_login();
        feed.push(event(100, false, "e100"));
        let mut poller = EventPoller::new(feed, 4);
        poller.poll_once().await;
        assert_eq!(poller.watermark(), EventId::new(100));
        poller.feed.take_requests();
        poller
    }

    #[tokio::test]
    async fn first_run_adopts_baseline_without_firing() {
        let feed = ScriptedFeed::with_login();
        feed.push(event(100, true, "e100"));
        let mut poller = EventPoller::new(feed, 4);

        poller.poll_once().await;

        assert!(!poller.merge_detected());
        assert_eq!(poller.watermark(), EventId::new(100));
        assert_eq!(poller.cache_token(), &CacheToken::new("e100"));
        assert_eq!(poller.feed.take_requests(), vec![(1, None)]);
    }

    #[tokio::test]
    async fn merge_on_page_one_fires_and_stops() {
        let mut poller = baselined().await;
        poller.feed.push(event(105, true, "e105"));

        poller.poll_once().await;

        assert!(poller.merge_detected());
        assert_eq!(poller.watermark(), EventId::new(105));
        assert_eq!(poller.cache_token(), &CacheToken::new("e105"));
        assert_eq!(poller.feed.take_requests(), vec![(1, token("e100"))]);
    }

    #[tokio::test]
    async fn not_modified_stops_after_one_fetch() {
        let mut poller = baselined().await;
        poller.feed.push(not_modified());

        poller.poll_once().await;

        assert!(!poller.merge_detected());
        assert_eq!(poller.watermark(), EventId::new(100));
        assert_eq!(poller.cache_token(), &CacheToken::new("e100"));
        assert_eq!(poller.feed.take_requests(), vec![(1, token("e100"))]);
    }

    #[tokio::test]
    async fn merge_on_page_two_skips_remaining_pages() {
        let mut poller = baselined().await;
        poller.feed.push(event(103, false, "e103"));
        poller.feed.push(event(102, true, ""));

        poller.poll_once().await;

        assert!(poller.merge_detected());
        assert_eq!(poller.watermark(), EventId::new(103));
        assert_eq!(poller.cache_token(), &CacheToken::new("e103"));
        assert_eq!(poller.feed.take_requests(), vec![(1, token("e100")), (2, None)]);
    }

    #[tokio::test]
    async fn stops_at_previous_watermark() {
        let mut poller = baselined().await;
        poller.feed.push(event(102, false, "e102"));
        poller.feed.push(event(101, false, ""));
        poller.feed.push(event(100, false, ""));
        poller.feed.push(event(99, true, ""));

        poller.poll_once().await;

        assert!(!poller.merge_detected());
        assert_eq!(poller.watermark(), EventId::new(102));
        assert_eq!(poller.feed.take_requests().len(), 3);
    }

    #[tokio::test]
    async fn already_seen_merge_does_not_fire_again() {
        let mut poller = baselined().await;
        poller.feed.push(event(101, false, "e101"));
        poller.feed.push(event(100, true, ""));

        poller.poll_once().await;

        assert!(!poller.merge_detected());
        assert_eq!(poller.feed.take_requests().len(), 2);
    }

    #[tokio::test]
    async fn page_ceiling_bounds_each_cycle() {
        let mut poller = baselined().await;
        for id in [110, 109, 108, 107] {
            poller.feed.push(event(id, false, "e"));
        }
        // beyond the horizon, never examined
        poller.feed.push(event(106, true, ""));

        poller.poll_once().await;

        assert!(!poller.merge_detected());
        assert_eq!(poller.watermark(), EventId::new(110));
        let pages: Vec<u32> = poller.feed.take_requests().into_iter().map(|(page, _)| page).collect();
        assert_eq!(pages, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn merge_flag_resets_each_cycle() {
        let mut poller = baselined().await;
        poller.feed.push(event(101, true, "e101"));
        poller.poll_once().await;
        assert!(poller.merge_detected());

        poller.feed.push(not_modified());
        poller.poll_once().await;
        assert!(!poller.merge_detected());
        assert_eq!(poller.feed.take_requests(), vec![(1, token("e100")), (1, token("e101"))]);
    }

    #[tokio::test]
    async fn unresolved_login_aborts_cycle_and_retries() {
        let feed = ScriptedFeed::default();
        feed.logins.borrow_mut().push_back(Err(ClientError::github_api(502, "Bad Gateway")));
        feed.logins.borrow_mut().push_back(Ok(Login::new("octocat")));
        feed.push(event(100, false, "e100"));
        let mut poller = EventPoller::new(feed, 4);

        poller.poll_once().await;
        assert!(poller.login().is_none());
        assert!(poller.feed.take_requests().is_empty());

        poller.poll_once().await;
        assert_eq!(poller.login(), Some(&Login::new("octocat")));
        assert_eq!(poller.watermark(), EventId::new(100));

        poller.feed.push(not_modified());
        poller.poll_once().await;
        assert_eq!(poller.feed.login_calls.get(), 2);
    }

    #[tokio::test]
    async fn failed_first_page_counts_as_no_change() {
        let mut poller = baselined().await;
        poller.feed.push(Err(ClientError::Timeout));

        poller.poll_once().await;

        assert!(!poller.merge_detected());
        assert_eq!(poller.watermark(), EventId::new(100));
        assert_eq!(poller.cache_token(), &CacheToken::new("e100"));
        assert_eq!(poller.feed.take_requests().len(), 1);
    }

    #[tokio::test]
    async fn failed_later_page_ends_cycle() {
        let mut poller = baselined().await;
        poller.feed.push(event(102, false, "e102"));
        poller.feed.push(Err(ClientError::github_api(500, "boom")));
        poller.feed.push(event(101, true, ""));

        poller.poll_once().await;

        assert!(!poller.merge_detected());
        assert_eq!(poller.watermark(), EventId::new(102));
        assert_eq!(poller.feed.take_requests().len(), 2);
    }

    #[tokio::test]
    async fn first_run_failure_keeps_waiting_for_baseline() {
        let feed = ScriptedFeed::with_login();
        feed.push(Err(ClientError::Timeout));
        feed.push(event(200, true, "e200"));
        let mut poller = EventPoller::new(feed, 4);

        poller.poll_once().await;
        assert!(poller.watermark().is_sentinel());

        poller.poll_once().await;
        assert!(!poller.merge_detected());
        assert_eq!(poller.watermark(), EventId::new(200));
    }

    #[tokio::test]
    async fn stale_newest_event_is_ignored() {
        let mut poller = baselined().await;
        poller.feed.push(event(99, true, "e99"));

        poller.poll_once().await;

        assert!(!poller.merge_detected());
        assert_eq!(poller.watermark(), EventId::new(100));
        assert_eq!(poller.cache_token(), &CacheToken::new("e100"));
    }

    #[tokio::test]
    async fn same_newest_event_refreshes_token_only() {
        let mut poller = baselined().await;
        poller.feed.push(event(100, true, "e100-b"));

        poller.poll_once().await;

        assert!(!poller.merge_detected());
        assert_eq!(poller.watermark(), EventId::new(100));
        assert_eq!(poller.cache_token(), &CacheToken::new("e100-b"));
        assert_eq!(poller.feed.take_requests().len(), 1);
    }

    #[tokio::test]
    async fn baseline_without_etag_still_counts() {
        let feed = ScriptedFeed::with_login();
        feed.push(event(100, false, ""));
        feed.push(event(101, true, ""));
        let mut poller = EventPoller::new(feed, 4);

        poller.poll_once().await;
        assert!(!poller.merge_detected());

        poller.poll_once().await;
        assert!(poller.merge_detected());
        assert_eq!(poller.feed.take_requests(), vec![(1, None), (1, None)]);
    }

    #[tokio::test]
    async fn watermark_never_decreases() {
        let mut poller = baselined().await;
        let script = [
            event(104, false, "a"),
            event(103, false, ""),
            not_modified(),
            event(90, false, "b"),
            event(104, false, "c"),
            event(120, true, "d"),
            Err(ClientError::Timeout),
        ];
        for page in script {
            poller.feed.push(page);
        }

        let mut last = poller.watermark();
        for _ in 0..6 {
            poller.poll_once().await;
            assert!(poller.watermark() >= last);
            last = poller.watermark();
        }
        assert_eq!(last, EventId::new(120));
    }

    #[tokio::test]
    async fn captures_hints_and_stretches_delay() {
        let reset_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let mut poller = baselined().await;
        poller.feed.push(Ok(EventPage::not_modified(ResponseHints {
            rate_limit: Some(RateLimitInfo { limit: 60, remaining: 0, reset_at }),
            poll_interval: Some(Duration::from_secs(90)),
        })));

        poller.poll_once().await;

        assert_eq!(poller.hints().rate_limit.map(|r| r.remaining), Some(0));
        assert_eq!(poller.next_delay(Duration::from_secs(60)), Duration::from_secs(90));
        assert_eq!(poller.next_delay(Duration::from_secs(120)), Duration::from_secs(120));
    }
}
