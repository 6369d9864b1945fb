//! Shared test doubles.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    future::Future,
};

use crate::{
    client::{
        ActivityFeed,
        error::{ClientError, Result},
    },
    domain::{CacheToken, EventPage, FeedEvent, PULL_REQUEST_EVENT, ResponseHints},
    id::{EventId, Login},
};

/// Feed that replays scripted answers in call order and records every page
/// request. An empty script answers with an empty page.
#[derive(Default)]
pub struct ScriptedFeed {
    pub logins: RefCell<VecDeque<Result<Login>>>,
    pub pages: RefCell<VecDeque<Result<EventPage>>>,
    pub requests: RefCell<Vec<(u32, Option<CacheToken>)>>,
    pub login_calls: Cell<usize>,
}

impl ScriptedFeed {
    /// Feed whose first login lookup succeeds as `octocat`
    pub fn with_login() -> Self {
        let feed = Self::default();
        feed.logins.borrow_mut().push_back(Ok(Login::new("octocat")));
        feed
    }

    pub fn push(&self, page: Result<EventPage>) {
        self.pages.borrow_mut().push_back(page);
    }

    pub fn take_requests(&self) -> Vec<(u32, Option<CacheToken>)> {
        self.requests.take()
    }
}

impl ActivityFeed for ScriptedFeed {
    fn lookup_login(&self) -> impl Future<Output = Result<Login>> {
        self.login_calls.set(self.login_calls.get() + 1);
        let login = self
            .logins
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Authentication));
        async move { login }
    }

    fn fetch_page(
        &self,
        _login: &Login,
        page: u32,
        cache_token: Option<&CacheToken>,
    ) -> impl Future<Output = Result<EventPage>> {
        self.requests.borrow_mut().push((page, cache_token.cloned()));
        let next = self
            .pages
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(EventPage::default()));
        async move { next }
    }
}

/// A pull request event page
pub fn event(id: u64, is_merge: bool, etag: &str) -> Result<EventPage> {
    Ok(EventPage {
        event: FeedEvent::new(EventId::new(id), PULL_REQUEST_EVENT, is_merge),
        cache_token: CacheToken::new(etag),
        hints: ResponseHints::default(),
    })
}

pub fn not_modified() -> Result<EventPage> {
    Ok(EventPage::not_modified(ResponseHints::default()))
}

pub fn token(etag: &str) -> Option<CacheToken> {
    Some(CacheToken::new(etag))
}
