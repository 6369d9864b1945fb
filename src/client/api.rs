//! Core HTTP client for GitHub API

use std::{future::Future, str::FromStr, time::Duration};

use chrono::DateTime;
use compact_str::{CompactString, format_compact};
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, ETAG, HeaderMap, IF_NONE_MATCH},
};
use serde::Deserialize;
use tracing::{debug, instrument, trace};

use super::{
    config::ClientConfig,
    error::{ClientError, Result},
};
use crate::{
    domain::{CacheToken, EventPage, RateLimitInfo, ResponseHints},
    id::Login,
    stream::{StreamScanner, extract_string_field, parse_feed_event},
};

/// The two read-only operations the poller needs from GitHub.
pub trait ActivityFeed {
    /// Resolves the login that owns the access token.
    fn lookup_login(&self) -> impl Future<Output = Result<Login>>;

    /// Fetches one single-item page of the user's activity feed.
    ///
    /// `cache_token`, when given, is sent as a precondition and a
    /// "not modified" answer comes back as a sentinel page.
    fn fetch_page(
        &self,
        login: &Login,
        page: u32,
        cache_token: Option<&CacheToken>,
    ) -> impl Future<Output = Result<EventPage>>;
}

/// Pure HTTP client for GitHub API
#[derive(Debug)]
pub struct GithubApi {
    client: Client,
    config: ClientConfig,
}

/// GitHub API error response format
#[derive(Debug, Deserialize)]
struct GithubApiError {
    message: CompactString,
}

impl GithubApi {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request.timeout)
            .user_agent(config.request.user_agent.as_str())
            .build()
            .map_err(|e| ClientError::config(format_compact!("cannot build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Get the login of the authenticated user
    #[instrument(skip(self))]
    pub async fn get_login(&self) -> Result<Login> {
        let url = format_compact!("{}/user", self.config.api_root());
        let response = self.send(self.authenticated_request(&url)).await?;
        let response = self.check_status(response).await?;

        // Response for this endpoint looks like {"login":"octocat",...}
        let mut scanner = StreamScanner::new(response);
        let login = extract_string_field(&mut scanner, "login")
            .await
            .filter(|login| !login.is_empty())
            .ok_or_else(|| ClientError::missing_field("/user", "login"))?;

        debug!(login = %login, "Resolved login from token");
        Ok(Login::new(login))
    }

    /// Get a single event of the user's feed, newest first
    #[instrument(skip(self, cache_token), fields(login = %login, page = page, conditional = cache_token.is_some()))]
    pub async fn get_event_page(
        &self,
        login: &Login,
        page: u32,
        cache_token: Option<&CacheToken>,
    ) -> Result<EventPage> {
        let url = format_compact!(
            "{}/users/{}/events?per_page=1&page={}",
            self.config.api_root(),
            login,
            page
        );

        let mut request = self.authenticated_request(&url);
        if let Some(token) = cache_token.filter(|token| !token.is_empty()) {
            request = request.header(IF_NONE_MATCH, token.as_str());
        }

        let response = self.send(request).await?;
        let hints = read_hints(response.headers());

        if response.status() == StatusCode::NOT_MODIFIED {
            debug!("Feed not modified");
            return Ok(EventPage::not_modified(hints));
        }

        let response = self.check_status(response).await?;
        let cache_token = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(CacheToken::new)
            .unwrap_or_default();

        let mut scanner = StreamScanner::new(response);
        let event = parse_feed_event(&mut scanner).await;
        debug!(
            event_id = %event.id,
            kind = %event.kind,
            is_merge = event.is_merge,
            etag = %cache_token,
            "Fetched feed page"
        );

        Ok(EventPage { event, cache_token, hints })
    }

    /// Create authenticated request builder
    fn authenticated_request(&self, url: &str) -> RequestBuilder {
        trace!(url = %url, "Building request");
        self.client
            .get(url)
            .header(AUTHORIZATION, format!("token {}", self.config.private_token))
            .header(ACCEPT, "application/vnd.github.v3+json")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request.send().await.map_err(ClientError::from_reqwest)
    }

    /// Passes successful responses through, unread
    async fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let path = response.url().path().to_string();
        let hints = read_hints(response.headers());
        // error bodies are small, buffering them is fine
        let body = response.text().await.unwrap_or_default();
        Err(self.handle_error_response(status.as_u16(), &path, hints, &body))
    }

    /// Handle error responses from GitHub API
    fn handle_error_response(
        &self,
        status: u16,
        path: &str,
        hints: ResponseHints,
        body: &str,
    ) -> ClientError {
        let message = serde_json::from_str::<GithubApiError>(body)
            .map(|e| e.message)
            .unwrap_or_else(|_| body.into());

        match status {
            401 => ClientError::Authentication,
            403 | 429 if status == 429 || hints.rate_limit.is_some_and(|r| r.is_exhausted()) => {
                ClientError::rate_limit(hints.rate_limit.map(|r| r.reset_at))
            },
            404 => ClientError::not_found(path),
            _ => ClientError::github_api(status, message),
        }
    }
}

impl ActivityFeed for GithubApi {
    fn lookup_login(&self) -> impl Future<Output = Result<Login>> {
        self.get_login()
    }

    fn fetch_page(
        &self,
        login: &Login,
        page: u32,
        cache_token: Option<&CacheToken>,
    ) -> impl Future<Output = Result<EventPage>> {
        self.get_event_page(login, page, cache_token)
    }
}

/// Collects the rate limit and poll interval headers, when all present
pub(crate) fn read_hints(headers: &HeaderMap) -> ResponseHints {
    let limit = header_value::<u32>(headers, "x-ratelimit-limit");
    let remaining = header_value::<u32>(headers, "x-ratelimit-remaining");
    let reset = header_value::<i64>(headers, "x-ratelimit-reset");

    let rate_limit = match (limit, remaining, reset) {
        (Some(limit), Some(remaining), Some(reset)) => DateTime::from_timestamp(reset, 0)
            .map(|reset_at| RateLimitInfo { limit, remaining, reset_at }),
        _ => None,
    };

    let poll_interval = header_value::<u64>(headers, "x-poll-interval").map(Duration::from_secs);

    ResponseHints { rate_limit, poll_interval }
}

fn header_value<T: FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}
