//! The polling loop tying the feed to the actuator

use std::{future::Future, time::Duration};

use tokio::time::sleep;
use tracing::{debug, info, instrument};

use crate::{
    actuator::{Actuator, Celebration},
    client::{ActivityFeed, EventPoller},
};

/// Owns the poller and the celebration for the lifetime of the process
pub struct MergeBell<F, A> {
    poller: EventPoller<F>,
    celebration: Celebration<A>,
    interval: Duration,
}

impl<F: ActivityFeed, A: Actuator> MergeBell<F, A> {
    pub fn new(poller: EventPoller<F>, celebration: Celebration<A>, interval: Duration) -> Self {
        Self { poller, celebration, interval }
    }

    /// One poll cycle, celebrating if it found a merge
    pub async fn tick(&mut self) -> bool {
        self.poller.poll_once().await;

        let merged = self.poller.merge_detected();
        if merged {
            self.celebration.celebrate().await;
        }
        merged
    }

    /// Polls until `shutdown` resolves.
    ///
    /// A cycle in progress always completes; shutdown is only observed while
    /// waiting for the next one.
    #[instrument(skip(self, shutdown), fields(interval = ?self.interval))]
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        info!("Starting merge poller");
        tokio::pin!(shutdown);

        loop {
            self.tick().await;

            let delay = self.poller.next_delay(self.interval);
            debug!(
                delay = ?delay,
                watermark = %self.poller.watermark(),
                etag = %self.poller.cache_token(),
                "Waiting for next poll"
            );

            tokio::select! {
                _ = sleep(delay) => {}
                _ = &mut shutdown => {
                    info!("Shutting down merge poller");
                    break;
                }
            }
        }
    }

    pub fn poller(&self) -> &EventPoller<F> {
        &self.poller
    }

    /// What the poller knows right now: login, newest event and quota.
    ///
    /// After a single cycle this is a connectivity check; that cycle only
    /// sets the baseline and never reports a merge.
    pub fn status_report(&self) -> String {
        let poller = &self.poller;
        let newest = poller.last_seen();
        let mut report = format!(
            "login: {}\nnewest event: ",
            poller.login().map_or("<unresolved>", |l| l.as_str()),
        );
        if newest.is_sentinel() {
            report.push_str("<none>");
        } else {
            report.push_str(&format!("{} ({})", newest.id, newest.kind));
        }
        if let Some(rate_limit) = poller.hints().rate_limit {
            report.push_str(&format!(
                "\nrate limit: {}/{} until {}",
                rate_limit.remaining, rate_limit.limit, rate_limit.reset_at
            ));
        }
        report
    }

    #[cfg(test)]
    pub fn celebration(&self) -> &Celebration<A> {
        &self.celebration
    }
}
