//! Boundary-aligned poll loop, one instance per family. Each loop is strictly
//! sequential — compute the delay to the next aligned boundary, sleep, settle,
//! run one fetch-detect-notify cycle, reschedule — so at most one cycle per
//! family is ever in flight. Cycle errors stop at the loop boundary: they are
//! logged, recorded in the last-fetch status, and never kill the loop.

use std::time::Duration;

use chrono::{Duration as Delta, Local, NaiveDateTime, NaiveTime};
use tracing::{error, info};

use crate::config::{
    DEFAULT_POLL_DELAY_SECS, NIGHT_BLOOD_OFFSET_SECS, NIGHT_BLOOD_PERIOD_SECS,
    POLL_BOUNDARY_OFFSET_SECS, POLL_PERIOD_SECS, POLL_SETTLE_BUFFER_SECS,
};
use crate::db::StockStore;
use crate::detector::has_changed;
use crate::error::Result;
use crate::fetcher::{normalize_snapshot, StockFeed};
use crate::notifier::{Composer, NotificationSink};
use crate::status::LastFetchStatus;
use crate::types::Family;

// ---------------------------------------------------------------------------
// Poll plan
// ---------------------------------------------------------------------------

/// Timing parameters for one family's loop.
#[derive(Debug, Clone)]
pub struct PollPlan {
    /// Polls align to multiples of this period, counted from local midnight.
    pub period: Duration,
    /// Fired this long past the boundary so the upstream refresh has landed.
    pub boundary_offset: Duration,
    /// Extra sleep after the timer fires, before fetching.
    pub settle_buffer: Duration,
    /// Used when the computed boundary has already passed.
    pub default_delay: Duration,
}

impl PollPlan {
    /// Main family: five-minute boundaries, 8s offset, 12s settle buffer.
    pub fn main() -> Self {
        Self {
            period: Duration::from_secs(POLL_PERIOD_SECS),
            boundary_offset: Duration::from_secs(POLL_BOUNDARY_OFFSET_SECS),
            settle_buffer: Duration::from_secs(POLL_SETTLE_BUFFER_SECS),
            default_delay: Duration::from_secs(DEFAULT_POLL_DELAY_SECS),
        }
    }

    /// Night/blood family: hour boundaries with a 15s grace offset.
    pub fn night_blood() -> Self {
        Self {
            period: Duration::from_secs(NIGHT_BLOOD_PERIOD_SECS),
            boundary_offset: Duration::from_secs(NIGHT_BLOOD_OFFSET_SECS),
            settle_buffer: Duration::ZERO,
            default_delay: Duration::from_secs(DEFAULT_POLL_DELAY_SECS),
        }
    }
}

/// Delay until the next aligned poll instant: `now` rounded up to the next
/// multiple of the plan's period (from local midnight) plus the boundary
/// offset. A non-positive result — scheduling jitter pushed us past the
/// boundary — falls back to the default delay rather than firing immediately
/// or never.
pub fn next_poll_delay(now: NaiveDateTime, plan: &PollPlan) -> Duration {
    let midnight = NaiveDateTime::new(now.date(), NaiveTime::MIN);
    let period_ms = (plan.period.as_millis() as i64).max(1);
    let elapsed_ms = (now - midnight).num_milliseconds();

    let next_multiple = (elapsed_ms + period_ms - 1) / period_ms;
    let boundary = midnight
        + Delta::milliseconds(next_multiple * period_ms)
        + Delta::milliseconds(plan.boundary_offset.as_millis() as i64);

    match (boundary - now).to_std() {
        Ok(delay) if delay > Duration::ZERO => delay,
        _ => plan.default_delay,
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

pub struct PollScheduler<F, S> {
    family: Family,
    plan: PollPlan,
    feed: F,
    sink: S,
    store: StockStore,
    composer: Composer,
    channel_id: String,
    status: LastFetchStatus,
}

impl<F: StockFeed, S: NotificationSink> PollScheduler<F, S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        family: Family,
        plan: PollPlan,
        feed: F,
        sink: S,
        store: StockStore,
        composer: Composer,
        channel_id: String,
        status: LastFetchStatus,
    ) -> Self {
        Self {
            family,
            plan,
            feed,
            sink,
            store,
            composer,
            channel_id,
            status,
        }
    }

    /// Runs until process shutdown. A new delay is armed only after the
    /// previous cycle fully completed, success or failure.
    pub async fn run(self) {
        loop {
            let delay = next_poll_delay(Local::now().naive_local(), &self.plan);
            tokio::time::sleep(delay).await;
            tokio::time::sleep(self.plan.settle_buffer).await;

            match self.run_cycle().await {
                Ok(notified) => {
                    let message = if notified {
                        "Stock fetched and notified."
                    } else {
                        "Stock unchanged."
                    };
                    info!(family = %self.family, notified, "{message}");
                    self.status.record(true, message);
                }
                Err(e) => {
                    error!(family = %self.family, "Poll cycle failed: {e}");
                    self.status.record(false, e.to_string());
                }
            }
        }
    }

    /// One fetch-detect-notify pass. Returns whether a notification went out.
    ///
    /// A fetch or parse failure returns before the store is touched, so an
    /// untrusted snapshot can neither notify nor overwrite persisted state.
    /// The store is replaced before dispatch — a sink failure is reported,
    /// not redelivered on the next unchanged cycle.
    pub async fn run_cycle(&self) -> Result<bool> {
        let doc = self.feed.fetch().await?;
        let new = normalize_snapshot(&doc, self.family);
        let old = self.store.read_snapshot(self.family).await?;

        if !has_changed(&new, &old) {
            return Ok(false);
        }

        self.store.replace_snapshot(self.family, &new).await?;

        let message = self.composer.compose(&new);
        self.sink.send(&self.channel_id, &message).await?;
        Ok(true)
    }
}
