//! Daily trigger computation and the clock the daemon waits on.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

/// Once per trading day (Monday–Friday) at a market-local time.
///
/// Exchange holidays are not modelled; a run on a holiday simply sees the
/// previous session's chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    run_at: NaiveTime,
    timezone: Tz,
}

impl Schedule {
    pub fn new(run_at: NaiveTime, timezone: Tz) -> Self {
        Self { run_at, timezone }
    }

    pub fn run_at(&self) -> NaiveTime {
        self.run_at
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Whether `date` is a weekday.
    pub fn is_trading_day(date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// The first trigger strictly after `now`.
    pub fn next_trigger(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut date = now.with_timezone(&self.timezone).date_naive();
        loop {
            if Self::is_trading_day(date) {
                let trigger = self.trigger_on(date);
                if trigger > now {
                    return trigger;
                }
            }
            date = date.succ_opt().unwrap_or(date + Duration::days(1));
        }
    }

    /// `run_at` on `date` in the market timezone, as UTC.
    ///
    /// An ambiguous local time (DST fall-back) resolves to the earlier
    /// instant; a nonexistent one (spring-forward gap) moves one hour later.
    pub fn trigger_on(&self, date: NaiveDate) -> DateTime<Utc> {
        let local = date.and_time(self.run_at);
        let resolved = match self.timezone.from_local_datetime(&local) {
            LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => Some(t),
            LocalResult::None => self
                .timezone
                .from_local_datetime(&(local + Duration::hours(1)))
                .earliest(),
        };
        resolved.map_or_else(|| local.and_utc(), |t| t.with_timezone(&Utc))
    }
}

/// Source of the current time and of timed waits.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Suspend until `deadline`; returns immediately if it has passed.
    async fn sleep_until(&self, deadline: DateTime<Utc>);
}

/// Wall clock with tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep_until(&self, deadline: DateTime<Utc>) {
        if let Ok(wait) = (deadline - Utc::now()).to_std() {
            tokio::time::sleep(wait).await;
        }
    }
}
