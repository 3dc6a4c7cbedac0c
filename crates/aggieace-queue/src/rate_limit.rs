// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily and per-minute call budgets for the external converter.
//!
//! Each window counts dispatches and is zeroed by a scheduled reset: the
//! minute window on a fixed 60 second interval, the daily window at local
//! midnight. The limiter only answers "may the next call go out"; holding
//! jobs until a reset is the queue's business. A `warn!` is emitted once per
//! window when 80% of its capacity is consumed.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use aggieace_config::model::RateLimitConfig;
use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Length of the short window.
pub const MINUTE: Duration = Duration::from_secs(60);

/// Which budget a limit or reset applies to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Daily,
    Minute,
}

/// Answer to "may the next external call go out now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Allowed,
    /// The named window is exhausted until `reset_in` elapses.
    Limited {
        window: WindowKind,
        reset_in: Duration,
    },
}

impl Dispatch {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Dispatch::Allowed)
    }
}

/// Point-in-time view of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub count: u32,
    pub limit: u32,
    pub remaining: u32,
    pub reset_in_ms: u64,
}

/// Point-in-time view of both windows, returned to callers with every
/// submission and status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    pub daily: WindowSnapshot,
    pub minute: WindowSnapshot,
}

#[derive(Debug)]
struct Window {
    count: u32,
    limit: u32,
    reset_at: Instant,
    warned: bool,
}

impl Window {
    fn new(limit: u32, reset_at: Instant) -> Self {
        Self {
            count: 0,
            limit,
            reset_at,
            warned: false,
        }
    }

    fn exhausted(&self) -> bool {
        self.count >= self.limit
    }

    fn reset(&mut self, next_reset_at: Instant) {
        self.count = 0;
        self.warned = false;
        self.reset_at = next_reset_at;
    }

    fn record(&mut self, kind: WindowKind) {
        self.count = self.count.saturating_add(1);
        // Integer form of count >= 0.8 * limit.
        if !self.warned && u64::from(self.count) * 5 >= u64::from(self.limit) * 4 {
            self.warned = true;
            warn!(
                window = %kind,
                count = self.count,
                limit = self.limit,
                "approaching rate limit (80%+)"
            );
        }
    }

    fn snapshot(&self, now: Instant) -> WindowSnapshot {
        WindowSnapshot {
            count: self.count,
            limit: self.limit,
            remaining: self.limit.saturating_sub(self.count),
            reset_in_ms: duration_ms(self.reset_at.saturating_duration_since(now)),
        }
    }
}

#[derive(Debug)]
struct Windows {
    daily: Window,
    minute: Window,
}

/// Two independent call budgets with scheduled resets.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<Windows>,
}

impl RateLimiter {
    /// Create a limiter with empty windows.
    pub fn new(config: RateLimitConfig) -> Self {
        let now = Instant::now();
        Self {
            windows: Mutex::new(Windows {
                daily: Window::new(
                    config.max_calls_per_day,
                    now + until_next_midnight(&Local::now()),
                ),
                minute: Window::new(config.max_calls_per_minute, now + MINUTE),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Windows> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check both windows, daily first.
    pub fn can_dispatch(&self) -> Dispatch {
        let windows = self.lock();
        let now = Instant::now();
        for (kind, window) in [
            (WindowKind::Daily, &windows.daily),
            (WindowKind::Minute, &windows.minute),
        ] {
            if window.exhausted() {
                return Dispatch::Limited {
                    window: kind,
                    reset_in: window.reset_at.saturating_duration_since(now),
                };
            }
        }
        Dispatch::Allowed
    }

    /// Count one external call against both windows.
    ///
    /// Call exactly once per call actually issued, before issuing it. The
    /// count stands even if the call then fails.
    pub fn record_dispatch(&self) {
        let mut windows = self.lock();
        windows.daily.record(WindowKind::Daily);
        windows.minute.record(WindowKind::Minute);
        debug!(
            daily = windows.daily.count,
            minute = windows.minute.count,
            "dispatch recorded"
        );
    }

    /// Zero the minute window and schedule its next reset a minute from now.
    pub fn reset_minute(&self) {
        let mut windows = self.lock();
        let previous = windows.minute.count;
        windows.minute.reset(Instant::now() + MINUTE);
        if previous > 0 {
            info!(window = %WindowKind::Minute, previous, "rate limit window reset");
        } else {
            debug!(window = %WindowKind::Minute, "rate limit window reset");
        }
    }

    /// Zero the daily window and schedule its next reset at local midnight.
    pub fn reset_daily(&self) {
        let mut windows = self.lock();
        let previous = windows.daily.count;
        windows
            .daily
            .reset(Instant::now() + until_next_midnight(&Local::now()));
        info!(window = %WindowKind::Daily, previous, "rate limit window reset");
    }

    pub fn snapshot(&self) -> RateLimitSnapshot {
        let windows = self.lock();
        let now = Instant::now();
        RateLimitSnapshot {
            daily: windows.daily.snapshot(now),
            minute: windows.minute.snapshot(now),
        }
    }

    /// Drive both window resets until `shutdown` is cancelled.
    ///
    /// `wake` runs after every reset so work held back by an exhausted
    /// window can proceed.
    pub async fn run_resets<F>(&self, wake: F, shutdown: CancellationToken)
    where
        F: Fn() + Send + Sync,
    {
        let mut minute = tokio::time::interval_at(Instant::now() + MINUTE, MINUTE);
        minute.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let daily = tokio::time::sleep(until_next_midnight(&Local::now()));
        tokio::pin!(daily);

        info!("rate limit reset scheduler started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("rate limit reset scheduler stopped");
                    break;
                }
                _ = minute.tick() => {
                    self.reset_minute();
                    wake();
                }
                _ = &mut daily => {
                    self.reset_daily();
                    daily
                        .as_mut()
                        .reset(Instant::now() + until_next_midnight(&Local::now()));
                    wake();
                }
            }
        }
    }
}

/// Time from `now` until the next midnight in `now`'s timezone.
///
/// When midnight does not exist locally (a DST gap), the first instant of
/// the new day is used instead.
pub fn until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let tz = now.timezone();
    let Some(tomorrow) = now.date_naive().succ_opt() else {
        return Duration::from_secs(24 * 60 * 60);
    };
    let midnight = tomorrow.and_time(chrono::NaiveTime::MIN);
    let next = tz
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(midnight + chrono::Duration::hours(1)))
                .earliest()
        });
    match next {
        Some(next) => next
            .signed_duration_since(now.clone())
            .to_std()
            .unwrap_or(Duration::ZERO),
        None => Duration::from_secs(24 * 60 * 60),
    }
}

pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn limiter(day: u32, minute: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_calls_per_day: day,
            max_calls_per_minute: minute,
        })
    }

    #[tokio::test]
    async fn fresh_limiter_allows_dispatch() {
        let limiter = limiter(100, 5);
        assert_eq!(limiter.can_dispatch(), Dispatch::Allowed);
        let snap = limiter.snapshot();
        assert_eq!(snap.daily.count, 0);
        assert_eq!(snap.minute.remaining, 5);
    }

    #[tokio::test]
    async fn minute_window_exhausts_at_limit() {
        let limiter = limiter(100, 2);
        limiter.record_dispatch();
        assert!(limiter.can_dispatch().is_allowed());
        limiter.record_dispatch();
        match limiter.can_dispatch() {
            Dispatch::Limited { window, reset_in } => {
                assert_eq!(window, WindowKind::Minute);
                assert!(reset_in <= MINUTE);
            }
            Dispatch::Allowed => panic!("minute window should be exhausted"),
        }
    }

    #[tokio::test]
    async fn daily_reason_takes_precedence() {
        let limiter = limiter(1, 1);
        limiter.record_dispatch();
        assert!(matches!(
            limiter.can_dispatch(),
            Dispatch::Limited {
                window: WindowKind::Daily,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn record_increments_both_windows() {
        let limiter = limiter(10, 10);
        limiter.record_dispatch();
        limiter.record_dispatch();
        let snap = limiter.snapshot();
        assert_eq!(snap.daily.count, 2);
        assert_eq!(snap.minute.count, 2);
        assert_eq!(snap.daily.remaining, 8);
    }

    #[tokio::test]
    async fn minute_reset_leaves_daily_count() {
        let limiter = limiter(10, 1);
        limiter.record_dispatch();
        limiter.reset_minute();
        let snap = limiter.snapshot();
        assert_eq!(snap.minute.count, 0);
        assert_eq!(snap.daily.count, 1);
        assert!(limiter.can_dispatch().is_allowed());
    }

    #[tokio::test]
    async fn daily_reset_clears_daily_window() {
        let limiter = limiter(1, 5);
        limiter.record_dispatch();
        assert!(!limiter.can_dispatch().is_allowed());
        limiter.reset_daily();
        assert!(limiter.can_dispatch().is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_resets_minute_window_and_wakes() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let limiter = Arc::new(limiter(100, 1));
        limiter.record_dispatch();
        assert!(!limiter.can_dispatch().is_allowed());

        let wakes = Arc::new(AtomicUsize::new(0));
        let shutdown = CancellationToken::new();
        let task = {
            let limiter = limiter.clone();
            let wakes = wakes.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                let wake = move || {
                    wakes.fetch_add(1, Ordering::SeqCst);
                };
                limiter.run_resets(wake, shutdown).await;
            })
        };

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(!limiter.can_dispatch().is_allowed());
        assert_eq!(wakes.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(limiter.can_dispatch().is_allowed());
        assert!(wakes.load(Ordering::SeqCst) >= 1);

        shutdown.cancel();
        task.await.unwrap();
    }

    #[test]
    fn midnight_is_within_a_day() {
        let d = until_next_midnight(&Utc::now());
        assert!(d > Duration::ZERO);
        assert!(d <= Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn midnight_from_fixed_time() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2025, 8, 25, 22, 30, 0).unwrap();
        assert_eq!(until_next_midnight(&now), Duration::from_secs(90 * 60));
    }

    #[test]
    fn duration_ms_saturates_instead_of_wrapping() {
        assert_eq!(duration_ms(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }

    #[test]
    fn window_kind_renders_lowercase() {
        assert_eq!(WindowKind::Daily.to_string(), "daily");
        assert_eq!("minute".parse::<WindowKind>().unwrap(), WindowKind::Minute);
    }
}
