//! Recurring trigger
//!
//! A single background task wakes at a fixed local hour in a fixed timezone,
//! runs the scheduled job once, and re-arms. The trigger is an owned handle:
//! `start` spawns the loop, `stop` cancels it and joins with a bounded wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::clock::Clock;
use crate::domain::TrackerError;
use crate::infrastructure::config::SchedulerConfig;

/// Work the trigger runs at every wake-up
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    async fn run_once(&self) -> anyhow::Result<()>;
}

/// Next `run_hour:00` in `timezone` strictly after `now`.
///
/// At or after today's run hour the next run is tomorrow's. An ambiguous
/// local time resolves to its earlier instant; a skipped one is an error.
pub fn next_run_after(now: DateTime<Utc>, run_hour: u32, timezone: Tz) -> Result<DateTime<Tz>, TrackerError> {
    let local = now.with_timezone(&timezone);
    let today = local.date_naive();
    let run_date = if local.hour() >= run_hour {
        today
            .succ_opt()
            .ok_or_else(|| TrackerError::scheduler_loop("date overflow computing next run"))?
    } else {
        today
    };

    let naive = run_date
        .and_hms_opt(run_hour, 0, 0)
        .ok_or_else(|| TrackerError::scheduler_loop(format!("{run_hour} is not a valid hour")))?;
    timezone
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| TrackerError::scheduler_loop(format!("{naive} does not exist in {timezone}")))
}

#[derive(Debug, Clone, Copy)]
pub struct TriggerSettings {
    pub run_hour: u32,
    pub timezone: Tz,
    pub error_backoff: Duration,
    pub join_timeout: Duration,
}

impl TriggerSettings {
    pub fn from_config(config: &SchedulerConfig) -> Result<Self, TrackerError> {
        Ok(Self {
            run_hour: config.run_hour,
            timezone: config.tz()?,
            error_backoff: config.error_backoff(),
            join_timeout: config.stop_join_timeout(),
        })
    }
}

/// Snapshot reported to callers; `next_run_at` is recomputed on every query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerStatus {
    pub running: bool,
    pub next_run_at: Option<DateTime<Tz>>,
    pub now: DateTime<Tz>,
}

/// The configured daily schedule, whether or not a trigger loop is running
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePlan {
    pub run_hour: u32,
    pub timezone: String,
    pub next_run_at: Option<DateTime<Tz>>,
    pub now: DateTime<Tz>,
}

impl TriggerSettings {
    /// Where the next run would land if the trigger were started at `now`
    pub fn plan(&self, now: DateTime<Utc>) -> SchedulePlan {
        SchedulePlan {
            run_hour: self.run_hour,
            timezone: self.timezone.name().to_string(),
            next_run_at: next_run_after(now, self.run_hour, self.timezone).ok(),
            now: now.with_timezone(&self.timezone),
        }
    }
}

struct LoopHandle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

pub struct RecurringTrigger {
    job: Arc<dyn ScheduledJob>,
    clock: Arc<dyn Clock>,
    settings: TriggerSettings,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<LoopHandle>>,
}

impl RecurringTrigger {
    pub fn new(job: Arc<dyn ScheduledJob>, clock: Arc<dyn Clock>, settings: TriggerSettings) -> Self {
        Self {
            job,
            clock,
            settings,
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the loop. Returns `false` when it was already running.
    pub fn start(&self) -> bool {
        let Ok(mut slot) = self.handle.lock() else {
            error!("Trigger handle lock poisoned; not starting");
            return false;
        };
        if slot.is_some() {
            info!("⏰ Scheduler already running");
            return false;
        }

        self.running.store(true, Ordering::SeqCst);
        let token = CancellationToken::new();
        let join = tokio::spawn(run_loop(
            Arc::clone(&self.job),
            Arc::clone(&self.clock),
            self.settings,
            Arc::clone(&self.running),
            token.clone(),
        ));
        *slot = Some(LoopHandle { token, join });

        info!(
            "⏰ Scheduler started: daily at {:02}:00 {}",
            self.settings.run_hour, self.settings.timezone
        );
        true
    }

    /// Signal the loop and wait up to the join timeout. Returns `false` when it was not running.
    pub async fn stop(&self) -> bool {
        let taken = match self.handle.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        let Some(LoopHandle { token, join }) = taken else {
            info!("⏰ Scheduler not running");
            return false;
        };

        self.running.store(false, Ordering::SeqCst);
        token.cancel();
        match tokio::time::timeout(self.settings.join_timeout, join).await {
            Ok(Ok(())) => info!("⏹️ Scheduler stopped"),
            Ok(Err(e)) => warn!("Scheduler task ended abnormally: {}", e),
            Err(_) => warn!(
                "Scheduler did not stop within {:?}; continuing without it",
                self.settings.join_timeout
            ),
        }
        true
    }

    pub fn plan(&self) -> SchedulePlan {
        self.settings.plan(self.clock.now())
    }

    pub fn status(&self) -> TriggerStatus {
        let now = self.clock.now();
        let running = self.is_running();
        let next_run_at = if running {
            next_run_after(now, self.settings.run_hour, self.settings.timezone).ok()
        } else {
            None
        };
        TriggerStatus {
            running,
            next_run_at,
            now: now.with_timezone(&self.settings.timezone),
        }
    }
}

impl Drop for RecurringTrigger {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().ok().and_then(|mut slot| slot.take()) {
            handle.token.cancel();
        }
    }
}

/// Sleep unless cancelled first. Returns `true` on cancellation.
async fn sleep_or_cancel(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        () = tokio::time::sleep(duration) => false,
        () = token.cancelled() => true,
    }
}

async fn run_loop(
    job: Arc<dyn ScheduledJob>,
    clock: Arc<dyn Clock>,
    settings: TriggerSettings,
    running: Arc<AtomicBool>,
    token: CancellationToken,
) {
    while running.load(Ordering::SeqCst) {
        let now = clock.now();
        let wait = match next_run_after(now, settings.run_hour, settings.timezone) {
            Ok(next) => {
                info!("⏰ Next scheduled run at {}", next.format("%Y-%m-%d %H:%M:%S %Z"));
                (next.with_timezone(&Utc) - now).to_std().unwrap_or(Duration::ZERO)
            }
            Err(e) => {
                error!("Scheduler loop error: {}; retrying in {:?}", e, settings.error_backoff);
                if sleep_or_cancel(&token, settings.error_backoff).await {
                    break;
                }
                continue;
            }
        };

        if sleep_or_cancel(&token, wait).await || !running.load(Ordering::SeqCst) {
            break;
        }

        info!("🚀 Running scheduled ranking checks");
        if let Err(e) = job.run_once().await {
            error!("❌ Scheduled run failed: {:#}", e);
        }
    }
    info!("⏰ Scheduler loop exited");
}
