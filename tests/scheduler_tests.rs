//! Recurring trigger lifecycle on a paused tokio clock
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Europe::Amsterdam;
use rank_tracker::application::{Clock, RecurringTrigger, ScheduledJob, TriggerSettings};
use tokio::time::{Instant, sleep};

/// Wall clock that follows tokio's (paused) time from a fixed starting instant
struct TokioClock {
    base: DateTime<Utc>,
    started: Instant,
    reads: AtomicU32,
}

impl TokioClock {
    fn at_amsterdam(h: u32, m: u32, s: u32) -> Arc<Self> {
        let base = Amsterdam
            .with_ymd_and_hms(2025, 6, 14, h, m, s)
            .unwrap()
            .with_timezone(&Utc);
        Arc::new(Self {
            base,
            started: Instant::now(),
            reads: AtomicU32::new(0),
        })
    }

    fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.base + chrono::Duration::from_std(self.started.elapsed()).unwrap()
    }
}

#[derive(Default)]
struct CountingJob {
    runs: AtomicU32,
    fail: bool,
    work: Duration,
}

impl CountingJob {
    fn runs(&self) -> u32 {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScheduledJob for CountingJob {
    async fn run_once(&self) -> anyhow::Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if !self.work.is_zero() {
            sleep(self.work).await;
        }
        if self.fail {
            anyhow::bail!("store unreachable");
        }
        Ok(())
    }
}

fn settings() -> TriggerSettings {
    TriggerSettings {
        run_hour: 9,
        timezone: Amsterdam,
        error_backoff: Duration::from_secs(3600),
        join_timeout: Duration::from_secs(5),
    }
}

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::test(start_paused = true)]
async fn job_runs_at_the_configured_hour() {
    let job = Arc::new(CountingJob::default());
    let trigger = RecurringTrigger::new(job.clone(), TokioClock::at_amsterdam(8, 59, 0), settings());

    assert!(trigger.start());
    sleep(Duration::from_secs(30)).await;
    assert_eq!(job.runs(), 0);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(job.runs(), 1);

    assert!(trigger.stop().await);
}

#[tokio::test(start_paused = true)]
async fn failing_job_keeps_the_loop_alive() {
    let job = Arc::new(CountingJob {
        fail: true,
        ..CountingJob::default()
    });
    let trigger = RecurringTrigger::new(job.clone(), TokioClock::at_amsterdam(8, 59, 0), settings());

    trigger.start();
    sleep(DAY * 2 + Duration::from_secs(120)).await;

    assert_eq!(job.runs(), 3);
    assert!(trigger.is_running());
    trigger.stop().await;
}

#[tokio::test(start_paused = true)]
async fn start_and_stop_are_idempotent() {
    let trigger = RecurringTrigger::new(
        Arc::new(CountingJob::default()),
        TokioClock::at_amsterdam(8, 0, 0),
        settings(),
    );

    assert!(!trigger.stop().await);
    assert!(trigger.start());
    assert!(!trigger.start());
    assert!(trigger.stop().await);
    assert!(!trigger.stop().await);
    assert!(trigger.start());
    trigger.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stop_during_sleep_prevents_the_run() {
    let job = Arc::new(CountingJob::default());
    let trigger = RecurringTrigger::new(job.clone(), TokioClock::at_amsterdam(8, 0, 0), settings());

    trigger.start();
    sleep(Duration::from_secs(30 * 60)).await;
    assert!(trigger.stop().await);

    sleep(Duration::from_secs(2 * 60 * 60)).await;
    assert_eq!(job.runs(), 0);
    assert!(!trigger.is_running());
}

#[tokio::test(start_paused = true)]
async fn status_reports_next_run_only_while_running() {
    let trigger = RecurringTrigger::new(
        Arc::new(CountingJob::default()),
        TokioClock::at_amsterdam(10, 0, 0),
        settings(),
    );

    let stopped = trigger.status();
    assert!(!stopped.running);
    assert_eq!(stopped.next_run_at, None);
    assert_eq!(stopped.now, Amsterdam.with_ymd_and_hms(2025, 6, 14, 10, 0, 0).unwrap());

    trigger.start();
    let running = trigger.status();
    assert!(running.running);
    assert_eq!(
        running.next_run_at,
        Some(Amsterdam.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap())
    );

    let json = serde_json::to_value(&running).unwrap();
    assert!(json["nextRunAt"].is_string());
    trigger.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stop_gives_up_on_in_flight_job_after_join_timeout() {
    let job = Arc::new(CountingJob {
        work: Duration::from_secs(60 * 60),
        ..CountingJob::default()
    });
    let trigger = RecurringTrigger::new(job.clone(), TokioClock::at_amsterdam(8, 59, 0), settings());

    trigger.start();
    sleep(Duration::from_secs(61)).await;
    assert_eq!(job.runs(), 1);

    let before = Instant::now();
    assert!(trigger.stop().await);
    let waited = before.elapsed();
    assert!(waited >= Duration::from_secs(5));
    assert!(waited < Duration::from_secs(60));
    assert!(!trigger.is_running());
}

#[tokio::test(start_paused = true)]
async fn scheduling_error_backs_off_and_keeps_running() {
    let job = Arc::new(CountingJob::default());
    let clock = TokioClock::at_amsterdam(8, 0, 0);
    let trigger = RecurringTrigger::new(
        job.clone(),
        clock.clone(),
        TriggerSettings {
            run_hour: 24,
            ..settings()
        },
    );

    trigger.start();
    sleep(Duration::from_secs(30 * 60)).await;
    assert_eq!(clock.reads(), 1);

    // One attempt per backoff hour: t = 0h, 1h, 2h, 3h
    sleep(Duration::from_secs(3 * 60 * 60)).await;
    assert_eq!(clock.reads(), 4);
    assert_eq!(job.runs(), 0);
    assert!(trigger.is_running());

    assert!(trigger.stop().await);
}
