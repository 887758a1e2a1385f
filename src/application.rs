//! Application layer module
//!
//! Orchestrates the domain over the infrastructure: the ranking locator,
//! the batch checker, the recurring trigger, and the service facade that
//! wires them together.

pub mod batch_check;
pub mod clock;
pub mod ranking_locator;
pub mod scheduler;
pub mod tracker_service;

pub use batch_check::{BatchChecker, history_name, log_batch_outcomes};
pub use clock::{Clock, FixedClock, SystemClock};
pub use ranking_locator::RankingLocator;
pub use scheduler::{RecurringTrigger, ScheduledJob, SchedulePlan, TriggerSettings, TriggerStatus, next_run_after};
pub use tracker_service::TrackerService;
