//! Error taxonomy for ranking checks
//!
//! Only `Validation` is ever surfaced to a direct caller of `locate`. Every
//! other variant is absorbed at a strategy, entry, or loop boundary and turned
//! into a best-effort result or a log line.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Invalid input '{input}': {reason}")]
    Validation { input: String, reason: String },

    #[error("Transport failure for {url}: {message}")]
    Transport {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Browser automation unavailable: {reason}")]
    AutomationUnavailable { reason: String },

    #[error("Browser automation failed: {message}")]
    Browser { message: String },

    #[error("Scheduler loop error: {message}")]
    SchedulerLoop { message: String },

    #[error("Check failed for tracked entry {entry_id}: {message}")]
    EntryCheck { entry_id: i64, message: String },

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Configuration error: {field} - {message}")]
    Config { field: String, message: String },
}

impl TrackerError {
    pub fn validation(input: &str, reason: &str) -> Self {
        Self::Validation {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Non-success HTTP status for one page request
    pub fn http_status(url: &str, status: u16) -> Self {
        Self::Transport {
            url: url.to_string(),
            status: Some(status),
            message: format!("HTTP {status}"),
        }
    }

    pub fn transport(url: &str, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.to_string(),
            status: None,
            message: message.into(),
        }
    }

    pub fn automation_unavailable(reason: impl Into<String>) -> Self {
        Self::AutomationUnavailable {
            reason: reason.into(),
        }
    }

    pub fn browser(message: impl Into<String>) -> Self {
        Self::Browser {
            message: message.into(),
        }
    }

    pub fn scheduler_loop(message: impl Into<String>) -> Self {
        Self::SchedulerLoop {
            message: message.into(),
        }
    }

    pub fn entry_check(entry_id: i64, message: impl Into<String>) -> Self {
        Self::EntryCheck {
            entry_id,
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn config(field: &str, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Whether the failure stays inside the best-effort envelope (degrades a
    /// strategy, an entry, or one loop iteration) instead of reaching the caller.
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Validation { .. } | Self::Config { .. } => false,
            Self::Transport { .. }
            | Self::AutomationUnavailable { .. }
            | Self::Browser { .. }
            | Self::SchedulerLoop { .. }
            | Self::EntryCheck { .. }
            | Self::Store { .. } => true,
        }
    }

    /// A fatal error ends the strategy's page loop; an unavailable backend
    /// means the strategy never started.
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::AutomationUnavailable { .. })
    }
}
