//! Tracked-product entities consumed by the batch checker

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Tracked configuration row owned by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedProduct {
    pub id: i64,
    pub keyword: String,
    pub target_id: String,
    pub product_url: String,
    pub product_name: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub stop_after_days: Option<u32>,
    pub schedule_enabled: bool,
}

impl TrackedProduct {
    /// Instant after which the entry must be deactivated, if it expires at all.
    ///
    /// A limit past the representable calendar never expires.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.stop_after_days
            .and_then(|days| Duration::try_days(i64::from(days)))
            .and_then(|limit| self.created_at.checked_add_signed(limit))
    }

    /// `now >= created_at + stop_after_days`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|deadline| now >= deadline)
    }

    /// Stored name, ignoring empty values and the literal "None" older rows carry.
    pub fn stored_name(&self) -> Option<&str> {
        self.product_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != "None")
    }
}

/// Insert payload for a new tracked entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrackedProduct {
    pub keyword: String,
    pub target_id: String,
    pub product_url: String,
    pub product_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub stop_after_days: Option<u32>,
}

/// One recorded ranking check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingHistoryEntry {
    pub keyword: String,
    pub target_id: String,
    pub product_name: String,
    /// Position on the page where the target was found
    pub position: Option<u32>,
    pub absolute_position: Option<u32>,
    pub checked_at: DateTime<Utc>,
}

/// Per-entry outcome of one batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Checked {
        id: i64,
        keyword: String,
        target_id: String,
        position: Option<u32>,
        absolute_position: Option<u32>,
        total_scanned: u32,
    },
    DeactivatedExpired {
        id: i64,
        keyword: String,
        target_id: String,
    },
    Error {
        id: i64,
        keyword: String,
        target_id: String,
        error: String,
    },
}

impl BatchOutcome {
    pub const fn entry_id(&self) -> i64 {
        match self {
            Self::Checked { id, .. } | Self::DeactivatedExpired { id, .. } | Self::Error { id, .. } => *id,
        }
    }
}

/// Counts logged after every batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub successful: usize,
    pub errors: usize,
    pub deactivated: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[BatchOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut acc, outcome| {
            match outcome {
                BatchOutcome::Checked { .. } => acc.successful += 1,
                BatchOutcome::Error { .. } => acc.errors += 1,
                BatchOutcome::DeactivatedExpired { .. } => acc.deactivated += 1,
            }
            acc
        })
    }
}
