//! Core types for plate availability checking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::plate;

/// Terminal status of one plate check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlateStatus {
    /// The plate can be registered
    Available,
    /// The plate is taken or otherwise not registrable
    Unavailable,
    /// The service responded, but the text matched no known pattern
    Unknown,
    /// The check could not be completed
    Error,
}

impl PlateStatus {
    /// Uppercase label for console banners
    pub fn label(&self) -> &'static str {
        match self {
            PlateStatus::Available => "AVAILABLE",
            PlateStatus::Unavailable => "UNAVAILABLE",
            PlateStatus::Unknown => "UNKNOWN",
            PlateStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for PlateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PlateStatus::Available => "available",
            PlateStatus::Unavailable => "unavailable",
            PlateStatus::Unknown => "unknown",
            PlateStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// One plate check in progress
///
/// `normalized_plate` is derived once at construction; only `attempt_count`
/// changes afterwards, incremented by the query loop on each attempt.
#[derive(Debug, Clone)]
pub struct PlateQuery {
    pub raw_input: String,
    pub normalized_plate: String,
    pub attempt_count: u32,
}

impl PlateQuery {
    /// Normalize the raw input and start a query at zero attempts.
    pub fn new(raw: &str) -> Result<Self> {
        Ok(Self {
            raw_input: raw.to_string(),
            normalized_plate: plate::normalize(raw)?,
            attempt_count: 0,
        })
    }
}

/// Terminal result of checking one plate
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub plate: String,
    pub status: PlateStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl QueryOutcome {
    pub fn new(plate: impl Into<String>, status: PlateStatus, message: impl Into<String>) -> Self {
        Self {
            plate: plate.into(),
            status,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Aggregated result of a batch run, outcomes in input order
#[derive(Debug, Default)]
pub struct BatchResult {
    pub outcomes: Vec<QueryOutcome>,
    /// Set when the run stopped early on operator interrupt
    pub interrupted: bool,
}

impl BatchResult {
    pub fn push(&mut self, outcome: QueryOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for outcome in &self.outcomes {
            match outcome.status {
                PlateStatus::Available => summary.available += 1,
                PlateStatus::Unavailable => summary.unavailable += 1,
                PlateStatus::Unknown => summary.unknown += 1,
                PlateStatus::Error => summary.error += 1,
            }
        }
        summary
    }
}

/// Per-status counts over a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub available: usize,
    pub unavailable: usize,
    pub unknown: usize,
    pub error: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.available + self.unavailable + self.unknown + self.error
    }
}
