use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use crate::guard::Admission;

/// What the gateway did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Issued,
    IssuanceFailed,
    MethodNotAllowed,
    Validated,
    Forwarded,
    MissingToken,
    InvalidToken,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Issued => "issued",
            Outcome::IssuanceFailed => "issuance_failed",
            Outcome::MethodNotAllowed => "method_not_allowed",
            Outcome::Validated => "validated",
            Outcome::Forwarded => "forwarded",
            Outcome::MissingToken => "missing_token",
            Outcome::InvalidToken => "invalid_token",
        }
    }
}

impl From<Admission> for Outcome {
    fn from(admission: Admission) -> Self {
        match admission {
            Admission::Exempt | Admission::Verified => Outcome::Forwarded,
            Admission::MissingToken => Outcome::MissingToken,
            Admission::InvalidToken => Outcome::InvalidToken,
        }
    }
}

type StatusCounts = HashMap<u16, u64>;

/// Minute buckets older than this are dropped.
pub const RETENTION_MINUTES: u64 = 24 * 60;

/// In-memory per-minute status counts keyed by gateway outcome, kept for the
/// last [`RETENTION_MINUTES`].
#[derive(Default)]
pub struct Metrics {
    counts: Mutex<HashMap<Outcome, HashMap<u64, StatusCounts>>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome and the status sent downstream.
    pub fn record(&self, outcome: Outcome, status: u16) {
        self.record_at(outcome, status, SystemTime::now());
    }

    /// Record an outcome at a provided time (useful for tests).
    pub fn record_at(&self, outcome: Outcome, status: u16, at: SystemTime) {
        let minute = Self::minute_bucket(at);
        let mut guard = self.counts.lock().expect("metrics store poisoned");
        let per_minute = guard.entry(outcome).or_default();
        // Prune once per new bucket rather than on every request.
        if !per_minute.contains_key(&minute) {
            per_minute.retain(|bucket, _| bucket + RETENTION_MINUTES > minute);
        }
        *per_minute
            .entry(minute)
            .or_default()
            .entry(status)
            .or_insert(0) += 1;
    }

    /// Per-minute status counts for one outcome. Empty when nothing was recorded.
    pub fn snapshot(&self, outcome: Outcome) -> HashMap<u64, StatusCounts> {
        self.counts
            .lock()
            .expect("metrics store poisoned")
            .get(&outcome)
            .cloned()
            .unwrap_or_default()
    }

    /// Total occurrences of an outcome across all minutes and statuses.
    pub fn total(&self, outcome: Outcome) -> u64 {
        self.snapshot(outcome)
            .values()
            .flat_map(|per_status| per_status.values())
            .sum()
    }

    /// Requests stopped before reaching the upstream for lack of a valid token.
    pub fn rejections(&self) -> u64 {
        self.total(Outcome::MissingToken) + self.total(Outcome::InvalidToken)
    }

    fn minute_bucket(at: SystemTime) -> u64 {
        at.duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
            / 60
    }
}
