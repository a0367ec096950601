// Usage Statistics Service
// Process-wide detection counters and date-bucketed history behind one lock

use crate::models::{HistoryEntry, StatsSnapshot};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::warn;

pub const MAX_HISTORY_DAYS: usize = 30;

#[derive(Debug, Default)]
struct StatsInner {
    total_count: u64,
    history: VecDeque<HistoryEntry>,
}

/// Shared usage tracker.
///
/// Both counters live behind a single mutex so the running total and the
/// date-bucketed history stay consistent with each other; no access bypasses
/// the lock.
pub struct DetectionStats {
    inner: Mutex<StatsInner>,
    max_history_days: usize,
}

impl Default for DetectionStats {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionStats {
    pub fn new() -> Self {
        Self::with_max_history(MAX_HISTORY_DAYS)
    }

    pub fn with_max_history(max_history_days: usize) -> Self {
        Self {
            inner: Mutex::new(StatsInner::default()),
            max_history_days,
        }
    }

    /// Record one successful analysis. Called at most once per validated
    /// analysis, never on failure paths.
    pub fn record_detection(&self) {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        self.record_on(&today);
    }

    fn record_on(&self, today: &str) {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(e) => {
                warn!("[STATS] record skipped, lock poisoned: {}", e);
                return;
            }
        };

        inner.total_count += 1;

        let same_day = inner.history.back().map_or(false, |entry| entry.date == today);
        if same_day {
            if let Some(entry) = inner.history.back_mut() {
                entry.count += 1;
            }
        } else {
            inner.history.push_back(HistoryEntry {
                date: today.to_string(),
                count: 1,
            });
        }

        if inner.history.len() > self.max_history_days {
            inner.history.pop_front();
        }
    }

    /// Snapshot of the current counters. Never fails: any internal error maps
    /// to the empty default here so the statistics surface always returns
    /// well-formed output.
    pub fn read_stats(&self) -> StatsSnapshot {
        match self.inner.lock() {
            Ok(inner) => StatsSnapshot {
                total_detection_count: inner.total_count,
                history: inner.history.iter().cloned().collect(),
            },
            Err(e) => {
                warn!("[STATS] read failed, returning empty default: {}", e);
                StatsSnapshot::default()
            }
        }
    }
}
