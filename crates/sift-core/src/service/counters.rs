//! Process-lifetime request counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Endpoints that are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Analyze,
    CompareAnalyze,
    Ask,
    Status,
}

/// Monotonic per-endpoint counters plus a total. Reset on restart.
#[derive(Debug, Default)]
pub struct UsageCounters {
    analyze: AtomicU64,
    compare_analyze: AtomicU64,
    ask: AtomicU64,
    status: AtomicU64,
    total: AtomicU64,
}

/// Point-in-time copy of the counters, as reported by `/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub analyze: u64,
    pub compare_analyze: u64,
    pub ask: u64,
    pub status: u64,
    pub total: u64,
}

impl UsageCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request against `endpoint` and the total.
    pub fn record(&self, endpoint: Endpoint) {
        let counter = match endpoint {
            Endpoint::Analyze => &self.analyze,
            Endpoint::CompareAnalyze => &self.compare_analyze,
            Endpoint::Ask => &self.ask,
            Endpoint::Status => &self.status,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            analyze: self.analyze.load(Ordering::Relaxed),
            compare_analyze: self.compare_analyze.load(Ordering::Relaxed),
            ask: self.ask.load(Ordering::Relaxed),
            status: self.status.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
        }
    }
}
