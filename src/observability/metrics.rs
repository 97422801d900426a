//! Thread-safe metrics collection system
//!
//! Provides atomic counters and mutex-protected collections for tracking runs,
//! which handler answered them, how often retrieval fell back to search, and
//! where failures happened.

use crate::error::Stage;
use crate::handlers::HandlerKind;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Number of recent run durations kept for statistics
const MAX_RUN_TIMES: usize = 1000;

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

/// Thread-safe metrics collector using atomics and mutexes
pub struct MetricsCollector {
    runs_started: AtomicU64,
    runs_completed: AtomicU64,
    runs_failed: AtomicU64,
    runs_cancelled: AtomicU64,
    empty_queries_rejected: AtomicU64,
    rag_fallbacks: AtomicU64,

    // Indexed by position in HandlerKind::ALL / Stage::ALL
    completions_by_handler: [AtomicU64; 3],
    failures_by_stage: [AtomicU64; 5],

    run_times: Mutex<Vec<u64>>, // in milliseconds
    started_at: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            runs_started: AtomicU64::new(0),
            runs_completed: AtomicU64::new(0),
            runs_failed: AtomicU64::new(0),
            runs_cancelled: AtomicU64::new(0),
            empty_queries_rejected: AtomicU64::new(0),
            rag_fallbacks: AtomicU64::new(0),
            completions_by_handler: Default::default(),
            failures_by_stage: Default::default(),
            run_times: Mutex::new(Vec::new()),
            started_at: AtomicU64::new(current_timestamp()),
        }
    }

    pub fn run_started(&self) {
        self.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn run_completed(&self, handler: HandlerKind, duration: Duration) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
        self.completions_by_handler[handler_slot(handler)].fetch_add(1, Ordering::Relaxed);
        self.record_run_time(duration);
    }

    /// A failure without a stage never reached a handler
    pub fn run_failed(&self, stage: Option<Stage>, duration: Duration) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
        if let Some(stage) = stage {
            self.failures_by_stage[stage_slot(stage)].fetch_add(1, Ordering::Relaxed);
        }
        self.record_run_time(duration);
    }

    /// A run dropped before it completed or failed
    pub fn run_cancelled(&self, duration: Duration) {
        self.runs_cancelled.fetch_add(1, Ordering::Relaxed);
        self.record_run_time(duration);
    }

    pub fn empty_query_rejected(&self) {
        self.empty_queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rag_fallback(&self) {
        self.rag_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    fn record_run_time(&self, duration: Duration) {
        if let Ok(mut times) = self.run_times.lock() {
            times.push(duration.as_millis() as u64);
            if times.len() > MAX_RUN_TIMES {
                times.remove(0);
            }
        }
    }

    /// Average, p50 and p95 of recorded run times (pure function)
    fn run_time_statistics(&self) -> (f64, f64, f64) {
        let Ok(times) = self.run_times.lock() else {
            return (0.0, 0.0, 0.0);
        };
        if times.is_empty() {
            return (0.0, 0.0, 0.0);
        }

        let mut sorted = times.clone();
        sorted.sort_unstable();
        let avg = sorted.iter().sum::<u64>() as f64 / sorted.len() as f64;
        (avg, percentile(&sorted, 50.0), percentile(&sorted, 95.0))
    }

    /// Get complete metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let now = current_timestamp();
        let (avg_run_time_ms, p50, p95) = self.run_time_statistics();

        let completions_by_handler = HandlerKind::ALL
            .iter()
            .map(|kind| {
                let count = self.completions_by_handler[handler_slot(*kind)].load(Ordering::Relaxed);
                (kind.as_str().to_string(), count)
            })
            .collect();

        let failures_by_stage = Stage::ALL
            .iter()
            .map(|stage| {
                let count = self.failures_by_stage[stage_slot(*stage)].load(Ordering::Relaxed);
                (stage.as_str().to_string(), count)
            })
            .collect();

        MetricsSnapshot {
            runs: RunMetrics {
                started: self.runs_started.load(Ordering::Relaxed),
                completed: self.runs_completed.load(Ordering::Relaxed),
                failed: self.runs_failed.load(Ordering::Relaxed),
                cancelled: self.runs_cancelled.load(Ordering::Relaxed),
                empty_queries_rejected: self.empty_queries_rejected.load(Ordering::Relaxed),
                avg_run_time_ms,
                run_time_p50_ms: p50,
                run_time_p95_ms: p95,
            },
            routing: RoutingMetrics {
                completions_by_handler,
                rag_fallbacks: self.rag_fallbacks.load(Ordering::Relaxed),
            },
            failures_by_stage,
            uptime_seconds: now.saturating_sub(self.started_at.load(Ordering::Relaxed)),
            timestamp: now,
        }
    }

    // Reset all metrics (useful for testing)
    pub fn reset(&self) {
        self.runs_started.store(0, Ordering::Relaxed);
        self.runs_completed.store(0, Ordering::Relaxed);
        self.runs_failed.store(0, Ordering::Relaxed);
        self.runs_cancelled.store(0, Ordering::Relaxed);
        self.empty_queries_rejected.store(0, Ordering::Relaxed);
        self.rag_fallbacks.store(0, Ordering::Relaxed);
        for counter in self
            .completions_by_handler
            .iter()
            .chain(self.failures_by_stage.iter())
        {
            counter.store(0, Ordering::Relaxed);
        }
        if let Ok(mut times) = self.run_times.lock() {
            times.clear();
        }
        self.started_at.store(current_timestamp(), Ordering::Relaxed);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

// Public metrics structures
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub runs: RunMetrics,
    pub routing: RoutingMetrics,
    pub failures_by_stage: BTreeMap<String, u64>,
    pub uptime_seconds: u64,
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
pub struct RunMetrics {
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
    /// Every started run ends up in exactly one of completed, failed or cancelled
    pub cancelled: u64,
    pub empty_queries_rejected: u64,
    pub avg_run_time_ms: f64,
    pub run_time_p50_ms: f64,
    pub run_time_p95_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct RoutingMetrics {
    pub completions_by_handler: BTreeMap<String, u64>,
    pub rag_fallbacks: u64,
}

// Helper functions
fn handler_slot(handler: HandlerKind) -> usize {
    match handler {
        HandlerKind::Math => 0,
        HandlerKind::Rag => 1,
        HandlerKind::Search => 2,
    }
}

fn stage_slot(stage: Stage) -> usize {
    match stage {
        Stage::Router => 0,
        Stage::Math => 1,
        Stage::RagRetrieve => 2,
        Stage::RagGenerate => 3,
        Stage::Search => 4,
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn percentile(sorted_data: &[u64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let len = sorted_data.len();
    let index = (percentile / 100.0) * (len - 1) as f64;

    if index.fract() == 0.0 {
        sorted_data[index as usize] as f64
    } else {
        let lower_value = sorted_data[index.floor() as usize] as f64;
        let upper_value = sorted_data[index.ceil() as usize] as f64;
        lower_value + (upper_value - lower_value) * index.fract()
    }
}
