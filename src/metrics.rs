//! Lightweight in-memory metrics for structure editing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use serde::Serialize;

#[derive(Default)]
struct StructureMetrics {
    proposals: AtomicU64,
    cancellations: AtomicU64,
    enqueued: AtomicU64,
    commits: AtomicU64,
    commit_failures: AtomicU64,
    applied: AtomicU64,
    unresolved_attributes: AtomicU64,
    commit_duration_total_ms: AtomicU64,
    commit_duration_max_ms: AtomicU64,
}

static STRUCTURE_METRICS: OnceLock<StructureMetrics> = OnceLock::new();

fn metrics() -> &'static StructureMetrics {
    STRUCTURE_METRICS.get_or_init(StructureMetrics::default)
}

pub fn record_proposal() {
    metrics().proposals.fetch_add(1, Ordering::Relaxed);
}

pub fn record_cancellation() {
    metrics().cancellations.fetch_add(1, Ordering::Relaxed);
}

pub fn record_enqueue() {
    metrics().enqueued.fetch_add(1, Ordering::Relaxed);
}

pub fn record_unresolved_attribute() {
    metrics()
        .unresolved_attributes
        .fetch_add(1, Ordering::Relaxed);
}

pub fn record_commit(duration_ms: f64, applied: usize, success: bool) {
    let duration_ms = duration_ms.max(0.0) as u64;
    let metrics = metrics();
    metrics.commits.fetch_add(1, Ordering::Relaxed);
    if !success {
        metrics.commit_failures.fetch_add(1, Ordering::Relaxed);
    }
    metrics
        .applied
        .fetch_add(applied as u64, Ordering::Relaxed);
    metrics
        .commit_duration_total_ms
        .fetch_add(duration_ms, Ordering::Relaxed);

    let mut current = metrics.commit_duration_max_ms.load(Ordering::Relaxed);
    while duration_ms > current {
        match metrics.commit_duration_max_ms.compare_exchange(
            current,
            duration_ms,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(next) => current = next,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StructureMetricsSnapshot {
    pub proposals: u64,
    pub cancellations: u64,
    pub enqueued: u64,
    pub commits: u64,
    pub commit_failures: u64,
    pub applied: u64,
    pub unresolved_attributes: u64,
    pub avg_commit_ms: Option<f64>,
    pub max_commit_ms: Option<u64>,
}

pub fn snapshot() -> StructureMetricsSnapshot {
    let metrics = metrics();
    let commits = metrics.commits.load(Ordering::Relaxed);
    let duration_total = metrics.commit_duration_total_ms.load(Ordering::Relaxed);
    let max_ms = metrics.commit_duration_max_ms.load(Ordering::Relaxed);

    let avg_commit_ms = if commits > 0 {
        Some(duration_total as f64 / commits as f64)
    } else {
        None
    };

    StructureMetricsSnapshot {
        proposals: metrics.proposals.load(Ordering::Relaxed),
        cancellations: metrics.cancellations.load(Ordering::Relaxed),
        enqueued: metrics.enqueued.load(Ordering::Relaxed),
        commits,
        commit_failures: metrics.commit_failures.load(Ordering::Relaxed),
        applied: metrics.applied.load(Ordering::Relaxed),
        unresolved_attributes: metrics.unresolved_attributes.load(Ordering::Relaxed),
        avg_commit_ms,
        max_commit_ms: if max_ms > 0 { Some(max_ms) } else { None },
    }
}
