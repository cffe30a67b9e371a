//! Query benchmarking.
//!
//! The adapter reports each statement to a [`Profiler`] when profiling is
//! enabled: `start` before execution, then `stop` once the statement
//! succeeds or `delete` when it fails. [`MemoryProfiler`] keeps the marks in
//! process so they can be inspected or reported.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Handle to a running benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BenchmarkToken(u64);

impl BenchmarkToken {
    /// Numeric id of the benchmark
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Receiver of query benchmarks.
pub trait Profiler: Send + Sync {
    /// Starts a benchmark named `name` in `group`.
    fn start(&self, group: &str, name: &str) -> BenchmarkToken;

    /// Stops a running benchmark, keeping its measurement.
    fn stop(&self, token: BenchmarkToken);

    /// Discards a benchmark entirely.
    fn delete(&self, token: BenchmarkToken);
}

/// A recorded benchmark.
#[derive(Debug, Clone)]
pub struct Mark {
    pub group: String,
    pub name: String,
    pub started: Instant,
    /// `None` while the benchmark is still running
    pub elapsed: Option<Duration>,
}

impl Mark {
    /// True once `stop` has been called for this mark
    pub const fn is_stopped(&self) -> bool {
        self.elapsed.is_some()
    }
}

/// In-process profiler.
///
/// # Example
/// ```rust
/// use sphinxql_core::profiler::{MemoryProfiler, Profiler};
///
/// let profiler = MemoryProfiler::new();
/// let token = profiler.start("Database (default)", "SELECT 1");
/// profiler.stop(token);
///
/// assert_eq!(profiler.marks().len(), 1);
/// assert!(profiler.marks()[0].is_stopped());
/// ```
#[derive(Debug, Default)]
pub struct MemoryProfiler {
    next_id: AtomicU64,
    marks: Mutex<BTreeMap<BenchmarkToken, Mark>>,
}

impl MemoryProfiler {
    /// Creates a profiler with no marks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all marks, in start order.
    pub fn marks(&self) -> Vec<Mark> {
        self.lock().values().cloned().collect()
    }

    /// Distinct group names, sorted.
    pub fn groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = self.lock().values().map(|m| m.group.clone()).collect();
        groups.sort();
        groups.dedup();
        groups
    }

    /// Sum of the elapsed time of every stopped mark in `group`.
    pub fn total(&self, group: &str) -> Duration {
        self.lock()
            .values()
            .filter(|m| m.group == group)
            .filter_map(|m| m.elapsed)
            .sum()
    }

    /// Removes every mark.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<BenchmarkToken, Mark>> {
        self.marks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Profiler for MemoryProfiler {
    fn start(&self, group: &str, name: &str) -> BenchmarkToken {
        let token = BenchmarkToken(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(
            token,
            Mark {
                group: group.to_string(),
                name: name.to_string(),
                started: Instant::now(),
                elapsed: None,
            },
        );
        token
    }

    fn stop(&self, token: BenchmarkToken) {
        if let Some(mark) = self.lock().get_mut(&token)
            && mark.elapsed.is_none()
        {
            let elapsed = mark.started.elapsed();
            tracing::trace!(group = %mark.group, elapsed_us = elapsed.as_micros(), "benchmark stopped");
            mark.elapsed = Some(elapsed);
        }
    }

    fn delete(&self, token: BenchmarkToken) {
        self.lock().remove(&token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_and_stop() {
        let profiler = MemoryProfiler::new();
        let token = profiler.start("Database (default)", "SELECT * FROM idx");

        assert!(!profiler.marks()[0].is_stopped());
        profiler.stop(token);

        let marks = profiler.marks();
        assert_eq!(marks.len(), 1);
        assert!(marks[0].is_stopped());
        assert_eq!(marks[0].name, "SELECT * FROM idx");
    }

    #[test]
    fn test_delete_discards_mark() {
        let profiler = MemoryProfiler::new();
        let kept = profiler.start("g", "kept");
        let dropped = profiler.start("g", "dropped");

        profiler.delete(dropped);
        profiler.stop(kept);

        let marks = profiler.marks();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].name, "kept");
    }

    #[test]
    fn test_unknown_tokens_are_ignored() {
        let profiler = MemoryProfiler::new();
        let token = profiler.start("g", "q");
        profiler.delete(token);

        profiler.stop(token);
        profiler.delete(token);
        assert!(profiler.marks().is_empty());
    }

    #[test]
    fn test_groups_and_totals() {
        let profiler = MemoryProfiler::new();
        let a = profiler.start("Database (a)", "q1");
        let b = profiler.start("Database (b)", "q2");
        let running = profiler.start("Database (a)", "q3");
        profiler.stop(a);
        profiler.stop(b);

        assert_eq!(profiler.groups(), vec!["Database (a)", "Database (b)"]);
        assert_eq!(
            profiler.total("Database (a)"),
            profiler.marks()[0].elapsed.unwrap()
        );
        assert!(profiler.marks()[2].elapsed.is_none());
        let _ = running;

        profiler.clear();
        assert!(profiler.marks().is_empty());
    }

    #[test]
    fn test_tokens_are_unique() {
        let profiler = MemoryProfiler::new();
        let first = profiler.start("g", "a");
        let second = profiler.start("g", "b");
        assert_ne!(first, second);
        assert!(second.id() > first.id());
    }
}
