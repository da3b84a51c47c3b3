//! ## Manager module
//!
//! The decision-making part of the scheduler. Ride requests arrive in the
//! [request_queue::RequestQueue], the single dispatch task drains it, asks
//! [task_allocator::select_elevator] for the nearest eligible elevator and either emits a
//! MOVE through [dispatcher::dispatch] or backs off and requeues.
//!
//! ## Sub-modules
//! - [request_queue]: FIFO buffer with a blocking dequeue.
//! - [task_allocator]: greedy nearest-eligible selection.
//! - [dispatcher]: command emitter and the retry/backoff loop.

pub mod dispatcher;
pub mod request_queue;
pub mod task_allocator;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::SchedulerConfig;
use crate::print;
use crate::registry::Registry;
use request_queue::RequestQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Direction a ride request was made in.
pub enum Direction {
    /// Travelling upwards
    Up,
    /// Travelling downwards
    Down,
}

impl Direction {
    /// Wire token of the direction
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One ride request from a floor.
pub struct Request {
    /// Floor the request was made on
    pub origin_floor: u8,
    /// Floor the passenger wants to go to
    pub target_floor: u8,
    /// Direction button that was pressed
    pub direction: Direction,
}

impl Request {
    /// Creates a new request
    pub fn new(origin_floor: u8, direction: Direction, target_floor: u8) -> Self {
        Self { origin_floor, target_floor, direction }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.origin_floor, self.target_floor, self.direction)
    }
}

/// Counters kept by the dispatch loop. Only the dispatch task writes them.
#[derive(Debug)]
pub struct DispatchStats {
    move_count: AtomicU64,
    requests_handled: AtomicU64,
    retries: AtomicU64,
    started_at: Instant,
}

/// Plain copy of [DispatchStats] for printing and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct StatsSnapshot {
    pub move_count: u64,
    pub requests_handled: u64,
    pub retries: u64,
    pub uptime: Duration,
}

impl Default for DispatchStats {
    fn default() -> Self {
        Self {
            move_count: AtomicU64::new(0),
            requests_handled: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }
}

impl DispatchStats {
    /// Records one emitted MOVE for one handled request.
    pub fn record_dispatch(&self) {
        self.move_count.fetch_add(1, Ordering::Relaxed);
        self.requests_handled.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one backoff/requeue.
    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Current values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            move_count: self.move_count.load(Ordering::Relaxed),
            requests_handled: self.requests_handled.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
        }
    }
}

/// Handles to everything the scheduler tasks share.
///
/// Constructed once at startup and cloned into the ingestion, dispatch and
/// status tasks. Cloning only clones the [Arc]s.
#[derive(Debug, Clone)]
pub struct SchedulerState {
    /// Runtime configuration
    pub config: Arc<SchedulerConfig>,
    /// Elevator registry
    pub registry: Arc<Registry>,
    /// Pending ride requests
    pub queue: Arc<RequestQueue>,
    /// Dispatch counters
    pub stats: Arc<DispatchStats>,
    shutdown: Arc<AtomicBool>,
}

impl SchedulerState {
    /// Creates a registry with `config.elevator_count` elevators and an empty queue.
    pub fn new(config: SchedulerConfig) -> Self {
        let registry = Registry::new(config.elevator_count);
        Self::with_registry(config, registry)
    }

    /// Same as [SchedulerState::new] but with a prepared registry.
    pub fn with_registry(config: SchedulerConfig, registry: Registry) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            queue: Arc::new(RequestQueue::new()),
            stats: Arc::new(DispatchStats::default()),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Raises the stop flag and wakes the dispatch task if it is waiting on the queue.
    /// The ingestion loop notices the flag after its current receive timeout.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.queue.wake();
    }

    /// True once [SchedulerState::request_shutdown] has been called.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

/// Prints the status table every `config.status_interval` until shutdown.
pub async fn run_status_display(state: SchedulerState) {
    let interval = state.config.status_interval();
    while !state.is_shutting_down() {
        tokio::time::sleep(interval).await;
        let records = state.registry.snapshot().await;
        let queue_len = state.queue.len().await;
        print::status(
            &records,
            queue_len,
            &state.stats.snapshot(),
            state.config.max_capacity,
            state.config.move_ack_warn(),
            Instant::now(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_display() {
        let req = Request::new(2, Direction::Up, 7);
        assert_eq!(req.to_string(), "2 -> 7 (UP)");
    }

    #[test]
    fn test_stats_counts() {
        let stats = DispatchStats::default();
        stats.record_dispatch();
        stats.record_dispatch();
        stats.record_retry();
        let snap = stats.snapshot();
        assert_eq!(snap.move_count, 2);
        assert_eq!(snap.requests_handled, 2);
        assert_eq!(snap.retries, 1);
    }

    #[tokio::test]
    async fn test_shutdown_flag() {
        let state = SchedulerState::new(SchedulerConfig::default());
        assert!(!state.is_shutting_down());
        state.request_shutdown();
        assert!(state.is_shutting_down());
    }
}
