//! FIFO queue of ride requests waiting for an elevator.
//!
//! Unbounded. [RequestQueue::dequeue_blocking] parks the caller on a [Notify] until an
//! item is available, there is no polling. Requeued requests go to the tail.

use std::collections::VecDeque;

use tokio::sync::{Mutex, Notify};

use super::Request;
use super::SchedulerState;

/// Pending ride requests, shared between the ingestion task and the dispatch task.
#[derive(Debug, Default)]
pub struct RequestQueue {
    inner: Mutex<VecDeque<Request>>,
    notify: Notify,
}

impl RequestQueue {
    /// Creates an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new request and wakes the consumer.
    pub async fn enqueue(&self, request: Request) {
        self.inner.lock().await.push_back(request);
        self.notify.notify_one();
    }

    /// Puts a request that could not be assigned back at the tail.
    pub async fn requeue(&self, request: Request) {
        self.enqueue(request).await;
    }

    /// Removes the head without waiting.
    pub async fn try_dequeue(&self) -> Option<Request> {
        self.inner.lock().await.pop_front()
    }

    /// Waits until a request is available and removes it.
    ///
    /// Returns `None` once `state` is shutting down. Built for exactly one consumer: the
    /// wake-up permit of [Notify::notify_one] is consumed by that one waiter.
    pub async fn dequeue_blocking(&self, state: &SchedulerState) -> Option<Request> {
        loop {
            if state.is_shutting_down() {
                return None;
            }
            if let Some(request) = self.try_dequeue().await {
                return Some(request);
            }
            self.notify.notified().await;
        }
    }

    /// Wakes the consumer without adding anything, used on shutdown.
    pub fn wake(&self) {
        self.notify.notify_one();
    }

    /// Number of waiting requests
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// True if nothing is waiting
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}
