//! Simple stopwatch-style timeout used to detect a move that takes too long.

use tokio::time::{Duration, Instant};

/// A timer that reports when it has been running longer than its timeout.
#[derive(Debug, Clone)]
pub struct Timer {
    timer_active: bool,
    timeout_duration: Duration,
    start_time: Instant,
}

impl Timer {
    /// Creates a stopped timer
    pub fn new(timeout_duration: Duration) -> Timer {
        Timer {
            timer_active: false,
            timeout_duration,
            start_time: Instant::now(),
        }
    }

    /// (Re)starts the timer from now
    pub fn start(&mut self) {
        self.timer_active = true;
        self.start_time = Instant::now();
    }

    /// Stops the timer, it will not time out until started again
    pub fn stop(&mut self) {
        self.timer_active = false;
    }

    /// Time since the last start
    pub fn elapsed(&self) -> Duration {
        Instant::now() - self.start_time
    }

    /// True if the timer is running and the timeout has passed
    pub fn timed_out(&self) -> bool {
        self.timer_active && self.elapsed() > self.timeout_duration
    }
}
