//! Command Emitter and Retry/Backoff Loop.
//!
//! [run_dispatcher] is the only consumer of the request queue. It must run as exactly
//! one task: selection and the optimistic `load + 1` are separate critical sections, so
//! a second consumer could hand the same free slot to two requests.

use std::time::Instant;

use crate::network::message::Message;
use crate::network::ElevatorLink;
use crate::print;
use crate::registry::Registry;

use super::task_allocator::select_elevator;
use super::{Request, SchedulerState};

/// Result of handling one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// MOVE sent to this elevator
    Dispatched(u8),
    /// No eligible elevator, or the send failed. The request went back to the tail.
    Requeued,
}

/// Sends `MOVE id target_floor` to elevator `id` and, once sent, marks it
/// `Moving` with unknown floor and one more load.
///
/// Nothing waits for an acknowledgement; the next STATUS from the elevator reconciles
/// the record. If the send fails the registry is left untouched.
pub async fn dispatch<L: ElevatorLink>(
    registry: &Registry,
    link: &L,
    id: u8,
    target_floor: u8,
) -> anyhow::Result<()> {
    let command = Message::Move { id, target_floor };
    link.send_to_elevator(id, command.to_string()).await?;
    registry.mark_dispatched(id, Instant::now()).await;
    print::scheduler(format!("Sent command to elevator {}: MOVE to {}", id, target_floor));
    Ok(())
}

/// Handles one dequeued request: select, dispatch, or back off and requeue.
///
/// The backoff sleep only suspends the dispatch task. The request is never dropped.
pub async fn process_request<L: ElevatorLink>(
    state: &SchedulerState,
    link: &L,
    request: Request,
) -> DispatchOutcome {
    let snapshot = state.registry.snapshot().await;
    if let Some(id) = select_elevator(&snapshot, &request, state.config.max_capacity) {
        match dispatch(&state.registry, link, id, request.target_floor).await {
            Ok(()) => {
                state.stats.record_dispatch();
                return DispatchOutcome::Dispatched(id);
            }
            Err(e) => {
                print::err(format!("Failed to send MOVE to elevator {}: {:#}", id, e));
            }
        }
    } else {
        print::warn(format!("No elevator available for {}, requeuing request", request));
    }

    tokio::time::sleep(state.config.retry_backoff()).await;
    state.stats.record_retry();
    state.queue.requeue(request).await;
    DispatchOutcome::Requeued
}

/// Drains the request queue until shutdown.
pub async fn run_dispatcher<L: ElevatorLink>(state: SchedulerState, link: &L) {
    print::info("Dispatcher started".to_string());
    while let Some(request) = state.queue.dequeue_blocking(&state).await {
        process_request(&state, link, request).await;
    }
    print::info("Dispatcher stopped".to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::manager::Direction;
    use crate::registry::ElevatorStatus;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(u8, String)>>,
        fail: bool,
    }

    impl ElevatorLink for Recorder {
        async fn send_to_elevator(&self, elevator_id: u8, line: String) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("link down");
            }
            self.sent.lock().unwrap().push((elevator_id, line));
            Ok(())
        }
    }

    fn fast_config() -> SchedulerConfig {
        SchedulerConfig { elevator_count: 2, retry_backoff_ms: 5, ..SchedulerConfig::default() }
    }

    #[tokio::test]
    async fn test_dispatch_sends_move_and_marks_moving() {
        let state = SchedulerState::new(fast_config());
        let link = Recorder::default();

        dispatch(&state.registry, &link, 2, 6).await.unwrap();

        assert_eq!(link.sent.lock().unwrap().as_slice(), &[(2, "MOVE 2 6".to_string())]);
        let record = state.registry.get(2).await.unwrap();
        assert_eq!(record.status, ElevatorStatus::Moving);
        assert_eq!(record.floor, None);
        assert_eq!(record.load, 1);
    }

    #[tokio::test]
    async fn test_process_counts_dispatches() {
        let state = SchedulerState::new(fast_config());
        let link = Recorder::default();

        let outcome = process_request(&state, &link, Request::new(0, Direction::Up, 3)).await;
        assert_eq!(outcome, DispatchOutcome::Dispatched(1));
        let stats = state.stats.snapshot();
        assert_eq!(stats.move_count, 1);
        assert_eq!(stats.requests_handled, 1);
    }

    #[tokio::test]
    async fn test_no_eligible_elevator_requeues() {
        let state = SchedulerState::new(fast_config());
        state.registry.apply_fault(1).await;
        state.registry.apply_fault(2).await;
        let link = Recorder::default();

        let req = Request::new(1, Direction::Up, 4);
        let outcome = process_request(&state, &link, req.clone()).await;

        assert_eq!(outcome, DispatchOutcome::Requeued);
        assert!(link.sent.lock().unwrap().is_empty());
        assert_eq!(state.queue.try_dequeue().await, Some(req));
        assert_eq!(state.stats.snapshot().retries, 1);
    }

    #[tokio::test]
    async fn test_failed_send_leaves_registry_and_requeues() {
        let state = SchedulerState::new(fast_config());
        let link = Recorder { fail: true, ..Recorder::default() };

        let req = Request::new(1, Direction::Up, 4);
        let outcome = process_request(&state, &link, req.clone()).await;

        assert_eq!(outcome, DispatchOutcome::Requeued);
        let record = state.registry.get(1).await.unwrap();
        assert_eq!(record.status, ElevatorStatus::Operational);
        assert_eq!(record.load, 0);
        assert_eq!(state.queue.try_dequeue().await, Some(req));
    }
}
