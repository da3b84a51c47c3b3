//! Message Router.
//!
//! Classifies each inbound line by its first token and applies it: telemetry goes to the
//! [crate::registry::Registry], ride requests go to the request queue. A line that fails
//! to parse is dropped with a warning and never stops the ingestion loop.

use std::time::Instant;

use crate::manager::SchedulerState;
use crate::print;

use super::message::Message;

/// What the router did with a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A STATUS, FAULT or WARNING updated the record of this elevator
    Telemetry(u8),
    /// A ride request was put in the queue
    Enqueued,
    /// The line was malformed, out of range, for an unknown elevator, or not meant for the scheduler
    Dropped,
}

/// Routes one inbound line, using `now` as the arrival time.
pub async fn route_line(state: &SchedulerState, line: &str, now: Instant) -> RouteOutcome {
    match Message::parse(line) {
        Ok(msg) => route_message(state, msg, now).await,
        Err(e) => {
            print::warn(format!("Dropped malformed message {:?}: {:#}", line.trim(), e));
            RouteOutcome::Dropped
        }
    }
}

/// Routes an already parsed message.
pub async fn route_message(state: &SchedulerState, msg: Message, now: Instant) -> RouteOutcome {
    let registry = &state.registry;
    match msg {
        Message::Status { id, floor } => {
            if floor >= state.config.floor_count {
                print::warn(format!(
                    "Dropped STATUS from elevator {}: floor {} is outside 0..{}",
                    id, floor, state.config.floor_count
                ));
                return RouteOutcome::Dropped;
            }
            match registry.apply_status(id, floor, now, state.config.warning_freshness()).await {
                Some(record) => {
                    print::scheduler(format!(
                        "Elevator {} reached floor {} (load {}, {:?})",
                        id, floor, record.load, record.status
                    ));
                    RouteOutcome::Telemetry(id)
                }
                None => unknown_elevator(id, "STATUS"),
            }
        }
        Message::Fault { id } => {
            if registry.apply_fault(id).await {
                print::err(format!("Elevator {} reported FAULT, it will not be used again", id));
                RouteOutcome::Telemetry(id)
            } else {
                unknown_elevator(id, "FAULT")
            }
        }
        Message::Warning { id, reason } => {
            print::warn(format!("Elevator {} reported WARNING {}", id, reason));
            if registry.apply_warning(id, reason, now).await {
                RouteOutcome::Telemetry(id)
            } else {
                unknown_elevator(id, "WARNING")
            }
        }
        Message::Request(request) => {
            let floor_count = state.config.floor_count;
            if request.origin_floor >= floor_count || request.target_floor >= floor_count {
                print::warn(format!(
                    "Dropped request {}: building only has floors 0..{}",
                    request, floor_count
                ));
                return RouteOutcome::Dropped;
            }
            print::scheduler(format!("Queued request {}", request));
            state.queue.enqueue(request).await;
            RouteOutcome::Enqueued
        }
        Message::Move { id, .. } => {
            print::warn(format!("Ignoring MOVE for elevator {}, the scheduler does not take commands", id));
            RouteOutcome::Dropped
        }
    }
}

fn unknown_elevator(id: u8, kind: &str) -> RouteOutcome {
    print::warn(format!("Ignoring {} from unknown elevator {}", kind, id));
    RouteOutcome::Dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::manager::{Direction, Request};
    use crate::registry::ElevatorStatus;

    fn state() -> SchedulerState {
        SchedulerState::new(SchedulerConfig { elevator_count: 2, floor_count: 10, ..SchedulerConfig::default() })
    }

    #[tokio::test]
    async fn test_request_is_enqueued() {
        let state = state();
        let outcome = route_line(&state, "2 UP 8", Instant::now()).await;
        assert_eq!(outcome, RouteOutcome::Enqueued);
        assert_eq!(state.queue.try_dequeue().await, Some(Request::new(2, Direction::Up, 8)));
    }

    #[tokio::test]
    async fn test_malformed_is_dropped_and_not_enqueued() {
        let state = state();
        for line in ["garbage", "STATUS 1", "5 UP 5", "1 UP 12"] {
            assert_eq!(route_line(&state, line, Instant::now()).await, RouteOutcome::Dropped);
        }
        assert!(state.queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_fault_and_warning_update_registry() {
        let state = state();
        let now = Instant::now();
        assert_eq!(route_line(&state, "FAULT 1", now).await, RouteOutcome::Telemetry(1));
        assert_eq!(route_line(&state, "WARNING 2 DOOR_STUCK", now).await, RouteOutcome::Telemetry(2));

        let snapshot = state.registry.snapshot().await;
        assert_eq!(snapshot[&1].status, ElevatorStatus::Faulted);
        assert_eq!(snapshot[&2].status, ElevatorStatus::Warning("DOOR_STUCK".into()));
        assert_eq!(snapshot[&2].last_warning_at, Some(now));
    }

    #[tokio::test]
    async fn test_telemetry_for_unknown_elevator_is_dropped() {
        let state = state();
        assert_eq!(route_line(&state, "STATUS 7 3", Instant::now()).await, RouteOutcome::Dropped);
        assert_eq!(state.registry.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_status_outside_building_is_dropped() {
        let state = state();
        state.registry.mark_dispatched(1, Instant::now()).await;

        assert_eq!(route_line(&state, "STATUS 1 10", Instant::now()).await, RouteOutcome::Dropped);
        let record = state.registry.get(1).await.unwrap();
        assert_eq!(record.status, ElevatorStatus::Moving);
        assert_eq!(record.load, 1);

        assert_eq!(route_line(&state, "STATUS 1 9", Instant::now()).await, RouteOutcome::Telemetry(1));
    }

    #[tokio::test]
    async fn test_move_is_not_routed() {
        let state = state();
        assert_eq!(route_line(&state, "MOVE 1 3", Instant::now()).await, RouteOutcome::Dropped);
    }
}
