//! Chooses which elevator gets a ride request.
//!
//! Greedy nearest-eligible heuristic over a registry snapshot. An elevator is eligible
//! when it is `Operational` and its load is below capacity. Direction of travel,
//! destination and request age are not considered.
//!
//! The functions here take a snapshot and no locks, so the result is a pure function of
//! `(snapshot, request, capacity)`.

use std::collections::BTreeMap;

use crate::registry::{ElevatorRecord, ElevatorStatus};

use super::Request;

/// True if `elevator` may be given a new request.
pub fn is_eligible(elevator: &ElevatorRecord, max_capacity: u8) -> bool {
    elevator.status == ElevatorStatus::Operational && elevator.load < max_capacity
}

/// Cost of giving `request` to `elevator`, `None` if it is not eligible.
///
/// The cost is the distance in floors between the elevator and the request's origin.
fn compute_cost(elevator: &ElevatorRecord, request: &Request, max_capacity: u8) -> Option<u32> {
    if !is_eligible(elevator, max_capacity) {
        return None;
    }
    // An operational elevator always has a known floor; skip it defensively if not.
    let floor = elevator.floor?;
    Some(u32::from(floor.abs_diff(request.origin_floor)))
}

/// Returns the ID of the eligible elevator closest to `request.origin_floor`.
///
/// Ties go to the lowest ID (the snapshot is iterated in ascending ID order and only a
/// strictly smaller distance replaces the current best). `None` if nothing is eligible.
pub fn select_elevator(
    elevators: &BTreeMap<u8, ElevatorRecord>,
    request: &Request,
    max_capacity: u8,
) -> Option<u8> {
    let mut best: Option<(u8, u32)> = None;
    for (id, elevator) in elevators {
        let Some(cost) = compute_cost(elevator, request, max_capacity) else {
            continue;
        };
        match best {
            Some((_, best_cost)) if best_cost <= cost => {}
            _ => best = Some((*id, cost)),
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::Direction;

    fn record(floor: u8, load: u8, status: ElevatorStatus) -> ElevatorRecord {
        ElevatorRecord { floor: Some(floor), load, status, ..ElevatorRecord::default() }
    }

    fn elevators(list: &[(u8, ElevatorRecord)]) -> BTreeMap<u8, ElevatorRecord> {
        list.iter().cloned().collect()
    }

    #[test]
    fn test_closest_elevator_wins() {
        let snapshot = elevators(&[
            (1, record(0, 0, ElevatorStatus::Operational)),
            (2, record(3, 0, ElevatorStatus::Operational)),
            (3, record(5, 0, ElevatorStatus::Operational)),
        ]);
        let req = Request::new(2, Direction::Up, 7);
        assert_eq!(select_elevator(&snapshot, &req, 4), Some(2));
    }

    #[test]
    fn test_tie_goes_to_lowest_id() {
        let snapshot = elevators(&[
            (1, record(0, 0, ElevatorStatus::Operational)),
            (2, record(4, 0, ElevatorStatus::Operational)),
            (3, record(2, 0, ElevatorStatus::Operational)),
        ]);
        let req = Request::new(3, Direction::Up, 8);
        assert_eq!(select_elevator(&snapshot, &req, 4), Some(2));
    }

    #[test]
    fn test_full_elevator_is_skipped() {
        let snapshot = elevators(&[
            (1, record(2, 4, ElevatorStatus::Operational)),
            (2, record(5, 1, ElevatorStatus::Operational)),
        ]);
        let req = Request::new(2, Direction::Up, 5);
        assert_eq!(select_elevator(&snapshot, &req, 4), Some(2));
    }

    #[test]
    fn test_non_operational_are_skipped() {
        let snapshot = elevators(&[
            (1, record(3, 0, ElevatorStatus::Faulted)),
            (2, record(3, 0, ElevatorStatus::Moving)),
            (3, record(3, 0, ElevatorStatus::Warning("DOOR_STUCK".into()))),
            (4, record(9, 0, ElevatorStatus::Operational)),
        ]);
        let req = Request::new(3, Direction::Down, 0);
        assert_eq!(select_elevator(&snapshot, &req, 4), Some(4));
    }

    #[test]
    fn test_none_when_nothing_eligible() {
        let snapshot = elevators(&[
            (1, record(1, 0, ElevatorStatus::Faulted)),
            (2, record(5, 4, ElevatorStatus::Operational)),
        ]);
        let req = Request::new(3, Direction::Up, 6);
        assert_eq!(select_elevator(&snapshot, &req, 4), None);
        assert_eq!(select_elevator(&BTreeMap::new(), &req, 4), None);
    }

    #[test]
    fn test_same_snapshot_same_answer() {
        let snapshot = elevators(&[
            (1, record(7, 2, ElevatorStatus::Operational)),
            (2, record(1, 0, ElevatorStatus::Operational)),
            (3, record(4, 3, ElevatorStatus::Operational)),
        ]);
        let req = Request::new(5, Direction::Down, 0);
        let first = select_elevator(&snapshot, &req, 4);
        for _ in 0..10 {
            assert_eq!(select_elevator(&snapshot, &req, 4), first);
        }
        assert_eq!(first, Some(3));
    }
}
