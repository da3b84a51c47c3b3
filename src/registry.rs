//! ## Elevator Registry
//!
//! In-memory table of every configured elevator and its last known state, shared between
//! the ingestion task (telemetry) and the dispatch task (selection and optimistic updates).
//!
//! All access goes through one [RwLock]. Every update rewrites a whole [ElevatorRecord]
//! inside a single write guard, so a reader never sees a half-updated record.
//!
//! ### Status transitions
//! - `Operational -> Moving` on dispatch, `Moving -> Operational` on the next STATUS.
//!   Dispatch leaves `Warning` and `Faulted` as they are.
//! - `Operational/Moving -> Warning` on WARNING. The next STATUS clears it only once the
//!   warning is older than the freshness window.
//! - `any -> Faulted` on FAULT. Terminal.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Operational status of an elevator. Exactly one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElevatorStatus {
    /// Idle and able to take requests
    Operational,
    /// A move has been dispatched and not yet acknowledged with STATUS
    Moving,
    /// Permanently stuck, never selected again
    Faulted,
    /// Transient issue reported by the elevator, e.g. a stuck door
    Warning(String),
}

/// The scheduler's view of one elevator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElevatorRecord {
    /// Last reported floor. `None` while a move is outstanding.
    pub floor: Option<u8>,

    /// Assigned requests not yet completed
    pub load: u8,

    /// See [ElevatorStatus]
    pub status: ElevatorStatus,

    /// When the last WARNING arrived
    pub last_warning_at: Option<Instant>,

    /// When the last MOVE was sent. Cleared on STATUS.
    pub dispatched_at: Option<Instant>,
}

impl Default for ElevatorRecord {
    fn default() -> Self {
        Self {
            floor: Some(0),
            load: 0,
            status: ElevatorStatus::Operational,
            last_warning_at: None,
            dispatched_at: None,
        }
    }
}

impl ElevatorRecord {
    /// True if `last_warning_at` lies within `freshness` of `now`.
    pub fn has_fresh_warning(&self, now: Instant, freshness: Duration) -> bool {
        match self.last_warning_at {
            Some(at) => now.saturating_duration_since(at) <= freshness,
            None => false,
        }
    }
}

/// Partial update of an [ElevatorRecord], applied as a whole under one write guard.
/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default)]
pub struct RecordUpdate {
    /// New floor (`Some(None)` marks the elevator in transit)
    pub floor: Option<Option<u8>>,
    /// New load
    pub load: Option<u8>,
    /// New status
    pub status: Option<ElevatorStatus>,
    /// New warning timestamp
    pub last_warning_at: Option<Option<Instant>>,
    /// New dispatch timestamp
    pub dispatched_at: Option<Option<Instant>>,
}

/// Shared table of elevator records, keyed by elevator ID.
#[derive(Debug, Default)]
pub struct Registry {
    records: RwLock<BTreeMap<u8, ElevatorRecord>>,
}

impl Registry {
    /// Creates records `1..=elevator_count`, all at floor 0, empty and operational.
    pub fn new(elevator_count: u8) -> Self {
        let records = (1..=elevator_count)
            .map(|id| (id, ElevatorRecord::default()))
            .collect();
        Self { records: RwLock::new(records) }
    }

    /// Builds a registry from explicit records. Mostly useful in tests.
    pub fn from_records(records: BTreeMap<u8, ElevatorRecord>) -> Self {
        Self { records: RwLock::new(records) }
    }

    /// Returns a copy of the record for `id`.
    pub async fn get(&self, id: u8) -> Option<ElevatorRecord> {
        self.records.read().await.get(&id).cloned()
    }

    /// Consistent copy of every record, in ascending ID order.
    pub async fn snapshot(&self) -> BTreeMap<u8, ElevatorRecord> {
        self.records.read().await.clone()
    }

    /// Applies `update` to the record of `id`, last writer wins per field.
    ///
    /// Returns false if `id` is unknown.
    pub async fn update(&self, id: u8, update: RecordUpdate) -> bool {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(&id) else {
            return false;
        };
        if let Some(floor) = update.floor {
            record.floor = floor;
        }
        if let Some(load) = update.load {
            record.load = load;
        }
        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(at) = update.last_warning_at {
            record.last_warning_at = at;
        }
        if let Some(at) = update.dispatched_at {
            record.dispatched_at = at;
        }
        true
    }

    /// Handles `STATUS id floor`.
    ///
    /// Sets the floor, decrements load (floored at 0) and clears the status to
    /// `Operational` unless a warning younger than `freshness` is present.
    /// A faulted elevator keeps `Faulted`.
    ///
    /// Returns the resulting record, or `None` if `id` is unknown.
    pub async fn apply_status(
        &self,
        id: u8,
        floor: u8,
        now: Instant,
        freshness: Duration,
    ) -> Option<ElevatorRecord> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id)?;
        record.floor = Some(floor);
        record.load = record.load.saturating_sub(1);
        record.dispatched_at = None;
        let keep_status = match record.status {
            ElevatorStatus::Faulted => true,
            ElevatorStatus::Warning(_) => record.has_fresh_warning(now, freshness),
            ElevatorStatus::Operational | ElevatorStatus::Moving => false,
        };
        if !keep_status {
            record.status = ElevatorStatus::Operational;
        }
        Some(record.clone())
    }

    /// Handles `FAULT id`. Returns false if `id` is unknown.
    pub async fn apply_fault(&self, id: u8) -> bool {
        self.update(
            id,
            RecordUpdate { status: Some(ElevatorStatus::Faulted), ..RecordUpdate::default() },
        )
        .await
    }

    /// Handles `WARNING id reason`. A faulted elevator stays faulted, only the
    /// timestamp is recorded. Returns false if `id` is unknown.
    pub async fn apply_warning(&self, id: u8, reason: String, now: Instant) -> bool {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(&id) else {
            return false;
        };
        record.last_warning_at = Some(now);
        if record.status != ElevatorStatus::Faulted {
            record.status = ElevatorStatus::Warning(reason);
        }
        true
    }

    /// Optimistic update after a MOVE has been sent: `Moving`, floor unknown, load + 1.
    ///
    /// A FAULT or WARNING that arrived while the MOVE was in flight wins over `Moving`.
    pub async fn mark_dispatched(&self, id: u8, now: Instant) -> bool {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(&id) else {
            return false;
        };
        if matches!(record.status, ElevatorStatus::Operational | ElevatorStatus::Moving) {
            record.status = ElevatorStatus::Moving;
        }
        record.floor = None;
        record.load = record.load.saturating_add(1);
        record.dispatched_at = Some(now);
        true
    }
}

/// Elevators that are `Moving` and have waited longer than `threshold` for STATUS,
/// with how long they have waited.
pub fn unacknowledged_moves(
    records: &BTreeMap<u8, ElevatorRecord>,
    now: Instant,
    threshold: Duration,
) -> Vec<(u8, Duration)> {
    records
        .iter()
        .filter(|(_, r)| r.status == ElevatorStatus::Moving)
        .filter_map(|(id, r)| {
            let waited = now.saturating_duration_since(r.dispatched_at?);
            (waited > threshold).then_some((*id, waited))
        })
        .collect()
}
