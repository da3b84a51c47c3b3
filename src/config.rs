//! # config.rs – Centralized Parameter Store
//!
//! This module holds all static program parameters used throughout the system,
//! together with the runtime configuration structs handed to the scheduler and the
//! simulated elevators. Keeping configuration in one place makes tuning, experimentation,
//! and testing easier.
//!
//! ## Load order for [SchedulerConfig]
//! 1. Defaults from the constants below.
//! 2. An optional JSON file (`config::<path>` argument), see [SchedulerConfig::load_from_file].
//! 3. Single `key::value` arguments, see [crate::init::parse_args].

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

//
// ──────────────────────────────────────────────────────────────
//   1. NETWORK SETTINGS
// ──────────────────────────────────────────────────────────────
//

/// Well-known port the scheduler listens on
pub const SCHEDULER_PORT: u16 = 5002;

/// Each elevator listens on `ELEVATOR_BASE_PORT + id`
pub const ELEVATOR_BASE_PORT: u16 = 5100;

/// Host all roles talk to in the reference deployment
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Size of UDP receive buffer in bytes. Every message is one short line.
pub const UDP_BUFFER: usize = 1024;

//
// ──────────────────────────────────────────────────────────────
//   2. SYSTEM & ELEVATOR PARAMETERS
// ──────────────────────────────────────────────────────────────
//

/// Default number of elevators handled by the scheduler
pub const DEFAULT_ELEVATOR_COUNT: u8 = 3;

/// Default number of floors
pub const DEFAULT_FLOOR_COUNT: u8 = 10;

/// Maximum number of assigned, not yet completed requests per elevator
pub const MAX_CAPACITY: u8 = 4;

/// Number of attempts the simulated door gets before it is reported stuck
pub const DOOR_RETRY_LIMIT: u8 = 3;

/// Reason sent with the WARNING message when the door was stuck
pub const DOOR_STUCK_REASON: &str = "DOOR_STUCK";

//
// ──────────────────────────────────────────────────────────────
//   3. TIMING & TIMEOUTS & INTERVALS
// ──────────────────────────────────────────────────────────────
//

/// Delay before a request without any eligible elevator is requeued (ms)
pub const RETRY_BACKOFF_MS: u64 = 500;

/// A warning younger than this suppresses the auto-clear on STATUS (s)
pub const WARNING_FRESHNESS_SECS: u64 = 5;

/// How often the status table is printed (s)
pub const STATUS_INTERVAL_SECS: u64 = 10;

/// A `Moving` elevator without STATUS for this long is flagged in the status print (s)
pub const MOVE_ACK_WARN_SECS: u64 = 30;

/// Receive timeout for the ingestion loop, bounds how long a shutdown takes to be noticed
pub const POLL_PERIOD: Duration = Duration::from_millis(100);

/// Simulated travel time between two neighbouring floors
pub const FLOOR_TRAVEL: Duration = Duration::from_secs(1);

/// Simulated time for one door open/close cycle
pub const DOOR_CYCLE: Duration = Duration::from_secs(1);

/// A simulated move taking longer than this is reported as a FAULT
pub const MOVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between finishing a move and accepting the next command
pub const ELEVATOR_IDLE_PAUSE: Duration = Duration::from_secs(2);

//
// ──────────────────────────────────────────────────────────────
//   4. LOGGING CONFIGURATION
// ──────────────────────────────────────────────────────────────
//

/// Enable/disable the periodic status table
pub static PRINT_STATUS_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of errors
pub static PRINT_ERR_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of warnings
pub static PRINT_WARN_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of success messages
pub static PRINT_OK_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of general info
pub static PRINT_INFO_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable role-tagged prints (scheduler, elevator, client)
pub static PRINT_ELSE_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Sets a print toggle. A poisoned toggle is recovered, since it only guards a bool.
pub fn set_print_flag(flag: &Mutex<bool>, on: bool) {
    match flag.lock() {
        Ok(mut guard) => *guard = on,
        Err(poisoned) => *poisoned.into_inner() = on,
    }
}

/// Reads a print toggle.
pub fn print_flag(flag: &Mutex<bool>) -> bool {
    match flag.lock() {
        Ok(guard) => *guard,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

//
// ──────────────────────────────────────────────────────────────
//   5. RUNTIME CONFIGURATION
// ──────────────────────────────────────────────────────────────
//

/// Runtime configuration of the scheduler role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of elevators, IDs are `1..=elevator_count`
    pub elevator_count: u8,

    /// Number of floors, valid floors are `0..floor_count`
    pub floor_count: u8,

    /// Elevators with `load >= max_capacity` are never selected
    pub max_capacity: u8,

    /// Delay before an unassignable request is requeued
    pub retry_backoff_ms: u64,

    /// Warning freshness window
    pub warning_freshness_secs: u64,

    /// Interval between status prints
    pub status_interval_secs: u64,

    /// Threshold for flagging unacknowledged moves in the status print
    pub move_ack_warn_secs: u64,

    /// Port the scheduler binds
    pub scheduler_port: u16,

    /// Elevator `id` is reached on `elevator_base_port + id`
    pub elevator_base_port: u16,

    /// Host of the scheduler and the elevators
    pub host: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            elevator_count: DEFAULT_ELEVATOR_COUNT,
            floor_count: DEFAULT_FLOOR_COUNT,
            max_capacity: MAX_CAPACITY,
            retry_backoff_ms: RETRY_BACKOFF_MS,
            warning_freshness_secs: WARNING_FRESHNESS_SECS,
            status_interval_secs: STATUS_INTERVAL_SECS,
            move_ack_warn_secs: MOVE_ACK_WARN_SECS,
            scheduler_port: SCHEDULER_PORT,
            elevator_base_port: ELEVATOR_BASE_PORT,
            host: DEFAULT_HOST.to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Reads a JSON config file. Missing fields keep their defaults.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg: SchedulerConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects configurations the scheduler cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.elevator_count == 0 {
            anyhow::bail!("elevator_count must be at least 1");
        }
        if self.floor_count < 2 {
            anyhow::bail!("floor_count must be at least 2");
        }
        if self.max_capacity == 0 {
            anyhow::bail!("max_capacity must be at least 1");
        }
        if self.status_interval_secs == 0 {
            anyhow::bail!("status_interval_secs must be at least 1");
        }
        if u16::from(self.elevator_count)
            .checked_add(self.elevator_base_port)
            .is_none()
        {
            anyhow::bail!("elevator_base_port + elevator_count overflows the port range");
        }
        Ok(())
    }

    /// Backoff as a [Duration]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Warning freshness window as a [Duration]
    pub fn warning_freshness(&self) -> Duration {
        Duration::from_secs(self.warning_freshness_secs)
    }

    /// Status print interval as a [Duration]
    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs)
    }

    /// Unacknowledged move threshold as a [Duration]
    pub fn move_ack_warn(&self) -> Duration {
        Duration::from_secs(self.move_ack_warn_secs)
    }
}

/// Runtime configuration of one simulated elevator.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevatorSimConfig {
    /// ID of the elevator, must match the ID in received MOVE commands
    pub id: u8,

    /// Time spent per floor travelled
    pub floor_travel: Duration,

    /// Time of one door cycle
    pub door_cycle: Duration,

    /// Number of door attempts before the door is considered stuck
    pub door_retry_limit: u8,

    /// How many of the door attempts fail, used to simulate a stuck door
    pub stuck_door_attempts: u8,

    /// Moves taking longer than this end in a FAULT
    pub move_timeout: Duration,

    /// Pause after a finished move
    pub idle_pause: Duration,

    /// Port the scheduler listens on
    pub scheduler_port: u16,

    /// Elevator listens on `elevator_base_port + id`
    pub elevator_base_port: u16,

    /// Host of the scheduler
    pub host: String,
}

impl ElevatorSimConfig {
    /// Creates the config for elevator `id` with the default timing.
    pub fn new(id: u8) -> Self {
        Self {
            id,
            floor_travel: FLOOR_TRAVEL,
            door_cycle: DOOR_CYCLE,
            door_retry_limit: DOOR_RETRY_LIMIT,
            stuck_door_attempts: 0,
            move_timeout: MOVE_TIMEOUT,
            idle_pause: ELEVATOR_IDLE_PAUSE,
            scheduler_port: SCHEDULER_PORT,
            elevator_base_port: ELEVATOR_BASE_PORT,
            host: DEFAULT_HOST.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_matches_constants() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.max_capacity, 4);
        assert_eq!(cfg.retry_backoff(), Duration::from_millis(500));
        assert_eq!(cfg.warning_freshness(), Duration::from_secs(5));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "elevator_count": 5, "max_capacity": 2 }}"#).unwrap();

        let cfg = SchedulerConfig::load_from_file(file.path()).unwrap();
        assert_eq!(cfg.elevator_count, 5);
        assert_eq!(cfg.max_capacity, 2);
        assert_eq!(cfg.floor_count, DEFAULT_FLOOR_COUNT);
        assert_eq!(cfg.scheduler_port, SCHEDULER_PORT);
    }

    #[test]
    fn test_validate_rejects_zero_elevators() {
        let cfg = SchedulerConfig { elevator_count: 0, ..SchedulerConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_print_flag_roundtrip() {
        let flag = Mutex::new(true);
        set_print_flag(&flag, false);
        assert!(!print_flag(&flag));
    }
}
