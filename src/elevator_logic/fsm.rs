//! Physical simulation of one move: door close with retries, floor-by-floor travel
//! with a timeout, door open and the report back to the scheduler.

use tokio::time::sleep;

use crate::config::{self, ElevatorSimConfig};
use crate::network::message::Message;
use crate::network::SchedulerLink;
use crate::print;

use super::timer::Timer;

/// How a move ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    /// Reached the floor and reported STATUS
    Arrived(u8),
    /// Travel timed out and FAULT was reported. The elevator is stuck for good.
    Faulted,
}

/// State of one simulated elevator.
#[derive(Debug, Clone)]
pub struct SimElevator {
    cfg: ElevatorSimConfig,
    current_floor: u8,
}

impl SimElevator {
    /// New elevator at floor 0
    pub fn new(cfg: ElevatorSimConfig) -> Self {
        Self { cfg, current_floor: 0 }
    }

    /// ID of the elevator
    pub fn id(&self) -> u8 {
        self.cfg.id
    }

    /// Floor the elevator is at
    pub fn current_floor(&self) -> u8 {
        self.current_floor
    }

    /// Config the elevator runs with
    pub fn config(&self) -> &ElevatorSimConfig {
        &self.cfg
    }

    /// Executes one MOVE to `target` and reports the result through `link`.
    pub async fn execute_move<L: SchedulerLink>(&mut self, target: u8, link: &L) -> MoveResult {
        self.close_door(link).await;

        let mut move_timer = Timer::new(self.cfg.move_timeout);
        move_timer.start();
        while self.current_floor != target {
            sleep(self.cfg.floor_travel).await;
            if target > self.current_floor {
                self.current_floor += 1;
                print::elevator(self.id(), format!("Moving up... Floor {}", self.current_floor));
            } else {
                self.current_floor -= 1;
                print::elevator(self.id(), format!("Moving down... Floor {}", self.current_floor));
            }
            if move_timer.timed_out() {
                print::err(format!(
                    "Elevator {}: movement timeout after {:?}, assuming elevator is stuck",
                    self.id(),
                    move_timer.elapsed()
                ));
                self.report(link, Message::Fault { id: self.id() }).await;
                return MoveResult::Faulted;
            }
        }
        move_timer.stop();

        print::elevator(self.id(), "Doors opening...".to_string());
        sleep(self.cfg.door_cycle).await;
        print::elevator(self.id(), format!("Arrived at floor {}", self.current_floor));
        self.report(link, Message::Status { id: self.id(), floor: self.current_floor }).await;
        MoveResult::Arrived(self.current_floor)
    }

    /// Closes the door. The first `stuck_door_attempts` attempts fail. A door that needed
    /// every retry is reported as a WARNING, then closes.
    async fn close_door<L: SchedulerLink>(&self, link: &L) {
        print::elevator(self.id(), "Doors closing...".to_string());
        let mut attempts = 0;
        while attempts < self.cfg.door_retry_limit && attempts < self.cfg.stuck_door_attempts {
            sleep(self.cfg.door_cycle).await;
            print::warn(format!("Elevator {}: door failed to close, retrying...", self.id()));
            attempts += 1;
        }
        if self.cfg.door_retry_limit > 0 && attempts == self.cfg.door_retry_limit {
            print::warn(format!("Elevator {}: door was stuck but finally closed", self.id()));
            self.report(
                link,
                Message::Warning { id: self.id(), reason: config::DOOR_STUCK_REASON.to_string() },
            )
            .await;
        }
    }

    async fn report<L: SchedulerLink>(&self, link: &L, msg: Message) {
        let line = msg.to_string();
        match link.send_to_scheduler(line.clone()).await {
            Ok(()) => print::elevator(self.id(), format!("Sent {}", line)),
            Err(e) => print::err(format!("Elevator {}: failed to send {}: {:#}", self.id(), line, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<String>>,
    }

    impl SchedulerLink for Recorder {
        async fn send_to_scheduler(&self, line: String) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(line);
            Ok(())
        }
    }

    fn fast(id: u8) -> ElevatorSimConfig {
        ElevatorSimConfig {
            floor_travel: Duration::from_millis(2),
            door_cycle: Duration::from_millis(1),
            move_timeout: Duration::from_secs(5),
            idle_pause: Duration::from_millis(1),
            ..ElevatorSimConfig::new(id)
        }
    }

    #[tokio::test]
    async fn test_move_reports_status_on_arrival() {
        let link = Recorder::default();
        let mut elevator = SimElevator::new(fast(2));

        assert_eq!(elevator.execute_move(3, &link).await, MoveResult::Arrived(3));
        assert_eq!(elevator.current_floor(), 3);
        assert_eq!(elevator.execute_move(1, &link).await, MoveResult::Arrived(1));
        assert_eq!(link.sent.lock().unwrap().as_slice(), &["STATUS 2 3", "STATUS 2 1"]);
    }

    #[tokio::test]
    async fn test_stuck_door_sends_warning_before_status() {
        let link = Recorder::default();
        let cfg = ElevatorSimConfig { stuck_door_attempts: 5, ..fast(1) };
        let mut elevator = SimElevator::new(cfg);

        elevator.execute_move(2, &link).await;
        assert_eq!(link.sent.lock().unwrap().as_slice(), &["WARNING 1 DOOR_STUCK", "STATUS 1 2"]);
    }

    #[tokio::test]
    async fn test_door_recovering_before_limit_sends_no_warning() {
        let link = Recorder::default();
        let cfg = ElevatorSimConfig { stuck_door_attempts: 1, ..fast(1) };
        let mut elevator = SimElevator::new(cfg);

        elevator.execute_move(1, &link).await;
        assert_eq!(link.sent.lock().unwrap().as_slice(), &["STATUS 1 1"]);
    }

    #[tokio::test]
    async fn test_slow_travel_ends_in_fault() {
        let link = Recorder::default();
        let cfg = ElevatorSimConfig {
            floor_travel: Duration::from_millis(20),
            move_timeout: Duration::from_millis(30),
            ..fast(4)
        };
        let mut elevator = SimElevator::new(cfg);

        assert_eq!(elevator.execute_move(5, &link).await, MoveResult::Faulted);
        assert_eq!(link.sent.lock().unwrap().as_slice(), &["FAULT 4"]);
        assert!(elevator.current_floor() < 5);
    }
}
