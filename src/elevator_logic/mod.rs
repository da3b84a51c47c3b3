//! # Simulated elevator
//!
//! Listens for `MOVE` commands on `elevator_base_port + id`, runs each move through
//! [fsm::SimElevator] and reports `STATUS`, `WARNING` and `FAULT` back to the scheduler.
//!
//! A faulted elevator stops for good, like a real car stuck between floors.

pub mod fsm;
pub mod timer;

use std::sync::Arc;

use anyhow::Context;
use tokio::net::UdpSocket;
use tokio::time::sleep;

use crate::config::{self, ElevatorSimConfig};
use crate::network::message::Message;
use crate::network::udp_net::{self, UdpSchedulerLink};
use crate::network::SchedulerLink;
use crate::print;

use fsm::{MoveResult, SimElevator};

/// Picks the target floor out of a received line, if the line is a MOVE for elevator `id`.
///
/// Commands for other elevators and anything that is not a valid MOVE are logged and ignored.
pub fn handle_command(id: u8, line: &str) -> Option<u8> {
    match Message::parse(line) {
        Ok(Message::Move { id: cmd_id, target_floor }) if cmd_id == id => Some(target_floor),
        Ok(Message::Move { id: cmd_id, .. }) => {
            print::warn(format!("Elevator {}: ignoring command meant for elevator {}", id, cmd_id));
            None
        }
        Ok(other) => {
            print::warn(format!("Elevator {}: not a command: {}", id, other));
            None
        }
        Err(e) => {
            print::err(format!("Elevator {}: invalid command format {:?}: {:#}", id, line.trim(), e));
            None
        }
    }
}

/// Receives commands on `socket` and executes them one at a time until the elevator faults.
pub async fn run_elevator<L: SchedulerLink>(
    cfg: ElevatorSimConfig,
    socket: Arc<UdpSocket>,
    link: L,
) -> anyhow::Result<()> {
    let mut elevator = SimElevator::new(cfg);
    let mut buf = [0u8; config::UDP_BUFFER];
    print::elevator(
        elevator.id(),
        format!("Listening for commands on {}", socket.local_addr().context("Socket has no address")?),
    );

    loop {
        let (len, _) = match socket.recv_from(&mut buf).await {
            Ok(res) => res,
            Err(e) => {
                print::err(format!("Elevator {}: receive failed: {}", elevator.id(), e));
                continue;
            }
        };
        let line = String::from_utf8_lossy(&buf[..len]).into_owned();
        let Some(target) = handle_command(elevator.id(), &line) else {
            continue;
        };

        print::elevator(elevator.id(), format!("Received command: MOVE to {}", target));
        match elevator.execute_move(target, &link).await {
            MoveResult::Arrived(_) => sleep(elevator.config().idle_pause).await,
            MoveResult::Faulted => {
                print::err(format!("Elevator {} is out of service", elevator.id()));
                return Ok(());
            }
        }
    }
}

/// Binds the elevator's command port and runs it against the configured scheduler.
pub async fn start_elevator(cfg: ElevatorSimConfig) -> anyhow::Result<()> {
    let port = cfg
        .elevator_base_port
        .checked_add(u16::from(cfg.id))
        .with_context(|| format!("No port for elevator {}", cfg.id))?;
    let socket = Arc::new(udp_net::bind_udp(port)?);
    let host = udp_net::parse_host(&cfg.host)?;
    let link = UdpSchedulerLink::new(socket.clone(), (host, cfg.scheduler_port).into());
    run_elevator(cfg, socket, link).await
}
