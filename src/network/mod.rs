//! ## Network module
//!
//! Everything that crosses a process boundary: the wire format, the routing of inbound
//! messages and the UDP plumbing.
//!
//! ## Sub-modules
//! - [message]: parse and format the line protocol.
//! - [router]: classify inbound lines and update the registry or the request queue.
//! - [udp_net]: sockets, the scheduler's ingestion loop and the UDP link implementations.
//!
//! ## Send capabilities
//! The core never talks to a socket directly. The scheduler sends through an
//! [ElevatorLink], elevators and clients send through a [SchedulerLink]. Production uses
//! the UDP implementations in [udp_net], tests plug in in-memory recorders.

pub mod message;
pub mod router;
pub mod udp_net;

use std::future::Future;

/// Capability to send one line to the elevator with a given ID.
pub trait ElevatorLink: Send + Sync + 'static {
    /// Sends `line` to elevator `elevator_id`. Fire and forget, no acknowledgement.
    fn send_to_elevator(
        &self,
        elevator_id: u8,
        line: String,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Capability to send one line to the scheduler.
pub trait SchedulerLink: Send + Sync + 'static {
    /// Sends `line` to the scheduler. Fire and forget, no acknowledgement.
    fn send_to_scheduler(&self, line: String) -> impl Future<Output = anyhow::Result<()>> + Send;
}
