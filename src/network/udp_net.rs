//! ## UDP plumbing
//!
//! Socket setup for all three roles, the scheduler's ingestion loop and the UDP
//! implementations of [ElevatorLink] and [SchedulerLink].
//!
//! Every datagram carries exactly one line of the protocol in [super::message].

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::time::timeout;

use crate::config;
use crate::manager::SchedulerState;
use crate::print;

use super::router;
use super::{ElevatorLink, SchedulerLink};

/// Parses the configured host into an address.
pub fn parse_host(host: &str) -> anyhow::Result<IpAddr> {
    if host.eq_ignore_ascii_case("localhost") {
        return Ok(IpAddr::from([127, 0, 0, 1]));
    }
    host.parse::<IpAddr>()
        .with_context(|| format!("Invalid host address {:?}", host))
}

/// Creates a non-blocking, address-reusing UDP socket bound to `0.0.0.0:port` and hands
/// it to tokio. `port == 0` binds an ephemeral port.
///
/// Must be called from inside a tokio runtime.
pub fn bind_udp(port: u16) -> anyhow::Result<UdpSocket> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .context("Failed to create UDP socket")?;
    socket.set_reuse_address(true).context("Failed to set reuse address")?;
    socket.set_nonblocking(true).context("Failed to set non-blocking")?;
    socket
        .bind(&addr.into())
        .with_context(|| format!("Failed to bind UDP socket on port {}", port))?;
    UdpSocket::from_std(socket.into()).context("Failed to create tokio UDP socket")
}

/// Sends lines to elevators on `host:(base_port + id)`.
#[derive(Debug, Clone)]
pub struct UdpElevatorLink {
    socket: Arc<UdpSocket>,
    host: IpAddr,
    base_port: u16,
}

impl UdpElevatorLink {
    /// Sends through `socket`, usually the scheduler's own listening socket.
    pub fn new(socket: Arc<UdpSocket>, host: IpAddr, base_port: u16) -> Self {
        Self { socket, host, base_port }
    }

    /// Address elevator `id` listens on
    pub fn elevator_addr(&self, id: u8) -> anyhow::Result<SocketAddr> {
        let port = self
            .base_port
            .checked_add(u16::from(id))
            .with_context(|| format!("No port for elevator {}", id))?;
        Ok(SocketAddr::new(self.host, port))
    }
}

impl ElevatorLink for UdpElevatorLink {
    async fn send_to_elevator(&self, elevator_id: u8, line: String) -> anyhow::Result<()> {
        let addr = self.elevator_addr(elevator_id)?;
        self.socket
            .send_to(line.as_bytes(), addr)
            .await
            .with_context(|| format!("Failed to send {:?} to {}", line, addr))?;
        Ok(())
    }
}

/// Sends lines to the scheduler.
#[derive(Debug, Clone)]
pub struct UdpSchedulerLink {
    socket: Arc<UdpSocket>,
    addr: SocketAddr,
}

impl UdpSchedulerLink {
    /// Sends through `socket` to the scheduler at `addr`.
    pub fn new(socket: Arc<UdpSocket>, addr: SocketAddr) -> Self {
        Self { socket, addr }
    }
}

impl SchedulerLink for UdpSchedulerLink {
    async fn send_to_scheduler(&self, line: String) -> anyhow::Result<()> {
        self.socket
            .send_to(line.as_bytes(), self.addr)
            .await
            .with_context(|| format!("Failed to send {:?} to scheduler {}", line, self.addr))?;
        Ok(())
    }
}

/// Receives datagrams on `socket` and hands every line to the router, in arrival order.
///
/// Receive errors and undecodable datagrams are logged and skipped. Each receive is
/// bounded by [config::POLL_PERIOD] so the shutdown flag is checked regularly.
pub async fn run_ingestion(state: SchedulerState, socket: Arc<UdpSocket>) {
    print::info(format!(
        "Scheduler listening on port {}",
        socket.local_addr().map(|a| a.port()).unwrap_or(state.config.scheduler_port)
    ));
    let mut buf = [0u8; config::UDP_BUFFER];

    while !state.is_shutting_down() {
        let (len, sender) = match timeout(config::POLL_PERIOD, socket.recv_from(&mut buf)).await {
            Ok(Ok(res)) => res,
            Ok(Err(e)) => {
                print::err(format!("udp_net.rs, run_ingestion(): {}", e));
                continue;
            }
            // No data within the poll period
            Err(_) => continue,
        };

        let line = String::from_utf8_lossy(&buf[..len]);
        print::info(format!("Received {:?} from {}", line.trim(), sender));
        router::route_line(&state, &line, Instant::now()).await;
    }
    print::info("Ingestion stopped".to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::manager::{Direction, Request};
    use std::time::Duration;

    #[test]
    fn test_parse_host() {
        assert_eq!(parse_host("localhost").unwrap(), IpAddr::from([127, 0, 0, 1]));
        assert_eq!(parse_host("10.0.0.7").unwrap(), IpAddr::from([10, 0, 0, 7]));
        assert!(parse_host("not a host").is_err());
    }

    #[tokio::test]
    async fn test_elevator_addr_uses_base_port() {
        let socket = Arc::new(bind_udp(0).unwrap());
        let link = UdpElevatorLink::new(socket, IpAddr::from([127, 0, 0, 1]), 5100);
        assert_eq!(link.elevator_addr(3).unwrap().port(), 5103);
    }

    #[tokio::test]
    async fn test_ingestion_routes_datagrams() {
        let server = Arc::new(bind_udp(0).unwrap());
        let port = server.local_addr().unwrap().port();
        let state = SchedulerState::new(SchedulerConfig::default());
        let task = tokio::spawn(run_ingestion(state.clone(), server));

        let client_socket = Arc::new(bind_udp(0).unwrap());
        let link = UdpSchedulerLink::new(client_socket, SocketAddr::from(([127, 0, 0, 1], port)));
        link.send_to_scheduler("not a message".to_string()).await.unwrap();
        link.send_to_scheduler("1 UP 5".to_string()).await.unwrap();

        let mut got = None;
        for _ in 0..100 {
            if let Some(r) = state.queue.try_dequeue().await {
                got = Some(r);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(got, Some(Request::new(1, Direction::Up, 5)));

        state.request_shutdown();
        tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
    }
}
