//! Ride-request generator.
//!
//! Reads a request file with lines on the form `hh:mm:ss <floor> <UP|DOWN> <targetFloor>` and
//! sends each request to the scheduler when its timestamp, counted from start, is reached.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use tokio::time::{sleep_until, Instant};

use crate::manager::{Direction, Request};
use crate::network::message::Message;
use crate::network::udp_net::{self, UdpSchedulerLink};
use crate::network::SchedulerLink;
use crate::print;

/// One request from the file, with its offset from program start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedRequest {
    /// When to send, relative to start
    pub offset: Duration,
    /// What to send
    pub request: Request,
}

/// Parses `hh:mm:ss` into an offset.
pub fn parse_timestamp(token: &str) -> anyhow::Result<Duration> {
    let parts: Vec<&str> = token.split(':').collect();
    let [h, m, s] = parts.as_slice() else {
        bail!("Timestamp {:?} is not hh:mm:ss", token);
    };
    let h: u64 = h.parse().with_context(|| format!("Invalid hours in {:?}", token))?;
    let m: u64 = m.parse().with_context(|| format!("Invalid minutes in {:?}", token))?;
    let s: u64 = s.parse().with_context(|| format!("Invalid seconds in {:?}", token))?;
    let secs = h
        .checked_mul(3600)
        .and_then(|hs| m.checked_mul(60).and_then(|ms| hs.checked_add(ms)))
        .and_then(|hms| hms.checked_add(s))
        .with_context(|| format!("Timestamp {:?} is out of range", token))?;
    Ok(Duration::from_secs(secs))
}

/// Parses one line of the request file.
pub fn parse_line(line: &str) -> anyhow::Result<TimedRequest> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [timestamp, floor, direction, target] = tokens.as_slice() else {
        bail!("Expected `hh:mm:ss floor DIR target`, got {} fields", tokens.len());
    };
    let offset = parse_timestamp(timestamp)?;
    let origin: u8 = floor.parse().with_context(|| format!("Invalid floor {:?}", floor))?;
    let direction: Direction = direction.parse()?;
    let target: u8 = target.parse().with_context(|| format!("Invalid target floor {:?}", target))?;
    Ok(TimedRequest { offset, request: Request::new(origin, direction, target) })
}

/// Loads every valid request in `path`. Blank lines are skipped silently, invalid ones with an error.
pub fn load_requests(path: &Path) -> anyhow::Result<Vec<TimedRequest>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Unable to open input file {}", path.display()))?;
    let mut requests = Vec::new();
    for (no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(req) => requests.push(req),
            Err(e) => print::err(format!("Invalid request format on line {}: {:?} ({:#})", no + 1, line, e)),
        }
    }
    Ok(requests)
}

/// Sends `requests` in order, each no earlier than `start + offset`.
///
/// Returns the number of requests that were sent.
pub async fn run_client<L: SchedulerLink>(requests: Vec<TimedRequest>, link: &L) -> usize {
    let start = Instant::now();
    let mut sent = 0;
    for timed in requests {
        sleep_until(start + timed.offset).await;
        let line = Message::Request(timed.request.clone()).to_string();
        match link.send_to_scheduler(line).await {
            Ok(()) => {
                sent += 1;
                print::client(format!("Sent request: {}", timed.request));
            }
            Err(e) => print::err(format!("Failed to send request {}: {:#}", timed.request, e)),
        }
    }
    sent
}

/// Loads `path` and plays it against the scheduler at `host:scheduler_port`.
pub async fn start_client(path: &Path, host: &str, scheduler_port: u16) -> anyhow::Result<()> {
    let requests = load_requests(path)?;
    print::client(format!("Loaded {} requests from {}", requests.len(), path.display()));

    let socket = std::sync::Arc::new(udp_net::bind_udp(0)?);
    let link = UdpSchedulerLink::new(socket, (udp_net::parse_host(host)?, scheduler_port).into());
    let sent = run_client(requests, &link).await;
    print::client(format!("Done, {} requests sent", sent));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    #[test]
    fn test_parse_line() {
        let req = parse_line("00:01:05 3 up 7").unwrap();
        assert_eq!(req.offset, Duration::from_secs(65));
        assert_eq!(req.request, Request::new(3, Direction::Up, 7));

        assert!(parse_line("00:01 3 UP 7").is_err());
        assert!(parse_line("00:00:01 3 SIDEWAYS 7").is_err());
        assert!(parse_line("00:00:01 3 UP").is_err());
    }

    #[test]
    fn test_huge_timestamp_is_an_error() {
        assert!(parse_timestamp("99999999999999999:00:00").is_err());
        assert!(parse_timestamp("00:00:18446744073709551615").is_ok());
        assert!(parse_timestamp("00:01:18446744073709551615").is_err());
    }

    #[test]
    fn test_load_skips_invalid_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "00:00:00 1 UP 4").unwrap();
        writeln!(file, "this is not a request").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "00:00:02 6 DOWN 0").unwrap();

        let requests = load_requests(file.path()).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].request, Request::new(6, Direction::Down, 0));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_requests(Path::new("/definitely/not/here.txt")).is_err());
    }

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(Instant, String)>>,
    }

    impl SchedulerLink for Recorder {
        async fn send_to_scheduler(&self, line: String) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push((Instant::now(), line));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_requests_are_paced_by_timestamp() {
        let link = Recorder::default();
        let requests = vec![
            TimedRequest { offset: Duration::ZERO, request: Request::new(1, Direction::Up, 4) },
            TimedRequest { offset: Duration::from_millis(50), request: Request::new(5, Direction::Down, 2) },
        ];
        let start = Instant::now();

        assert_eq!(run_client(requests, &link).await, 2);

        let sent = link.sent.lock().unwrap();
        assert_eq!(sent[0].1, "1 UP 4");
        assert_eq!(sent[1].1, "5 DOWN 2");
        assert!(sent[1].0 - start >= Duration::from_millis(50));
    }
}
