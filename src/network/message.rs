//! Line-oriented text protocol spoken between client, scheduler and elevators.
//!
//! | Message  | Format                            |
//! |----------|-----------------------------------|
//! | Request  | `<floor> <UP/DOWN> <targetFloor>` |
//! | Status   | `STATUS <id> <floor>`             |
//! | Fault    | `FAULT <id>`                      |
//! | Warning  | `WARNING <id> <reason>`           |
//! | Move     | `MOVE <id> <targetFloor>`         |
//!
//! One message per datagram, tokens separated by whitespace.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};

use crate::manager::{Direction, Request};

/// A decoded protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// New ride request from a client
    Request(Request),
    /// Elevator reached `floor`
    Status {
        /// Elevator ID
        id: u8,
        /// Reached floor
        floor: u8,
    },
    /// Elevator is permanently stuck
    Fault {
        /// Elevator ID
        id: u8,
    },
    /// Elevator reports a transient problem
    Warning {
        /// Elevator ID
        id: u8,
        /// Free text, e.g. `DOOR_STUCK`
        reason: String,
    },
    /// Scheduler tells an elevator where to go
    Move {
        /// Elevator ID
        id: u8,
        /// Floor to travel to
        target_floor: u8,
    },
}

impl FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        if s.eq_ignore_ascii_case("UP") {
            Ok(Direction::Up)
        } else if s.eq_ignore_ascii_case("DOWN") {
            Ok(Direction::Down)
        } else {
            Err(anyhow!("unknown direction {:?}", s))
        }
    }
}

fn parse_num(token: Option<&str>, what: &str) -> anyhow::Result<u8> {
    let token = token.ok_or_else(|| anyhow!("missing {}", what))?;
    token
        .parse::<u8>()
        .with_context(|| format!("invalid {} {:?}", what, token))
}

fn no_trailing<'a>(mut tokens: impl Iterator<Item = &'a str>) -> anyhow::Result<()> {
    match tokens.next() {
        Some(extra) => bail!("unexpected trailing token {:?}", extra),
        None => Ok(()),
    }
}

impl Message {
    /// Parses one line. Anything not matching a known format is an error.
    pub fn parse(line: &str) -> anyhow::Result<Message> {
        let mut tokens = line.split_whitespace();
        let first = tokens.next().ok_or_else(|| anyhow!("empty message"))?;

        let msg = match first {
            "STATUS" => {
                let id = parse_num(tokens.next(), "elevator id")?;
                let floor = parse_num(tokens.next(), "floor")?;
                no_trailing(tokens)?;
                Message::Status { id, floor }
            }
            "FAULT" => {
                let id = parse_num(tokens.next(), "elevator id")?;
                no_trailing(tokens)?;
                Message::Fault { id }
            }
            "WARNING" => {
                let id = parse_num(tokens.next(), "elevator id")?;
                let reason = tokens.collect::<Vec<_>>().join(" ");
                if reason.is_empty() {
                    bail!("missing warning reason");
                }
                Message::Warning { id, reason }
            }
            "MOVE" => {
                let id = parse_num(tokens.next(), "elevator id")?;
                let target_floor = parse_num(tokens.next(), "target floor")?;
                no_trailing(tokens)?;
                Message::Move { id, target_floor }
            }
            _ => {
                let origin_floor = parse_num(Some(first), "floor")?;
                let direction: Direction = tokens
                    .next()
                    .ok_or_else(|| anyhow!("missing direction"))?
                    .parse()?;
                let target_floor = parse_num(tokens.next(), "target floor")?;
                no_trailing(tokens)?;
                if origin_floor == target_floor {
                    bail!("request origin and target are both floor {}", origin_floor);
                }
                Message::Request(Request::new(origin_floor, direction, target_floor))
            }
        };
        Ok(msg)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Request(r) => write!(f, "{} {} {}", r.origin_floor, r.direction, r.target_floor),
            Message::Status { id, floor } => write!(f, "STATUS {} {}", id, floor),
            Message::Fault { id } => write!(f, "FAULT {}", id),
            Message::Warning { id, reason } => write!(f, "WARNING {} {}", id, reason),
            Message::Move { id, target_floor } => write!(f, "MOVE {} {}", id, target_floor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        let msg = Message::parse("3 UP 7").unwrap();
        assert_eq!(msg, Message::Request(Request::new(3, Direction::Up, 7)));
    }

    #[test]
    fn test_parse_request_lowercase_direction() {
        let msg = Message::parse("6 down 1\n").unwrap();
        assert_eq!(msg, Message::Request(Request::new(6, Direction::Down, 1)));
    }

    #[test]
    fn test_parse_telemetry() {
        assert_eq!(Message::parse("STATUS 2 5").unwrap(), Message::Status { id: 2, floor: 5 });
        assert_eq!(Message::parse("FAULT 1").unwrap(), Message::Fault { id: 1 });
        assert_eq!(
            Message::parse("WARNING 3 DOOR_STUCK").unwrap(),
            Message::Warning { id: 3, reason: "DOOR_STUCK".into() }
        );
        assert_eq!(Message::parse("MOVE 1 9").unwrap(), Message::Move { id: 1, target_floor: 9 });
    }

    #[test]
    fn test_malformed_lines_are_errors() {
        for line in [
            "",
            "   ",
            "STATUS",
            "STATUS x 3",
            "STATUS 1 2 3",
            "FAULT",
            "WARNING 2",
            "HELLO 1 2",
            "3 SIDEWAYS 5",
            "3 UP",
            "-1 UP 4",
            "4 UP 4",
        ] {
            assert!(Message::parse(line).is_err(), "expected error for {:?}", line);
        }
    }

    #[test]
    fn test_display_matches_wire_format() {
        assert_eq!(Message::Move { id: 2, target_floor: 8 }.to_string(), "MOVE 2 8");
        assert_eq!(
            Message::Request(Request::new(0, Direction::Up, 4)).to_string(),
            "0 UP 4"
        );
        assert_eq!(
            Message::Warning { id: 1, reason: "DOOR_STUCK".into() }.to_string(),
            "WARNING 1 DOOR_STUCK"
        );
    }
}
