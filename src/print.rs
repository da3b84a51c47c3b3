//! ## Printing Module
//!
//! This module is here to make logging in the terminal easier to read.
//! It allows to print in appropriate colors depending on the situation, and every level
//! can be switched off from the command line (see [crate::init::parse_args]).
//! It also provides the periodic status table of the scheduler.
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use ansi_term::Colour::{self, Green, Purple, Red, Yellow};
use prettytable::{format, row, Table};
use unicode_width::UnicodeWidthStr;

use crate::config;
use crate::manager::StatsSnapshot;
use crate::registry::{self, ElevatorRecord, ElevatorStatus};

/// Prints an error message in red to the terminal.
///
/// If `PRINT_ERR_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[ERROR\]:     {}", msg
///
/// ## Example
/// ```
/// use elevatordispatch::print;
///
/// print::err("Something went wrong!".to_string());
/// ```
pub fn err(msg: String) {
    if config::print_flag(&config::PRINT_ERR_ON) {
        println!("{}{}\n", Red.paint("[ERROR]:     "), Red.paint(msg));
    }
}

/// Prints a warning message in yellow to the terminal.
///
/// If `PRINT_WARN_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[WARNING\]:   {}", msg
pub fn warn(msg: String) {
    if config::print_flag(&config::PRINT_WARN_ON) {
        println!("{}{}\n", Yellow.paint("[WARNING]:   "), Yellow.paint(msg));
    }
}

/// Prints a success message in green to the terminal.
///
/// If `PRINT_OK_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[OK\]:        {}", msg
pub fn ok(msg: String) {
    if config::print_flag(&config::PRINT_OK_ON) {
        println!("{}{}\n", Green.paint("[OK]:        "), Green.paint(msg));
    }
}

/// Prints an informational message in light blue to the terminal.
///
/// If `PRINT_INFO_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[INFO\]:      {}", msg
pub fn info(msg: String) {
    let light_blue = Colour::RGB(102, 178, 255);
    if config::print_flag(&config::PRINT_INFO_ON) {
        println!("{}{}\n", light_blue.paint("[INFO]:      "), light_blue.paint(msg));
    }
}

/// Prints a scheduler-specific message in pink to the terminal.
///
/// If `PRINT_ELSE_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[SCHEDULER\]: {}", msg
pub fn scheduler(msg: String) {
    let pink = Colour::RGB(255, 51, 255);
    if config::print_flag(&config::PRINT_ELSE_ON) {
        println!("{}{}\n", pink.paint("[SCHEDULER]: "), pink.paint(msg));
    }
}

/// Prints an elevator-specific message in orange, tagged with the elevator ID.
///
/// If `PRINT_ELSE_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[ELEVATOR 2\]: {}", msg
pub fn elevator(id: u8, msg: String) {
    let orange = Colour::RGB(204, 102, 0);
    if config::print_flag(&config::PRINT_ELSE_ON) {
        println!("{}{}\n", orange.paint(format!("[ELEVATOR {}]: ", id)), orange.paint(msg));
    }
}

/// Prints a client-specific message in cyan.
///
/// If `PRINT_ELSE_ON` is `false`, the message will not be printed.
pub fn client(msg: String) {
    if config::print_flag(&config::PRINT_ELSE_ON) {
        println!("{}{}\n", Colour::Cyan.paint("[CLIENT]:    "), Colour::Cyan.paint(msg));
    }
}

/// Pads the input text to a fixed display width using spaces.
///
/// Accounts for characters that may take more than one column width (e.g. Unicode symbols),
/// ensuring aligned text in terminal-based tables or UI output.
fn pad_text(text: &str, width: usize) -> String {
    let visible_width = UnicodeWidthStr::width(text);
    let padding = width.saturating_sub(visible_width);
    format!("{}{}", text, " ".repeat(padding))
}

/// Human readable floor, `None` is shown as in transit.
fn floor_label(floor: Option<u8>) -> String {
    match floor {
        Some(f) => f.to_string(),
        None => "in transit".to_string(),
    }
}

/// Coloured status label used in the status table.
fn status_label(status: &ElevatorStatus) -> String {
    match status {
        ElevatorStatus::Operational => Green.paint("Operational").to_string(),
        ElevatorStatus::Moving => Yellow.paint("Moving").to_string(),
        ElevatorStatus::Warning(reason) => Purple.paint(format!("Warning({})", reason)).to_string(),
        ElevatorStatus::Faulted => Red.paint("Faulted").to_string(),
    }
}

/// Formats a duration as `hh:mm:ss`.
fn hms(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Prints the current scheduler state to the terminal as a table.
///
/// Shows every elevator (ID, floor, load/capacity, status), the number of pending
/// requests and the dispatch counters. Elevators that have been `Moving` longer than
/// `move_ack_warn` without reporting STATUS get a warning line; the registry is not changed.
///
/// # Behavior
/// - If `config::PRINT_STATUS_ON` is false, the function exits early.
/// - Printing frequency should be limited (default once every 10 s).
pub fn status(
    records: &BTreeMap<u8, ElevatorRecord>,
    queue_len: usize,
    stats: &StatsSnapshot,
    max_capacity: u8,
    move_ack_warn: Duration,
    now: Instant,
) {
    if !config::print_flag(&config::PRINT_STATUS_ON) {
        return;
    }

    println!("{}", Colour::Cyan.bold().paint(format!("┌{}┐", "─".repeat(32))));
    println!("{}", Colour::Cyan.bold().paint(format!("│{}│", pad_text("     ELEVATOR SYSTEM STATUS", 32))));
    println!("{}", Colour::Cyan.bold().paint(format!("└{}┘", "─".repeat(32))));

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(row!["ID", "Floor", "Load", "Status"]);
    for (id, record) in records {
        table.add_row(row![
            id,
            floor_label(record.floor),
            format!("{}/{}", record.load, max_capacity),
            status_label(&record.status)
        ]);
    }
    table.printstd();

    let mut summary = Table::new();
    summary.set_format(*format::consts::FORMAT_BOX_CHARS);
    summary.set_titles(row!["Pending", "Moves", "Handled", "Retries", "Uptime"]);
    summary.add_row(row![
        queue_len,
        stats.move_count,
        stats.requests_handled,
        stats.retries,
        hms(stats.uptime)
    ]);
    summary.printstd();

    for (id, waited) in registry::unacknowledged_moves(records, now, move_ack_warn) {
        warn(format!(
            "Elevator {} has been moving for {}s without reporting STATUS",
            id,
            waited.as_secs()
        ));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_text_pads_to_width() {
        assert_eq!(pad_text("ab", 5), "ab   ");
        assert_eq!(pad_text("abcdef", 3), "abcdef");
    }

    #[test]
    fn test_hms() {
        assert_eq!(hms(Duration::from_secs(3725)), "01:02:05");
    }

    #[test]
    fn test_floor_label_in_transit() {
        assert_eq!(floor_label(None), "in transit");
        assert_eq!(floor_label(Some(3)), "3");
    }
}
