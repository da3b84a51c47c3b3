#![warn(missing_docs)]
//! # Elevator dispatch library
//!
//! A central scheduler that assigns ride requests to a fleet of elevators, together with a
//! simulated elevator and a request generator. All three talk a line-oriented UDP protocol.
//!
//! ## Overview
//! - **Config**: Static parameters, print toggles and the runtime configs.
//! - **Init**: Argument parsing and startup of the selected role.
//! - **Print**: Colour-coded logging and the periodic status table.
//! - **Registry**: Last known state of every elevator.
//! - **Manager**: Request queue, elevator selection and the dispatch loop.
//! - **Network**: Wire protocol, message routing and UDP plumbing.
//! - **Elevator Logic**: The simulated elevator.
//! - **Client**: Plays a request file against the scheduler.

/// Global variables and runtime configuration
pub mod config;

/// Initialize functions
pub mod init;

/// Print functions with color coding
pub mod print;

pub mod registry;

pub mod manager;

/// Network communication over UDP.
pub mod network;

pub mod elevator_logic;

pub mod client;
