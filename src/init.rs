//! Argument parsing and startup of the selected role.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};

use crate::config::{self, ElevatorSimConfig, SchedulerConfig};
use crate::manager::{self, dispatcher, SchedulerState};
use crate::network::udp_net::{self, UdpElevatorLink};
use crate::print;

/// Which program to run.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// The dispatch scheduler (default)
    Scheduler(SchedulerConfig),
    /// One simulated elevator
    Elevator(ElevatorSimConfig),
    /// The request generator, playing the given file
    Client {
        /// Request file
        path: PathBuf,
        /// Scheduler host
        host: String,
        /// Scheduler port
        scheduler_port: u16,
    },
    /// `help` was given, nothing should run
    Help,
}

const HELP: &str = "\
Available arguments:
  elevator::<id>             run a simulated elevator instead of the scheduler
  client::<file>             play a request file against the scheduler
  config::<path>             JSON file with scheduler config
  elevators::<n>             number of elevators
  floors::<n>                number of floors
  capacity::<n>              max load per elevator
  backoff_ms::<ms>           wait before a request is retried
  freshness_secs::<s>        how long a WARNING keeps an elevator out
  status_secs::<s>           interval of the status print
  host::<ip>                 host of the scheduler / elevators
  stuck_door::<n>            (elevator) number of failing door attempts
  print_status::true/false
  print_err::true/false
  print_warn::true/false
  print_ok::true/false
  print_info::true/false
  print_else::true/false
  debug                      only error messages are shown
  help";

fn parse_value<T: FromStr>(key: &str, value: &str) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse::<T>()
        .with_context(|| format!("Invalid value {:?} for argument {}", value, key))
}

/// Parses the arguments (without the program name) into the [Mode] to run.
///
/// The `config::<path>` file is applied first, then every other `key::value`, so
/// arguments override the file regardless of order. Print toggles take effect immediately.
pub fn parse_args(args: &[String]) -> anyhow::Result<Mode> {
    let mut cfg = SchedulerConfig::default();
    for arg in args {
        if let Some(("config", path)) = arg.split_once("::") {
            cfg = SchedulerConfig::load_from_file(Path::new(path))?;
        }
    }

    let mut elevator_id: Option<u8> = None;
    let mut stuck_door = 0;
    let mut client_file: Option<PathBuf> = None;

    for arg in args {
        let lower = arg.to_lowercase();
        if lower == "help" {
            println!("{}", HELP);
            return Ok(Mode::Help);
        }
        if lower == "debug" {
            for flag in [
                &config::PRINT_STATUS_ON,
                &config::PRINT_WARN_ON,
                &config::PRINT_OK_ON,
                &config::PRINT_INFO_ON,
                &config::PRINT_ELSE_ON,
            ] {
                config::set_print_flag(flag, false);
            }
            continue;
        }

        let Some((key, value)) = arg.split_once("::") else {
            bail!("Unknown argument {:?}, see `help`", arg);
        };
        let key = key.to_lowercase();
        let is_true = value.eq_ignore_ascii_case("true");
        match key.as_str() {
            "config" => {}
            "elevator" => elevator_id = Some(parse_value(&key, value)?),
            "client" => client_file = Some(PathBuf::from(value)),
            "elevators" => cfg.elevator_count = parse_value(&key, value)?,
            "floors" => cfg.floor_count = parse_value(&key, value)?,
            "capacity" => cfg.max_capacity = parse_value(&key, value)?,
            "backoff_ms" => cfg.retry_backoff_ms = parse_value(&key, value)?,
            "freshness_secs" => cfg.warning_freshness_secs = parse_value(&key, value)?,
            "status_secs" => cfg.status_interval_secs = parse_value(&key, value)?,
            "host" => cfg.host = value.to_string(),
            "stuck_door" => stuck_door = parse_value(&key, value)?,
            "print_status" => config::set_print_flag(&config::PRINT_STATUS_ON, is_true),
            "print_err" => config::set_print_flag(&config::PRINT_ERR_ON, is_true),
            "print_warn" => config::set_print_flag(&config::PRINT_WARN_ON, is_true),
            "print_ok" => config::set_print_flag(&config::PRINT_OK_ON, is_true),
            "print_info" => config::set_print_flag(&config::PRINT_INFO_ON, is_true),
            "print_else" => config::set_print_flag(&config::PRINT_ELSE_ON, is_true),
            _ => bail!("Unknown argument {:?}, see `help`", arg),
        }
    }

    match (elevator_id, client_file) {
        (Some(_), Some(_)) => bail!("Choose either elevator:: or client::, not both"),
        (Some(id), None) => Ok(Mode::Elevator(ElevatorSimConfig {
            stuck_door_attempts: stuck_door,
            scheduler_port: cfg.scheduler_port,
            elevator_base_port: cfg.elevator_base_port,
            host: cfg.host,
            ..ElevatorSimConfig::new(id)
        })),
        (None, Some(path)) => Ok(Mode::Client {
            path,
            host: cfg.host,
            scheduler_port: cfg.scheduler_port,
        }),
        (None, None) => {
            cfg.validate()?;
            Ok(Mode::Scheduler(cfg))
        }
    }
}

/// Runs the scheduler until ctrl-c.
///
/// Binds the scheduler port, then spawns the ingestion, dispatch and status display tasks.
/// On ctrl-c the shutdown flag is raised and the tasks are given a moment to stop.
pub async fn start_scheduler(cfg: SchedulerConfig) -> anyhow::Result<()> {
    let socket = Arc::new(udp_net::bind_udp(cfg.scheduler_port)?);
    let host = udp_net::parse_host(&cfg.host)?;
    let link = UdpElevatorLink::new(socket.clone(), host, cfg.elevator_base_port);

    print::ok(format!(
        "Scheduler started: {} elevators, {} floors, capacity {}",
        cfg.elevator_count, cfg.floor_count, cfg.max_capacity
    ));
    let state = SchedulerState::new(cfg);

    let ingestion = tokio::spawn(udp_net::run_ingestion(state.clone(), socket));
    let dispatch = {
        let state = state.clone();
        tokio::spawn(async move { dispatcher::run_dispatcher(state, &link).await })
    };
    let status = tokio::spawn(manager::run_status_display(state.clone()));

    tokio::signal::ctrl_c().await.context("Failed to listen for ctrl-c")?;
    print::info("Shutting down scheduler...".to_string());
    state.request_shutdown();
    status.abort();

    let grace = Duration::from_secs(2);
    for (name, task) in [("ingestion", ingestion), ("dispatcher", dispatch)] {
        match tokio::time::timeout(grace, task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => print::err(format!("{} task failed: {}", name, e)),
            Err(_) => print::warn(format!("{} task did not stop within {:?}", name, grace)),
        }
    }
    print::ok("Scheduler stopped".to_string());
    Ok(())
}
