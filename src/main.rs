use elevatordispatch::init::{self, Mode};
use elevatordispatch::{client, elevator_logic, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = init::parse_args(&args)?;

    match mode {
        Mode::Scheduler(cfg) => init::start_scheduler(cfg).await,
        Mode::Elevator(cfg) => {
            print::info(format!("Starting elevator {}", cfg.id));
            elevator_logic::start_elevator(cfg).await
        }
        Mode::Client { path, host, scheduler_port } => {
            client::start_client(&path, &host, scheduler_port).await
        }
        Mode::Help => Ok(()),
    }
}
