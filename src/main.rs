/* 3rd party libraries */
use clap::{Arg, Command};
use log::{error, info, warn};
use std::io;
use std::sync::Arc;
use std::thread::{sleep, Builder, JoinHandle};
use std::time::{Duration, Instant};

/* Custom libraries */
use config::RequestConfig;
use elevator::{ElevatorCar, ElevatorHandle};
use registry::RequestRegistry;
use shared::{Direction, Request};

/* Modules */
mod config;
mod elevator;
mod registry;
mod shared;

/* Main */
fn main() -> io::Result<()> {
    let matches = Command::new("elevator-bank")
        .about("Simulates a bank of elevators dispatching rider requests")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .takes_value(true)
                .default_value("config.toml")
                .help("Path to the TOML configuration file"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .takes_value(true)
                .help("Log filter, e.g. 'debug' (overrides RUST_LOG)"),
        )
        .get_matches();

    // Initialize logging
    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = matches.value_of("log-level") {
        logger.parse_filters(level);
    }
    logger.init();

    // Load the configuration
    let config_path = matches.value_of("config").unwrap_or("config.toml");
    let config = unwrap_or_exit!(config::load_config(config_path));

    // Shared request registry for the whole bank
    let registry = Arc::new(RequestRegistry::new());

    // Start one thread per elevator car
    let mut handles: Vec<ElevatorHandle> = Vec::new();
    for name in config.simulation.cars.iter() {
        let car = ElevatorCar::new(name, &config.elevator, registry.clone());
        info!("Starting elevator {} at floor {}", car.name(), car.current_floor());
        handles.push(car.spawn()?);
    }

    // Start feeding rider requests
    let producer = spawn_request_producer(registry.clone(), config.simulation.requests.clone())?;

    // Monitor until every request is delivered or time runs out
    let monitor_interval = Duration::from_millis(config.simulation.monitor_interval_millis);
    let max_runtime = Duration::from_secs(config.simulation.max_runtime_secs);
    let started = Instant::now();
    loop {
        sleep(monitor_interval);

        for handle in handles.iter() {
            info!(
                "[{}] Floor {}; Status={}; Riders={}",
                handle.name(),
                handle.current_floor(),
                handle.direction(),
                handle.destinations().len()
            );
        }
        info!(
            "Waiting riders: up={}, down={}",
            registry.has_requests_for(Direction::Up),
            registry.has_requests_for(Direction::Down)
        );

        if producer.is_finished() && registry.in_flight_requests() == 0 {
            info!("All requests serviced");
            break;
        }
        if started.elapsed() >= max_runtime {
            warn!(
                "Stopping after {}s with {} requests still in flight",
                max_runtime.as_secs(),
                registry.in_flight_requests()
            );
            break;
        }
    }

    // Shut the bank down
    for handle in handles.iter() {
        handle.stop();
    }
    for handle in handles {
        let name = handle.name().to_string();
        match handle.join() {
            Ok(status) => info!(
                "[{}] Final floor {}; Status={}",
                name, status.current_floor, status.direction
            ),
            Err(_) => error!("[{}] Elevator thread panicked", name),
        }
    }

    let stats = registry.current_stats();
    info!(
        "Final Elevator Statistics\n  Completed Requests: {}\n  Average Wait Time: {}s\n  Average Trip Time: {}s",
        stats.completed_requests, stats.average_wait_secs, stats.average_trip_secs
    );

    Ok(())
}

// Adds the configured requests in order. An invalid request aborts the producer.
fn spawn_request_producer(
    registry: Arc<RequestRegistry>,
    requests: Vec<RequestConfig>,
) -> io::Result<JoinHandle<()>> {
    Builder::new().name("request_producer".into()).spawn(move || {
        for entry in requests {
            if entry.delay_millis > 0 {
                sleep(Duration::from_millis(entry.delay_millis));
            }

            let request = match Request::new(entry.floor, entry.direction, entry.destination) {
                Ok(request) => request,
                Err(e) => {
                    error!("Invalid request {:?}: {}", entry, e);
                    return;
                }
            };

            if let Err(e) = registry.add_request(request) {
                error!("Failed to add request: {}", e);
                return;
            }
        }
        info!("All configured requests submitted");
    })
}
