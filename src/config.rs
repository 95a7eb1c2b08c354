/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::Direction;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    #[serde(default)]
    pub elevator: ElevatorConfig,
    pub simulation: SimulationConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ElevatorConfig {
    #[serde(default = "default_starting_floor")]
    pub starting_floor: i32,
    #[serde(default = "default_service_dwell_millis")]
    pub service_dwell_millis: u64,
    #[serde(default = "default_floor_travel_millis")]
    pub floor_travel_millis: u64,
    #[serde(default = "default_idle_poll_millis")]
    pub idle_poll_millis: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SimulationConfig {
    pub cars: Vec<String>,
    #[serde(default = "default_monitor_interval_millis")]
    pub monitor_interval_millis: u64,
    #[serde(default = "default_max_runtime_secs")]
    pub max_runtime_secs: u64,
    #[serde(default)]
    pub requests: Vec<RequestConfig>,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct RequestConfig {
    pub floor: i32,
    pub direction: Direction,
    pub destination: i32,
    #[serde(default)]
    pub delay_millis: u64,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("configuration must name at least one elevator car")]
    NoCars,

    #[error("elevator car name '{0}' is used more than once")]
    DuplicateCar(String),
}

impl Default for ElevatorConfig {
    fn default() -> ElevatorConfig {
        ElevatorConfig {
            starting_floor: default_starting_floor(),
            service_dwell_millis: default_service_dwell_millis(),
            floor_travel_millis: default_floor_travel_millis(),
            idle_poll_millis: default_idle_poll_millis(),
        }
    }
}

fn default_starting_floor() -> i32 {
    1
}

fn default_service_dwell_millis() -> u64 {
    1000
}

fn default_floor_travel_millis() -> u64 {
    1000
}

fn default_idle_poll_millis() -> u64 {
    100
}

fn default_monitor_interval_millis() -> u64 {
    1000
}

fn default_max_runtime_secs() -> u64 {
    120
}

/***************************************/
/*             Public API              */
/***************************************/
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let config_str = fs::read_to_string(path)?;
    parse_config(&config_str)
}

pub fn parse_config(config_str: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(config_str)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.simulation.cars.is_empty() {
        return Err(ConfigError::NoCars);
    }

    let mut seen = HashSet::new();
    for name in config.simulation.cars.iter() {
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::DuplicateCar(name.clone()));
        }
    }
    Ok(())
}
