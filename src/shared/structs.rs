/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Idle,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
            Direction::Idle => write!(f, "IDLE"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("direction of a request cannot be IDLE")]
    IdleDirection,

    #[error("direction is DOWN, so destination {destination} must be below floor {floor}")]
    DestinationNotBelow { floor: i32, destination: i32 },

    #[error("direction is UP, so destination {destination} must be above floor {floor}")]
    DestinationNotAbove { floor: i32, destination: i32 },
}

/**
 * A rider's trip, made from `floor` and heading for `destination_floor`.
 *
 * The rider presses the hall button for `direction` and, once picked up, asks
 * for the destination. Requests are immutable and only built through
 * `Request::new`, so every live request satisfies the direction/destination
 * relation.
 *
 * # Fields
 * - `floor`:               The floor the request was made from.
 * - `direction`:           `Up` or `Down`, never `Idle`.
 * - `destination_floor`:   Where the rider gets off.
 * - `id`:                  Opaque unique id (UUID v4) keying the registry's stats.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    floor: i32,
    direction: Direction,
    destination_floor: i32,
    id: String,
}

impl Request {
    pub fn new(floor: i32, direction: Direction, destination_floor: i32) -> Result<Request, RequestError> {
        match direction {
            Direction::Idle => return Err(RequestError::IdleDirection),
            Direction::Down if destination_floor >= floor => {
                return Err(RequestError::DestinationNotBelow {
                    floor,
                    destination: destination_floor,
                });
            }
            Direction::Up if destination_floor <= floor => {
                return Err(RequestError::DestinationNotAbove {
                    floor,
                    destination: destination_floor,
                });
            }
            _ => {}
        }

        Ok(Request {
            floor,
            direction,
            destination_floor,
            id: Uuid::new_v4().to_string(),
        })
    }

    pub fn floor(&self) -> i32 {
        self.floor
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn destination_floor(&self) -> i32 {
        self.destination_floor
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}; {} -> {}]", self.floor, self.direction, self.destination_floor)
    }
}

// Pre-calculated statistics for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElevatorStatistics {
    pub average_wait_secs: u64,
    pub average_trip_secs: u64,
    pub completed_requests: usize,
}
