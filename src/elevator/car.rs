/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, error, info};
use std::cmp::Ordering;
use std::io;
use std::sync::{Arc, Mutex};
use std::thread::{self, Builder, JoinHandle};
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::ElevatorConfig;
use crate::registry::{RegistryState, RequestRegistry};
use crate::shared::{Direction, Request};

/***************************************/
/*       Public data structures        */
/***************************************/

// Last published position of a car, for monitoring only
#[derive(Debug, Clone, PartialEq)]
pub struct CarStatus {
    pub current_floor: i32,
    pub direction: Direction,
    pub destinations: Vec<Request>,
}

// Outcome of a single pass through the decision loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub floor: i32,
    pub next_floor: i32,
    pub direction: Direction,
    pub stopped_at_floor: bool,
}

// Cloneable handle used to ask a car to stop. Stopping twice is harmless.
#[derive(Debug, Clone)]
pub struct StopSignal {
    terminate_tx: cbc::Sender<()>,
}

impl StopSignal {
    pub fn stop(&self) {
        let _ = self.terminate_tx.try_send(());
    }
}

/**
 * One elevator car and the loop that drives it.
 *
 * Every tick the car takes the registry's lock, drops off riders bound for the
 * current floor, picks up a waiting rider if the dispatch rule allows it and
 * decides which floor to go to next. The lock is released before the car waits
 * out the simulated dwell and travel time, so other cars are never held up by
 * this one's travel.
 *
 * A car only takes a rider when it is empty or the rider travels the way the
 * car is already going. Once moving with riders on board it keeps its
 * direction until the last one is off. An empty car heads for the first pending
 * request in arrival order, not the nearest one.
 *
 * # Fields
 * - `name`:            Unique name of the car, used in log output.
 * - `registry`:        The request registry shared with the rest of the bank.
 * - `current_floor`:   The floor the car is at.
 * - `direction`:       Current travel direction, `Idle` when standing still.
 * - `destinations`:    Riders on board, sorted by destination floor.
 * - `service_dwell`:   Time spent at a floor when riders get on or off.
 * - `floor_travel`:    Time spent moving between two adjacent floors.
 * - `idle_poll`:       Time between registry polls while the car has nothing to do.
 * - `stop_requested`:  Set once a stop signal has been seen.
 * - `terminate_tx`:    Kept to hand out `StopSignal`s.
 * - `terminate_rx`:    Receives stop signals. Waits are done on this channel so a stop wakes the car.
 * - `status`:          Snapshot shared with `ElevatorHandle`, written after every tick.
 */
pub struct ElevatorCar {
    name: String,
    registry: Arc<RequestRegistry>,
    current_floor: i32,
    direction: Direction,
    destinations: Vec<Request>,
    service_dwell: Duration,
    floor_travel: Duration,
    idle_poll: Duration,
    stop_requested: bool,
    terminate_tx: cbc::Sender<()>,
    terminate_rx: cbc::Receiver<()>,
    status: Arc<Mutex<CarStatus>>,
}

impl ElevatorCar {
    pub fn new(name: &str, config: &ElevatorConfig, registry: Arc<RequestRegistry>) -> ElevatorCar {
        let (terminate_tx, terminate_rx) = cbc::bounded::<()>(1);
        let status = CarStatus {
            current_floor: config.starting_floor,
            direction: Direction::Idle,
            destinations: Vec::new(),
        };

        ElevatorCar {
            name: name.to_string(),
            registry,
            current_floor: config.starting_floor,
            direction: Direction::Idle,
            destinations: Vec::new(),
            service_dwell: Duration::from_millis(config.service_dwell_millis),
            floor_travel: Duration::from_millis(config.floor_travel_millis),
            idle_poll: Duration::from_millis(config.idle_poll_millis),
            stop_requested: false,
            terminate_tx,
            terminate_rx,
            status: Arc::new(Mutex::new(status)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_floor(&self) -> i32 {
        self.current_floor
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn destinations(&self) -> &[Request] {
        &self.destinations
    }

    pub fn stop_signal(&self) -> StopSignal {
        StopSignal {
            terminate_tx: self.terminate_tx.clone(),
        }
    }

    pub fn spawn(self) -> io::Result<ElevatorHandle> {
        let name = self.name.clone();
        let stop_signal = self.stop_signal();
        let status = self.status.clone();

        let mut car = self;
        let thread = Builder::new()
            .name(format!("elevator_{}", name))
            .spawn(move || car.run())?;

        Ok(ElevatorHandle {
            name,
            stop_signal,
            status,
            thread,
        })
    }

    pub fn run(&mut self) {
        while !self.check_stop() {
            let report = self.tick();

            // Nothing to do, so poll the registry again later
            if !report.stopped_at_floor && report.direction == Direction::Idle {
                self.wait(self.idle_poll);
            }
        }

        info!(
            "[{}] Stopped at floor {}; Status={}",
            self.name, self.current_floor, self.direction
        );
    }

    pub fn tick(&mut self) -> TickReport {
        if self.direction != Direction::Idle {
            debug!("[{}] At floor {}; Status={}", self.name, self.current_floor, self.direction);
        }

        let floor = self.current_floor;
        let registry = self.registry.clone();
        let (stopped_at_floor, next_floor) = {
            let mut state = registry.lock();

            let dropped_off = self.drop_off_passengers(&mut state);
            let picked_up = self.pick_up_passengers(&mut state);
            let next_floor = self.next_floor(&state);

            (dropped_off || picked_up, next_floor)
        };

        self.direction = match next_floor.cmp(&self.current_floor) {
            Ordering::Equal => Direction::Idle,
            Ordering::Less => Direction::Down,
            Ordering::Greater => Direction::Up,
        };

        self.wait_if_necessary(stopped_at_floor);
        self.current_floor = next_floor;
        self.publish_status();

        TickReport {
            floor,
            next_floor,
            direction: self.direction,
            stopped_at_floor,
        }
    }

    fn drop_off_passengers(&mut self, state: &mut RegistryState) -> bool {
        let floor = self.current_floor;
        let (arrived, remaining): (Vec<Request>, Vec<Request>) = self
            .destinations
            .drain(..)
            .partition(|r| r.destination_floor() == floor);
        self.destinations = remaining;

        for request in arrived.iter() {
            info!("[{}] Dropping off passenger on floor {}", self.name, floor);
            if let Err(e) = state.request_completed(request) {
                error!("[{}] Failed to complete request {}: {}", self.name, request, e);
            }
        }

        !arrived.is_empty()
    }

    fn pick_up_passengers(&mut self, state: &mut RegistryState) -> bool {
        let request = match state.get_request(self.current_floor) {
            Some(request) => request,
            None => return false,
        };

        if !self.destinations.is_empty() && request.direction() != self.direction {
            return false;
        }

        info!("[{}] Picking up passenger on floor {}", self.name, self.current_floor);
        if let Err(e) = state.request_serviced(&request) {
            error!("[{}] Failed to service request {}: {}", self.name, request, e);
            return false;
        }

        self.direction = request.direction();
        self.add_destination(request);
        true
    }

    fn add_destination(&mut self, request: Request) {
        self.destinations.push(request);
        self.destinations.sort_by_key(|r| r.destination_floor());
    }

    fn next_floor(&self, state: &RegistryState) -> i32 {
        let floor = self.current_floor;

        if self.destinations.is_empty() {
            return match state.first_pending() {
                Some(request) => match request.floor().cmp(&floor) {
                    Ordering::Less => floor - 1,
                    Ordering::Greater => floor + 1,
                    Ordering::Equal => floor,
                },
                None => floor,
            };
        }

        match self.direction {
            Direction::Up => floor + 1,
            Direction::Down => floor - 1,
            Direction::Idle => floor,
        }
    }

    // Simulate the time needed to let riders on or off, then to reach the next floor
    fn wait_if_necessary(&mut self, stopped_at_floor: bool) {
        if stopped_at_floor {
            self.wait(self.service_dwell);
        }
        if self.direction != Direction::Idle {
            self.wait(self.floor_travel);
        }
    }

    fn wait(&mut self, duration: Duration) {
        if self.stop_requested || duration.is_zero() {
            return;
        }

        match self.terminate_rx.recv_timeout(duration) {
            Ok(()) => self.stop_requested = true,
            Err(cbc::RecvTimeoutError::Timeout) => (),
            Err(cbc::RecvTimeoutError::Disconnected) => self.stop_requested = true,
        }
    }

    fn check_stop(&mut self) -> bool {
        if !self.stop_requested && self.terminate_rx.try_recv().is_ok() {
            self.stop_requested = true;
        }
        self.stop_requested
    }

    fn publish_status(&self) {
        let mut status = self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *status = CarStatus {
            current_floor: self.current_floor,
            direction: self.direction,
            destinations: self.destinations.clone(),
        };
    }
}

/**
 * Handle to a car running on its own thread.
 *
 * Position, direction and destinations are read from the snapshot the car
 * publishes after each tick. They may lag the car by up to one tick.
 */
pub struct ElevatorHandle {
    name: String,
    stop_signal: StopSignal,
    status: Arc<Mutex<CarStatus>>,
    thread: JoinHandle<()>,
}

impl ElevatorHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stop(&self) {
        self.stop_signal.stop();
    }

    fn status(&self) -> CarStatus {
        self.status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn current_floor(&self) -> i32 {
        self.status().current_floor
    }

    pub fn direction(&self) -> Direction {
        self.status().direction
    }

    pub fn destinations(&self) -> Vec<Request> {
        self.status().destinations
    }

    // Waits for the car's thread to exit and returns its final status
    pub fn join(self) -> thread::Result<CarStatus> {
        self.thread.join()?;
        let status = self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(status.clone())
    }
}
