/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::info;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use thiserror::Error;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{Direction, ElevatorStatistics, Request};

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("request {0} is already tracked by the registry")]
    DuplicateRequest(String),

    #[error("request {0} is not tracked by the registry")]
    UnknownRequest(String),

    #[error("request {0} is not pending")]
    NotPending(String),

    #[error("request {0} was never picked up")]
    NotPickedUp(String),

    #[error("request {0} is already completed")]
    AlreadyCompleted(String),
}

/**
 * Timing record for a single request.
 *
 * Only the registry creates and updates these. Callers get copies through
 * `RequestRegistry::stats_for`.
 *
 * # Fields
 * - `requested_at`:    When the request was added to the registry.
 * - `picked_up_at`:    When a car picked the rider up.
 * - `completed_at`:    When a car dropped the rider off.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestStats {
    pub requested_at: Instant,
    pub picked_up_at: Option<Instant>,
    pub completed_at: Option<Instant>,
}

impl RequestStats {
    fn new(requested_at: Instant) -> RequestStats {
        RequestStats {
            requested_at,
            picked_up_at: None,
            completed_at: None,
        }
    }

    // Whole seconds between request and pickup, 0 until picked up
    pub fn wait_secs(&self) -> u64 {
        match self.picked_up_at {
            Some(picked_up_at) => picked_up_at.saturating_duration_since(self.requested_at).as_secs(),
            None => 0,
        }
    }

    // Whole seconds between pickup and drop-off, 0 until completed
    pub fn trip_secs(&self) -> u64 {
        match (self.picked_up_at, self.completed_at) {
            (Some(picked_up_at), Some(completed_at)) => {
                completed_at.saturating_duration_since(picked_up_at).as_secs()
            }
            _ => 0,
        }
    }
}

/**
 * The registry's state, reachable only through the registry's lock.
 *
 * A car holds the guard returned by `RequestRegistry::lock` across its whole
 * drop-off, pickup and next-floor decision, calling these methods on it. The
 * `*_at` variants take the timestamp explicitly; the plain ones use `Instant::now()`.
 *
 * # Fields
 * - `pending`:     Requests not yet picked up, in arrival order.
 * - `completed`:   Requests dropped off, in completion order.
 * - `stats`:       Timing record for every request ever added, keyed by request id.
 */
#[derive(Debug, Default)]
pub struct RegistryState {
    pending: Vec<Request>,
    completed: Vec<Request>,
    stats: HashMap<String, RequestStats>,
}

impl RegistryState {
    pub fn add_request(&mut self, request: Request) -> Result<(), RegistryError> {
        self.add_request_at(request, Instant::now())
    }

    pub fn add_request_at(&mut self, request: Request, at: Instant) -> Result<(), RegistryError> {
        if self.stats.contains_key(request.id()) {
            return Err(RegistryError::DuplicateRequest(request.id().to_string()));
        }

        info!("Request added {}", request);
        self.stats.insert(request.id().to_string(), RequestStats::new(at));
        self.pending.push(request);
        Ok(())
    }

    pub fn get_request(&self, floor: i32) -> Option<Request> {
        self.pending.iter().find(|r| r.floor() == floor).cloned()
    }

    pub fn first_pending(&self) -> Option<&Request> {
        self.pending.first()
    }

    pub fn pending_requests(&self) -> Vec<Request> {
        self.pending.clone()
    }

    pub fn completed_requests(&self) -> Vec<Request> {
        self.completed.clone()
    }

    pub fn has_requests_for(&self, direction: Direction) -> bool {
        match direction {
            Direction::Idle => !self.pending.is_empty(),
            _ => self.pending.iter().any(|r| r.direction() == direction),
        }
    }

    pub fn stats_for(&self, id: &str) -> Option<RequestStats> {
        self.stats.get(id).copied()
    }

    // Requests added but not yet dropped off, whether pending or riding in a car
    pub fn in_flight_requests(&self) -> usize {
        self.stats.values().filter(|s| s.completed_at.is_none()).count()
    }

    pub fn request_serviced(&mut self, request: &Request) -> Result<(), RegistryError> {
        self.request_serviced_at(request, Instant::now())
    }

    pub fn request_serviced_at(&mut self, request: &Request, at: Instant) -> Result<(), RegistryError> {
        let index = self
            .pending
            .iter()
            .position(|r| r.id() == request.id())
            .ok_or_else(|| RegistryError::NotPending(request.id().to_string()))?;

        let stats = self
            .stats
            .get_mut(request.id())
            .ok_or_else(|| RegistryError::UnknownRequest(request.id().to_string()))?;

        stats.picked_up_at = Some(at);
        self.pending.remove(index);
        Ok(())
    }

    pub fn request_completed(&mut self, request: &Request) -> Result<ElevatorStatistics, RegistryError> {
        self.request_completed_at(request, Instant::now())
    }

    pub fn request_completed_at(
        &mut self,
        request: &Request,
        at: Instant,
    ) -> Result<ElevatorStatistics, RegistryError> {
        let stats = self
            .stats
            .get_mut(request.id())
            .ok_or_else(|| RegistryError::UnknownRequest(request.id().to_string()))?;

        if stats.picked_up_at.is_none() {
            return Err(RegistryError::NotPickedUp(request.id().to_string()));
        }
        if stats.completed_at.is_some() {
            return Err(RegistryError::AlreadyCompleted(request.id().to_string()));
        }

        stats.completed_at = Some(at);
        let (trip_secs, wait_secs) = (stats.trip_secs(), stats.wait_secs());
        self.completed.push(request.clone());

        info!("Trip Time: {}s", trip_secs);
        info!("Wait Time: {}s", wait_secs);

        let current = self.current_stats();
        info!(
            "Current Elevator Statistics\n  Average Wait Time: {}s\n  Average Trip Time: {}s",
            current.average_wait_secs, current.average_trip_secs
        );
        Ok(current)
    }

    pub fn current_stats(&self) -> ElevatorStatistics {
        let completed_requests = self.completed.len();
        if completed_requests == 0 {
            return ElevatorStatistics::default();
        }

        let (total_wait, total_trip) = self
            .completed
            .iter()
            .filter_map(|r| self.stats.get(r.id()))
            .fold((0u64, 0u64), |(wait, trip), stats| {
                (wait + stats.wait_secs(), trip + stats.trip_secs())
            });

        ElevatorStatistics {
            average_wait_secs: total_wait / completed_requests as u64,
            average_trip_secs: total_trip / completed_requests as u64,
            completed_requests,
        }
    }
}

/**
 * Tracks every request through its lifecycle for one bank of elevators.
 *
 * There is one registry per bank, shared by all cars and request producers
 * behind an `Arc`. It does not care how many cars service it. A request is
 * received (pending), serviced (picked up by a car) and completed (dropped
 * off at its destination).
 *
 * All state sits behind a single mutex. Each method below takes the lock for
 * its own duration; use `lock` when several operations must be atomic with a
 * decision. Never sleep while holding the guard.
 */
#[derive(Debug, Default)]
pub struct RequestRegistry {
    state: Mutex<RegistryState>,
}

impl RequestRegistry {
    pub fn new() -> RequestRegistry {
        RequestRegistry::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // Every operation leaves the state consistent, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_request(&self, request: Request) -> Result<(), RegistryError> {
        self.lock().add_request(request)
    }

    pub fn get_request(&self, floor: i32) -> Option<Request> {
        self.lock().get_request(floor)
    }

    pub fn pending_requests(&self) -> Vec<Request> {
        self.lock().pending_requests()
    }

    pub fn completed_requests(&self) -> Vec<Request> {
        self.lock().completed_requests()
    }

    pub fn has_requests_for(&self, direction: Direction) -> bool {
        self.lock().has_requests_for(direction)
    }

    pub fn stats_for(&self, id: &str) -> Option<RequestStats> {
        self.lock().stats_for(id)
    }

    pub fn in_flight_requests(&self) -> usize {
        self.lock().in_flight_requests()
    }

    pub fn request_serviced(&self, request: &Request) -> Result<(), RegistryError> {
        self.lock().request_serviced(request)
    }

    pub fn request_completed(&self, request: &Request) -> Result<ElevatorStatistics, RegistryError> {
        self.lock().request_completed(request)
    }

    pub fn current_stats(&self) -> ElevatorStatistics {
        self.lock().current_stats()
    }
}
