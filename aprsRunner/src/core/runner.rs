//! Beacon state machine.
//!
//! A run moves through `Idle -> Connected -> Running -> ShuttingDown ->
//! Terminated`. Once the transport is connected, the shutdown phase always
//! runs exactly once: it sends the kill packet, closes the session and
//! stores the final distance, whether the loop finished the route, was
//! cancelled, or stopped on a send or save error.

use std::thread;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::constants::SECONDS_PER_HOUR;
use crate::core::cancellation::CancellationToken;
use crate::data::state_store::StateError;
use crate::geo::route::Route;
use crate::models::coordinate::ObjectIdentity;
use crate::protocol::packet::{self, Symbol};
use crate::transport::error::{TransportError, TransportResult};
use crate::utils::logging::{self, BeaconStage, NetworkOp, OperationCategory};
use crate::utils::traits::{StateStore, Transport};

/// Kilometres covered between two beacons.
pub fn distance_per_tick(speed_kmh: f64, beacon_interval_secs: u64) -> f64 {
    speed_kmh * (beacon_interval_secs as f64 / SECONDS_PER_HOUR)
}

/// How the object moves and what each beacon says about it.
#[derive(Debug, Clone)]
pub struct BeaconSettings {
    pub speed_kmh: f64,
    pub beacon_interval_secs: u64,
    pub looping: bool,
    pub symbol: Symbol,
    pub comments: Vec<String>,
}

impl BeaconSettings {
    pub fn distance_per_tick(&self) -> f64 {
        distance_per_tick(self.speed_kmh, self.beacon_interval_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Connected,
    Running,
    ShuttingDown,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickOutcome {
    Continue,
    RouteFinished,
}

#[derive(Debug)]
pub enum RunnerError {
    /// The session could not be opened; nothing was sent.
    Connect(TransportError),
    /// A position report failed to send. The kill packet was still attempted.
    Transmission(TransportError),
    /// Progress could not be stored. The kill packet was still attempted.
    State(StateError),
}

impl std::fmt::Display for RunnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunnerError::Connect(e) => write!(f, "Connection failed: {}", e),
            RunnerError::Transmission(e) => write!(f, "Beacon transmission failed: {}", e),
            RunnerError::State(e) => write!(f, "Failed to save state: {}", e),
        }
    }
}

impl std::error::Error for RunnerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunnerError::Connect(e) | RunnerError::Transmission(e) => Some(e),
            RunnerError::State(e) => Some(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub beacons_sent: u64,
    pub laps_completed: u64,
    pub cancelled: bool,
}

pub struct BeaconRunner<T: Transport, S: StateStore, R: Rng> {
    route: Route,
    identity: ObjectIdentity,
    settings: BeaconSettings,
    transport: T,
    store: S,
    rng: R,
    cancellation: CancellationToken,
    wait_slice: Duration,
    state: RunnerState,
    current_distance: f64,
    beacons_sent: u64,
    laps_completed: u64,
}

impl<T: Transport, S: StateStore, R: Rng> BeaconRunner<T, S, R> {
    pub fn new(
        route: Route,
        identity: ObjectIdentity,
        settings: BeaconSettings,
        transport: T,
        store: S,
        rng: R,
    ) -> Self {
        Self {
            route,
            identity,
            settings,
            transport,
            store,
            rng,
            cancellation: CancellationToken::new(),
            wait_slice: Duration::from_secs(1),
            state: RunnerState::Idle,
            current_distance: 0.0,
            beacons_sent: 0,
            laps_completed: 0,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Length of each slice of the inter-beacon wait. A wait lasts
    /// `beacon_interval_secs` slices.
    pub fn with_wait_slice(mut self, slice: Duration) -> Self {
        self.wait_slice = slice;
        self
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Progress along the route, clamped to the route's length.
    pub fn current_distance(&self) -> f64 {
        self.current_distance.max(0.0).min(self.route.total_distance())
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn run(&mut self) -> Result<RunSummary, RunnerError> {
        self.resume();

        {
            let _timing = logging::start_timing("connect",
                OperationCategory::Network { subcategory: NetworkOp::Connect });
            self.transport.connect().map_err(RunnerError::Connect)?;
        }
        self.state = RunnerState::Connected;

        let outcome = self.beacon_loop();
        if let Err(e) = &outcome {
            warn!("Stopping beacon loop: {}", e);
        }

        self.shutdown();

        outcome?;
        Ok(RunSummary {
            beacons_sent: self.beacons_sent,
            laps_completed: self.laps_completed,
            cancelled: self.cancellation.is_cancelled(),
        })
    }

    /// Pick up where a previous run stopped. Unreadable state and progress
    /// at or past the end of the route both start from zero.
    fn resume(&mut self) {
        let total = self.route.total_distance();
        self.current_distance = match self.store.load() {
            Ok(distance) if distance.is_finite() && distance >= 0.0 && distance < total => {
                info!("Resumed from state file: {:.2} km", distance);
                distance
            }
            Ok(distance) => {
                debug!("Stored distance {:.2} km is outside the route, starting over", distance);
                0.0
            }
            Err(e) => {
                debug!("No usable state ({}), starting at 0 km", e);
                0.0
            }
        };
    }

    fn beacon_loop(&mut self) -> Result<(), RunnerError> {
        self.state = RunnerState::Running;

        while !self.cancellation.is_cancelled() {
            if self.tick().map_err(RunnerError::Transmission)? == TickOutcome::RouteFinished {
                break;
            }
            self.persist().map_err(RunnerError::State)?;
            self.wait_for_next_beacon();
        }

        Ok(())
    }

    fn tick(&mut self) -> TransportResult<TickOutcome> {
        let _timing = logging::start_timing("tick",
            OperationCategory::Beacon { subcategory: BeaconStage::Tick });

        let position = self.route.position_at_distance(self.current_distance);
        let comment = self
            .settings
            .comments
            .choose(&mut self.rng)
            .map(String::as_str)
            .unwrap_or("");
        let packet = packet::position_packet(&self.identity, &position, self.settings.symbol, comment);

        info!(
            "Distance: {:.2}/{:.2} km | Position: {:.5}, {:.5}",
            self.current_distance,
            self.route.total_distance(),
            position.lat,
            position.lon
        );
        debug!("Packet: {}", packet);

        {
            let _timing = logging::start_timing("send_beacon",
                OperationCategory::Network { subcategory: NetworkOp::Send });
            self.transport.send(&packet)?;
        }
        self.beacons_sent += 1;
        info!("Beacon sent");

        Ok(self.advance())
    }

    fn advance(&mut self) -> TickOutcome {
        self.current_distance += self.settings.distance_per_tick();

        if self.current_distance >= self.route.total_distance() {
            self.laps_completed += 1;
            if self.settings.looping {
                self.current_distance = 0.0;
                info!("Route complete, looping...");
            } else {
                info!("Route complete, stopping");
                return TickOutcome::RouteFinished;
            }
        }

        TickOutcome::Continue
    }

    fn persist(&mut self) -> Result<(), StateError> {
        self.store.save(self.current_distance)
    }

    fn wait_for_next_beacon(&self) {
        debug!("Sleeping {} seconds...", self.settings.beacon_interval_secs);
        for _ in 0..self.settings.beacon_interval_secs {
            if self.cancellation.is_cancelled() {
                break;
            }
            thread::sleep(self.wait_slice);
        }
    }

    fn shutdown(&mut self) {
        let _timing = logging::start_timing("shutdown",
            OperationCategory::Beacon { subcategory: BeaconStage::Shutdown });
        self.state = RunnerState::ShuttingDown;

        if self.cancellation.is_cancelled() {
            info!("Shutdown requested");
        }

        let kill = packet::kill_packet(&self.identity);
        info!("Sending kill packet to remove object from map");
        debug!("Kill packet: {}", kill);
        if let Err(e) = self.transport.send(&kill) {
            warn!("Failed to send kill packet: {}", e);
        }
        self.transport.close();

        // Kept so a restart resumes the route instead of starting over.
        if let Err(e) = self.persist() {
            warn!("Failed to save final state: {}", e);
        }

        self.state = RunnerState::Terminated;
        info!("Done");
    }
}
