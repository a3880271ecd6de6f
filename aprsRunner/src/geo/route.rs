//! Ordered waypoint path with distance-based positioning.

use tracing::info;

use crate::config::constants::SEGMENT_EPSILON_KM;
use crate::geo::great_circle;
use crate::models::coordinate::Coordinate;

#[derive(Debug, Clone, PartialEq)]
pub enum RouteError {
    TooFewWaypoints { found: usize },
}

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteError::TooFewWaypoints { found } => {
                write!(f, "Route needs at least 2 waypoints, got {}", found)
            }
        }
    }
}

impl std::error::Error for RouteError {}

/// A path through at least two waypoints with a precomputed table of
/// cumulative great-circle distances (km). `cumulative[0]` is always 0.
#[derive(Debug, Clone)]
pub struct Route {
    waypoints: Vec<Coordinate>,
    cumulative: Vec<f64>,
    total_distance: f64,
}

impl Route {
    pub fn new(waypoints: Vec<Coordinate>) -> Result<Self, RouteError> {
        if waypoints.len() < 2 {
            return Err(RouteError::TooFewWaypoints { found: waypoints.len() });
        }

        let mut cumulative = Vec::with_capacity(waypoints.len());
        cumulative.push(0.0);
        for pair in waypoints.windows(2) {
            let last = cumulative[cumulative.len() - 1];
            cumulative.push(last + great_circle::distance(&pair[0], &pair[1]));
        }
        let total_distance = cumulative[cumulative.len() - 1];

        info!("Route: {} waypoints, {:.2} km total", waypoints.len(), total_distance);

        Ok(Self {
            waypoints,
            cumulative,
            total_distance,
        })
    }

    pub fn waypoints(&self) -> &[Coordinate] {
        &self.waypoints
    }

    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Coordinate `km` along the route, clamped to the route's ends.
    ///
    /// A distance that lands exactly on a waypoint resolves to the earlier
    /// segment.
    pub fn position_at_distance(&self, km: f64) -> Coordinate {
        let km = km.max(0.0).min(self.total_distance);

        for i in 1..self.cumulative.len() {
            if km <= self.cumulative[i] {
                let seg_start = self.cumulative[i - 1];
                let seg_len = self.cumulative[i] - seg_start;
                if seg_len < SEGMENT_EPSILON_KM {
                    return self.waypoints[i];
                }
                let fraction = (km - seg_start) / seg_len;
                return great_circle::interpolate(&self.waypoints[i - 1], &self.waypoints[i], fraction);
            }
        }

        self.waypoints[self.waypoints.len() - 1]
    }
}
