use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::models::coordinate::Coordinate;
use crate::utils::logging::{self, FileIOType, OperationCategory};

#[derive(Debug)]
pub enum TrackLoadError {
    NotFound(PathBuf),
    IoError(std::io::Error),
    ParseError(String),
    NoPoints(PathBuf),
}

impl From<std::io::Error> for TrackLoadError {
    fn from(err: std::io::Error) -> Self {
        TrackLoadError::IoError(err)
    }
}

impl std::fmt::Display for TrackLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackLoadError::NotFound(p) => write!(f, "GPX file not found: {}", p.display()),
            TrackLoadError::IoError(e) => write!(f, "IO error: {}", e),
            TrackLoadError::ParseError(s) => write!(f, "Invalid GPX: {}", s),
            TrackLoadError::NoPoints(p) => write!(f, "No points found in GPX file: {}", p.display()),
        }
    }
}

impl std::error::Error for TrackLoadError {}

fn to_coordinate(waypoint: &gpx::Waypoint) -> Coordinate {
    let point = waypoint.point();
    Coordinate::new(point.y(), point.x())
}

/// Ordered points from a GPX file. Routes are preferred, then track
/// segments, then standalone waypoints; the first kind with any points wins.
pub fn load_gpx_waypoints(path: &Path) -> Result<Vec<Coordinate>, TrackLoadError> {
    let _timing = logging::start_timing("load_gpx_waypoints",
        OperationCategory::FileIO { subcategory: FileIOType::TrackLoad });

    if !path.exists() {
        return Err(TrackLoadError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let gpx = gpx::read(BufReader::new(file))
        .map_err(|e| TrackLoadError::ParseError(e.to_string()))?;

    let points: Vec<Coordinate> = gpx.routes.iter()
        .flat_map(|route| route.points.iter())
        .map(to_coordinate)
        .collect();
    if !points.is_empty() {
        info!("Loaded {} points from GPX routes", points.len());
        return Ok(points);
    }

    let points: Vec<Coordinate> = gpx.tracks.iter()
        .flat_map(|track| track.segments.iter())
        .flat_map(|segment| segment.points.iter())
        .map(to_coordinate)
        .collect();
    if !points.is_empty() {
        info!("Loaded {} points from GPX tracks", points.len());
        return Ok(points);
    }

    let points: Vec<Coordinate> = gpx.waypoints.iter().map(to_coordinate).collect();
    if !points.is_empty() {
        info!("Loaded {} points from GPX waypoints", points.len());
        return Ok(points);
    }

    Err(TrackLoadError::NoPoints(path.to_path_buf()))
}
