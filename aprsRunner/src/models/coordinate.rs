use serde::{Deserialize, Serialize};

/// A point on the globe in decimal degrees. Ranges are not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// The originator and object name under which beacons are sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectIdentity {
    pub callsign: String,
    pub name: String,
}

impl ObjectIdentity {
    pub fn new(callsign: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            callsign: callsign.into(),
            name: name.into(),
        }
    }
}
