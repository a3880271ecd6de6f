// Geodesy Constants
pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const ANGULAR_EPSILON: f64 = 1e-12;          // Radians, coincident endpoints
pub const SEGMENT_EPSILON_KM: f64 = 1e-12;       // Zero-length route segments

// APRS Object Format
pub const OBJECT_NAME_LEN: usize = 9;
pub const LIVE_OBJECT_MARKER: char = '*';
pub const KILLED_OBJECT_MARKER: char = '_';
pub const OBJECT_DATA_TYPE: char = ';';
pub const APRS_DESTINATION: &str = "APRS";
pub const APRS_IS_PATH: &str = "TCPIP*";
pub const ZULU_TIMESTAMP_FORMAT: &str = "%d%H%Mz";

// APRS-IS Defaults
pub const DEFAULT_APRS_HOST: &str = "rotate.aprs2.net";
pub const DEFAULT_APRS_PORT: u16 = 14580;
pub const CONNECT_TIMEOUT_SECS: u64 = 30;
pub const SOFTWARE_NAME: &str = "aprsrunner";
pub const SOFTWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

// Environment Overrides
pub const CALLSIGN_ENV: &str = "APRS_CALLSIGN";
pub const PASSCODE_ENV: &str = "APRS_PASSCODE";

// Object Defaults
pub const DEFAULT_SYMBOL_TABLE: char = '/';
pub const DEFAULT_SYMBOL: char = 'r';

// Movement Defaults
pub const DEFAULT_SPEED_KMH: f64 = 25.0;
pub const DEFAULT_BEACON_INTERVAL_SECS: u64 = 120;
pub const DEFAULT_LOOP: bool = true;
pub const SECONDS_PER_HOUR: f64 = 3600.0;

// CLI Defaults
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
