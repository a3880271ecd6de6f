use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::config::constants::*;
use crate::core::runner::BeaconSettings;
use crate::data::track_loader::{load_gpx_waypoints, TrackLoadError};
use crate::models::coordinate::{Coordinate, ObjectIdentity};
use crate::protocol::packet::Symbol;
use crate::transport::aprs_is::AprsIsSettings;
use crate::utils::logging::{self, FileIOType, OperationCategory};

#[derive(Debug)]
pub enum ConfigError {
    NotFound(PathBuf),
    IoError(std::io::Error),
    YamlError(serde_yaml::Error),
    MissingSection(&'static str),
    MissingField(&'static str),
    NameTooLong(String),
    InvalidValue { field: &'static str, value: String },
    InvalidWaypoint(usize),
    NoRouteSource,
    Track(TrackLoadError),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::YamlError(err)
    }
}

impl From<TrackLoadError> for ConfigError {
    fn from(err: TrackLoadError) -> Self {
        ConfigError::Track(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(p) => write!(f, "Config file not found: {}", p.display()),
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::YamlError(e) => write!(f, "YAML error: {}", e),
            ConfigError::MissingSection(s) => write!(f, "Missing config section: {}", s),
            ConfigError::MissingField(s) => write!(f, "{} is required", s),
            ConfigError::NameTooLong(name) => write!(
                f,
                "object.name must be {} characters or fewer, got '{}'",
                OBJECT_NAME_LEN, name
            ),
            ConfigError::InvalidValue { field, value } => write!(f, "Invalid {}: {}", field, value),
            ConfigError::InvalidWaypoint(i) => write!(f, "route.waypoints[{}] must be [lat, lon]", i),
            ConfigError::NoRouteSource => write!(f, "route.waypoints or route.gpx_file is required"),
            ConfigError::Track(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

// Raw file layout. Every section is optional here so that a missing one
// can be reported by name.

#[derive(Debug, Deserialize)]
struct RawConfig {
    aprs_is: Option<RawAprsIs>,
    object: Option<RawObject>,
    movement: Option<RawMovement>,
    route: Option<RawRoute>,
}

/// YAML reads an all-digit passcode as a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Passcode {
    Number(i64),
    Text(String),
}

impl Passcode {
    fn into_string(self) -> String {
        match self {
            Passcode::Number(n) => n.to_string(),
            Passcode::Text(s) => s,
        }
    }
}

fn default_host() -> String {
    DEFAULT_APRS_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_APRS_PORT
}

#[derive(Debug, Deserialize)]
struct RawAprsIs {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    callsign: Option<String>,
    passcode: Option<Passcode>,
}

fn default_symbol_table() -> char {
    DEFAULT_SYMBOL_TABLE
}

fn default_symbol() -> char {
    DEFAULT_SYMBOL
}

#[derive(Debug, Deserialize)]
struct RawObject {
    name: Option<String>,
    #[serde(default = "default_symbol_table")]
    symbol_table: char,
    #[serde(default = "default_symbol")]
    symbol: char,
    #[serde(default)]
    comment: String,
    comments: Option<Vec<String>>,
}

fn default_speed() -> f64 {
    DEFAULT_SPEED_KMH
}

fn default_interval() -> u64 {
    DEFAULT_BEACON_INTERVAL_SECS
}

fn default_loop() -> bool {
    DEFAULT_LOOP
}

#[derive(Debug, Deserialize)]
struct RawMovement {
    #[serde(default = "default_speed")]
    speed_kmh: f64,
    #[serde(default = "default_interval")]
    beacon_interval: u64,
    #[serde(default = "default_loop", rename = "loop")]
    looping: bool,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    waypoints: Option<Vec<Vec<f64>>>,
    gpx_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSettings {
    pub name: String,
    pub symbol: Symbol,
    /// Never empty; a single `comment` becomes a one-element list.
    pub comments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovementSettings {
    pub speed_kmh: f64,
    pub beacon_interval_secs: u64,
    pub looping: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteSource {
    Waypoints,
    GpxFile(PathBuf),
}

/// Validated configuration, ready to drive a run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub aprs_is: AprsIsSettings,
    pub object: ObjectSettings,
    pub movement: MovementSettings,
    pub route_source: RouteSource,
    pub waypoints: Vec<Coordinate>,
}

impl RunnerConfig {
    pub fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::new(self.aprs_is.callsign.clone(), self.object.name.clone())
    }

    pub fn beacon_settings(&self) -> BeaconSettings {
        BeaconSettings {
            speed_kmh: self.movement.speed_kmh,
            beacon_interval_secs: self.movement.beacon_interval_secs,
            looping: self.movement.looping,
            symbol: self.object.symbol,
            comments: self.object.comments.clone(),
        }
    }
}

/// Load a YAML config, applying `APRS_CALLSIGN` / `APRS_PASSCODE` overrides
/// from the process environment.
pub fn load_config(path: &Path) -> Result<RunnerConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

pub fn load_config_with_env<F>(path: &Path, env: F) -> Result<RunnerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let _timing = logging::start_timing("load_config",
        OperationCategory::FileIO { subcategory: FileIOType::ConfigLoad });

    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let contents = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    parse_config(&contents, base_dir, env)
}

/// Parse and validate config text. A relative `route.gpx_file` is resolved
/// against `base_dir`.
pub fn parse_config<F>(contents: &str, base_dir: &Path, env: F) -> Result<RunnerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw: RawConfig = serde_yaml::from_str(contents)?;

    let aprs = raw.aprs_is.ok_or(ConfigError::MissingSection("aprs_is"))?;
    let object = raw.object.ok_or(ConfigError::MissingSection("object"))?;
    let movement = raw.movement.ok_or(ConfigError::MissingSection("movement"))?;
    let route = raw.route.ok_or(ConfigError::MissingSection("route"))?;

    let aprs_is = validate_aprs_is(aprs, &env)?;
    let object = validate_object(object)?;
    let movement = validate_movement(movement)?;
    let (route_source, waypoints) = resolve_route(route, base_dir)?;

    debug!(
        "Config: {} as {} at {:.1} km/h every {}s, {} waypoints",
        object.name, aprs_is.callsign, movement.speed_kmh, movement.beacon_interval_secs, waypoints.len()
    );

    Ok(RunnerConfig {
        aprs_is,
        object,
        movement,
        route_source,
        waypoints,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn validate_aprs_is<F>(raw: RawAprsIs, env: &F) -> Result<AprsIsSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let callsign = non_empty(env(CALLSIGN_ENV))
        .or_else(|| non_empty(raw.callsign))
        .ok_or(ConfigError::MissingField("aprs_is.callsign"))?;
    let passcode = non_empty(env(PASSCODE_ENV))
        .or_else(|| non_empty(raw.passcode.map(Passcode::into_string)))
        .ok_or(ConfigError::MissingField("aprs_is.passcode"))?;

    Ok(AprsIsSettings {
        host: raw.host,
        port: raw.port,
        callsign,
        passcode,
    })
}

fn validate_object(raw: RawObject) -> Result<ObjectSettings, ConfigError> {
    let name = non_empty(raw.name).ok_or(ConfigError::MissingField("object.name"))?;
    if name.chars().count() > OBJECT_NAME_LEN {
        return Err(ConfigError::NameTooLong(name));
    }

    let comments = match raw.comments {
        Some(list) if !list.is_empty() => list,
        _ => vec![raw.comment],
    };

    Ok(ObjectSettings {
        name,
        symbol: Symbol::new(raw.symbol_table, raw.symbol),
        comments,
    })
}

fn validate_movement(raw: RawMovement) -> Result<MovementSettings, ConfigError> {
    if !raw.speed_kmh.is_finite() || raw.speed_kmh < 0.0 {
        return Err(ConfigError::InvalidValue {
            field: "movement.speed_kmh",
            value: raw.speed_kmh.to_string(),
        });
    }
    if raw.beacon_interval == 0 {
        return Err(ConfigError::InvalidValue {
            field: "movement.beacon_interval",
            value: "0".to_string(),
        });
    }

    Ok(MovementSettings {
        speed_kmh: raw.speed_kmh,
        beacon_interval_secs: raw.beacon_interval,
        looping: raw.looping,
    })
}

fn resolve_route(raw: RawRoute, base_dir: &Path) -> Result<(RouteSource, Vec<Coordinate>), ConfigError> {
    if let Some(gpx_file) = non_empty(raw.gpx_file) {
        let gpx_path = PathBuf::from(&gpx_file);
        let gpx_path = if gpx_path.is_absolute() {
            gpx_path
        } else {
            base_dir.join(gpx_path)
        };
        let points = load_gpx_waypoints(&gpx_path)?;
        return Ok((RouteSource::GpxFile(gpx_path), points));
    }

    match raw.waypoints {
        Some(list) if !list.is_empty() => {
            let points = list
                .iter()
                .enumerate()
                .map(|(i, pt)| match pt.as_slice() {
                    [lat, lon, ..] => Ok(Coordinate::new(*lat, *lon)),
                    _ => Err(ConfigError::InvalidWaypoint(i)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((RouteSource::Waypoints, points))
        }
        _ => Err(ConfigError::NoRouteSource),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
aprs_is:
  callsign: N0CALL-10
  passcode: 12345
object:
  name: DOG
movement: {}
route:
  waypoints:
    - [53.35, -6.26]
    - [53.27, -9.06]
"#;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse_config(MINIMAL, Path::new("."), no_env).unwrap();
        assert_eq!(config.aprs_is.host, "rotate.aprs2.net");
        assert_eq!(config.aprs_is.port, 14580);
        assert_eq!(config.aprs_is.callsign, "N0CALL-10");
        assert_eq!(config.aprs_is.passcode, "12345");
        assert_eq!(config.object.symbol, Symbol::new('/', 'r'));
        assert_eq!(config.object.comments, vec![String::new()]);
        assert_eq!(config.movement.speed_kmh, 25.0);
        assert_eq!(config.movement.beacon_interval_secs, 120);
        assert!(config.movement.looping);
        assert_eq!(config.route_source, RouteSource::Waypoints);
        assert_eq!(config.waypoints.len(), 2);
    }

    #[test]
    fn test_explicit_values() {
        let text = r#"
aprs_is:
  host: euro.aprs2.net
  port: 10152
  callsign: N0CALL
  passcode: "-1"
object:
  name: ROVER
  symbol_table: "\\"
  symbol: ">"
  comment: ignored
  comments: [one, two]
movement:
  speed_kmh: 60.5
  beacon_interval: 30
  loop: false
route:
  waypoints: [[1.0, 2.0, 100.0], [3.0, 4.0]]
"#;
        let config = parse_config(text, Path::new("."), no_env).unwrap();
        assert_eq!(config.aprs_is.host, "euro.aprs2.net");
        assert_eq!(config.aprs_is.port, 10152);
        assert_eq!(config.aprs_is.passcode, "-1");
        assert_eq!(config.object.symbol, Symbol::new('\\', '>'));
        assert_eq!(config.object.comments, vec!["one".to_string(), "two".to_string()]);
        assert_eq!(config.movement.speed_kmh, 60.5);
        assert_eq!(config.movement.beacon_interval_secs, 30);
        assert!(!config.movement.looping);
        assert_eq!(config.waypoints, vec![Coordinate::new(1.0, 2.0), Coordinate::new(3.0, 4.0)]);

        let settings = config.beacon_settings();
        assert!((settings.distance_per_tick() - 60.5 * 30.0 / 3600.0).abs() < 1e-12);
        assert_eq!(config.identity(), ObjectIdentity::new("N0CALL", "ROVER"));
    }

    #[test]
    fn test_empty_comments_fall_back_to_comment() {
        let text = MINIMAL.replace("  name: DOG\n", "  name: DOG\n  comment: x\n  comments: []\n");
        let config = parse_config(&text, Path::new("."), no_env).unwrap();
        assert_eq!(config.object.comments, vec!["x".to_string()]);
    }

    #[test]
    fn test_environment_overrides() {
        let env = |key: &str| match key {
            "APRS_CALLSIGN" => Some("ENV0CALL".to_string()),
            "APRS_PASSCODE" => Some("999".to_string()),
            _ => None,
        };
        let config = parse_config(MINIMAL, Path::new("."), env).unwrap();
        assert_eq!(config.aprs_is.callsign, "ENV0CALL");
        assert_eq!(config.aprs_is.passcode, "999");
    }

    #[test]
    fn test_environment_supplies_missing_credentials() {
        let text = MINIMAL.replace("  callsign: N0CALL-10\n  passcode: 12345\n", "  host: example.net\n");
        assert!(matches!(
            parse_config(&text, Path::new("."), no_env),
            Err(ConfigError::MissingField("aprs_is.callsign"))
        ));

        let env = |key: &str| Some(format!("{}-value", key));
        let config = parse_config(&text, Path::new("."), env).unwrap();
        assert_eq!(config.aprs_is.callsign, "APRS_CALLSIGN-value");
    }

    fn without_section(section: &str) -> String {
        let mut out = Vec::new();
        let mut skipping = false;
        for line in MINIMAL.lines() {
            if line.starts_with(section) {
                skipping = true;
                continue;
            }
            if skipping && line.starts_with(' ') {
                continue;
            }
            skipping = false;
            out.push(line);
        }
        out.join("\n")
    }

    #[test]
    fn test_missing_sections() {
        for section in ["aprs_is", "object", "movement", "route"] {
            let text = without_section(section);
            match parse_config(&text, Path::new("."), no_env) {
                Err(ConfigError::MissingSection(s)) => assert_eq!(s, section),
                other => panic!("{}: expected missing section, got {:?}", section, other.err()),
            }
        }
    }

    #[test]
    fn test_name_rules() {
        let long = MINIMAL.replace("name: DOG", "name: ABCDEFGHIJK");
        assert!(matches!(parse_config(&long, Path::new("."), no_env), Err(ConfigError::NameTooLong(_))));

        let nine = MINIMAL.replace("name: DOG", "name: ABCDEFGHI");
        assert!(parse_config(&nine, Path::new("."), no_env).is_ok());

        let missing = MINIMAL.replace("  name: DOG\n", "  symbol: r\n");
        assert!(matches!(
            parse_config(&missing, Path::new("."), no_env),
            Err(ConfigError::MissingField("object.name"))
        ));
    }

    #[test]
    fn test_route_source_required() {
        let text = MINIMAL.replace(
            "  waypoints:\n    - [53.35, -6.26]\n    - [53.27, -9.06]\n",
            "  waypoints: []\n",
        );
        assert!(matches!(parse_config(&text, Path::new("."), no_env), Err(ConfigError::NoRouteSource)));
    }

    #[test]
    fn test_short_waypoint_rejected() {
        let text = MINIMAL.replace("- [53.27, -9.06]", "- [53.27]");
        assert!(matches!(parse_config(&text, Path::new("."), no_env), Err(ConfigError::InvalidWaypoint(1))));
    }

    #[test]
    fn test_invalid_movement() {
        let text = MINIMAL.replace("movement: {}", "movement: {speed_kmh: -1.0}");
        assert!(matches!(parse_config(&text, Path::new("."), no_env), Err(ConfigError::InvalidValue { .. })));

        let text = MINIMAL.replace("movement: {}", "movement: {beacon_interval: 0}");
        assert!(matches!(parse_config(&text, Path::new("."), no_env), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_gpx_path_resolved_against_config_dir() {
        let dir = std::env::temp_dir().join(format!("aprsrunner-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("walk.gpx"),
            r#"<?xml version="1.0"?>
<gpx version="1.1" creator="t" xmlns="http://www.topografix.com/GPX/1/1"><trk><trkseg>
<trkpt lat="1.0" lon="1.0"></trkpt><trkpt lat="2.0" lon="2.0"></trkpt>
</trkseg></trk></gpx>"#,
        )
        .unwrap();

        let text = MINIMAL.replace(
            "  waypoints:\n    - [53.35, -6.26]\n    - [53.27, -9.06]\n",
            "  gpx_file: walk.gpx\n  waypoints: [[9.0, 9.0], [8.0, 8.0]]\n",
        );
        let config_path = dir.join("config.yaml");
        fs::write(&config_path, text).unwrap();

        let config = load_config_with_env(&config_path, no_env).unwrap();
        assert_eq!(config.route_source, RouteSource::GpxFile(dir.join("walk.gpx")));
        assert_eq!(config.waypoints, vec![Coordinate::new(1.0, 1.0), Coordinate::new(2.0, 2.0)]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("aprsrunner-no-such-config.yaml");
        assert!(matches!(load_config_with_env(&path, no_env), Err(ConfigError::NotFound(_))));
    }
}
