//! APRS object report encoding (APRS101 chapter 11).
//!
//! Only two reports are ever produced: a live object carrying a position and
//! a killed object that removes it from the map. Both share the APRS-IS
//! envelope `CALL>APRS,TCPIP*:`.
//!
//! ```text
//! N0CALL>APRS,TCPIP*:;DOG      *191423z5321.00N/00615.62Wrwoof
//! N0CALL>APRS,TCPIP*:;DOG      _191425z
//! ```

use chrono::{DateTime, Utc};

use crate::config::constants::{
    APRS_DESTINATION, APRS_IS_PATH, DEFAULT_SYMBOL, DEFAULT_SYMBOL_TABLE, KILLED_OBJECT_MARKER,
    LIVE_OBJECT_MARKER, OBJECT_DATA_TYPE, OBJECT_NAME_LEN, ZULU_TIMESTAMP_FORMAT,
};
use crate::models::coordinate::{Coordinate, ObjectIdentity};

/// Symbol table identifier and symbol code selecting the map icon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Symbol {
    pub table: char,
    pub code: char,
}

impl Symbol {
    pub fn new(table: char, code: char) -> Self {
        Self { table, code }
    }
}

impl Default for Symbol {
    fn default() -> Self {
        Self::new(DEFAULT_SYMBOL_TABLE, DEFAULT_SYMBOL)
    }
}

/// Latitude as `DDmm.mmN` / `DDmm.mmS`.
pub fn format_latitude(lat: f64) -> String {
    let hemisphere = if lat >= 0.0 { 'N' } else { 'S' };
    let (degrees, minutes) = split_degrees(lat);
    format!("{:02}{:05.2}{}", degrees, minutes, hemisphere)
}

/// Longitude as `DDDmm.mmE` / `DDDmm.mmW`.
pub fn format_longitude(lon: f64) -> String {
    let hemisphere = if lon >= 0.0 { 'E' } else { 'W' };
    let (degrees, minutes) = split_degrees(lon);
    format!("{:03}{:05.2}{}", degrees, minutes, hemisphere)
}

fn split_degrees(value: f64) -> (u32, f64) {
    let value = value.abs();
    let degrees = value.trunc();
    (degrees as u32, (value - degrees) * 60.0)
}

/// Object names are always exactly nine characters on the wire.
pub fn pad_object_name(name: &str) -> String {
    let truncated: String = name.chars().take(OBJECT_NAME_LEN).collect();
    format!("{:<width$}", truncated, width = OBJECT_NAME_LEN)
}

/// Day, hour and minute in UTC followed by `z`.
pub fn zulu_timestamp(now: &DateTime<Utc>) -> String {
    now.format(ZULU_TIMESTAMP_FORMAT).to_string()
}

fn envelope(callsign: &str, body: &str) -> String {
    format!("{}>{},{}:{}", callsign, APRS_DESTINATION, APRS_IS_PATH, body)
}

/// Live object report stamped with the current UTC time.
pub fn position_packet(
    identity: &ObjectIdentity,
    position: &Coordinate,
    symbol: Symbol,
    comment: &str,
) -> String {
    position_packet_at(identity, position, symbol, comment, &Utc::now())
}

pub fn position_packet_at(
    identity: &ObjectIdentity,
    position: &Coordinate,
    symbol: Symbol,
    comment: &str,
    now: &DateTime<Utc>,
) -> String {
    let body = format!(
        "{}{}{}{}{}{}{}{}{}",
        OBJECT_DATA_TYPE,
        pad_object_name(&identity.name),
        LIVE_OBJECT_MARKER,
        zulu_timestamp(now),
        format_latitude(position.lat),
        symbol.table,
        format_longitude(position.lon),
        symbol.code,
        comment,
    );
    envelope(&identity.callsign, &body)
}

/// Killed object report stamped with the current UTC time.
pub fn kill_packet(identity: &ObjectIdentity) -> String {
    kill_packet_at(identity, &Utc::now())
}

pub fn kill_packet_at(identity: &ObjectIdentity, now: &DateTime<Utc>) -> String {
    let body = format!(
        "{}{}{}{}",
        OBJECT_DATA_TYPE,
        pad_object_name(&identity.name),
        KILLED_OBJECT_MARKER,
        zulu_timestamp(now),
    );
    envelope(&identity.callsign, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 42).unwrap()
    }

    #[test]
    fn test_format_latitude() {
        assert_eq!(format_latitude(49.0583333), "4903.50N");
        assert_eq!(format_latitude(-33.8675), "3352.05S");
        assert_eq!(format_latitude(0.0), "0000.00N");
        assert_eq!(format_latitude(5.5), "0530.00N");
    }

    #[test]
    fn test_format_longitude() {
        assert_eq!(format_longitude(-72.0291667), "07201.75W");
        assert_eq!(format_longitude(151.2070), "15112.42E");
        assert_eq!(format_longitude(0.0), "00000.00E");
        assert_eq!(format_longitude(-0.5), "00030.00W");
    }

    #[test]
    fn test_pad_object_name() {
        assert_eq!(pad_object_name("FOO"), "FOO      ");
        assert_eq!(pad_object_name("ABCDEFGHI"), "ABCDEFGHI");
        assert_eq!(pad_object_name("ABCDEFGHIJK"), "ABCDEFGHI");
        assert_eq!(pad_object_name(""), "         ");
        for name in ["a", "abcd", "abcdefghijklmnop"] {
            assert_eq!(pad_object_name(name).chars().count(), OBJECT_NAME_LEN);
        }
    }

    #[test]
    fn test_zulu_timestamp() {
        assert_eq!(zulu_timestamp(&fixed_time()), "070905z");
    }

    #[test]
    fn test_position_packet_layout() {
        let identity = ObjectIdentity::new("N0CALL", "DOG");
        let packet = position_packet_at(
            &identity,
            &Coordinate::new(49.0583333, -72.0291667),
            Symbol::new('/', 'r'),
            "woof",
            &fixed_time(),
        );
        assert_eq!(packet, "N0CALL>APRS,TCPIP*:;DOG      *070905z4903.50N/07201.75Wrwoof");
    }

    #[test]
    fn test_long_name_truncated_in_every_packet() {
        let identity = ObjectIdentity::new("N0CALL", "ABCDEFGHIJK");
        let position = position_packet(&identity, &Coordinate::new(0.0, 0.0), Symbol::default(), "");
        let kill = kill_packet(&identity);
        for packet in [position, kill] {
            let body = packet.split_once(':').unwrap().1;
            assert_eq!(&body[1..10], "ABCDEFGHI");
            assert!(!body.contains('J'));
        }
    }

    #[test]
    fn test_kill_packet_layout() {
        let identity = ObjectIdentity::new("N0CALL", "FOO");
        let packet = kill_packet_at(&identity, &fixed_time());
        assert_eq!(packet, "N0CALL>APRS,TCPIP*:;FOO      _070905z");

        let body = packet.split_once(':').unwrap().1;
        assert_eq!(body.chars().nth(10), Some('_'));
        assert!(!body.contains('N') && !body.contains('E'));
    }

    #[test]
    fn test_live_timestamp_shape() {
        let identity = ObjectIdentity::new("N0CALL", "FOO");
        let packet = kill_packet(&identity);
        let stamp = &packet[packet.len() - 7..];
        assert!(stamp.ends_with('z'));
        assert!(stamp[..6].chars().all(|c| c.is_ascii_digit()));
    }
}
