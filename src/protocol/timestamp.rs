//! ISO-8601 timestamps on the wire
//!
//! Written as RFC 3339 with microseconds and a `Z` suffix. Reads accept
//! any RFC 3339 offset, or a bare local time which is taken as UTC.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{de, Deserialize, Deserializer, Serializer};

use super::ProtocolError;

pub fn format(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse(text: &str) -> Result<DateTime<Utc>, ProtocolError> {
    match DateTime::parse_from_rfc3339(text) {
        Ok(time) => Ok(time.with_timezone(&Utc)),
        Err(_) => {
            let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")?;
            Ok(naive.and_utc())
        }
    }
}

pub fn serialize<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(time))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse(&text).map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn format_parse_round_trip() {
        let time = Utc.with_ymd_and_hms(2023, 3, 9, 17, 45, 2).unwrap() + Duration::microseconds(123_456);
        let text = format(&time);
        assert_eq!(text, "2023-03-09T17:45:02.123456Z");
        assert_eq!(parse(&text).unwrap(), time);
    }

    #[test]
    fn accepts_offsets_and_naive_times() {
        let utc = Utc.with_ymd_and_hms(2023, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(parse("2023-03-09T14:00:00+02:00").unwrap(), utc);
        assert_eq!(parse("2023-03-09T12:00:00").unwrap(), utc);
        assert_eq!(parse("2023-03-09T12:00:00.000000").unwrap(), utc);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("yesterday").is_err());
        assert!(parse("").is_err());
    }
}
