//! Tick-based `DateTime` (§3, §4.5): `Long` ticks, 100 ns since
//! `0001-01-01T00:00:00 UTC`; zero ticks decode to "absent".

use chrono::{DateTime, Utc};

use crate::primitive::{CodecError, decode_long, encode_long};

/// Ticks between `0001-01-01T00:00:00Z` and the Unix epoch — the
/// standard .NET `DateTime` epoch offset.
const EPOCH_OFFSET_TICKS: i64 = 621_355_968_000_000_000;
const TICKS_PER_SECOND: i64 = 10_000_000;

#[must_use]
pub fn ticks_from_datetime(dt: DateTime<Utc>) -> i64 {
    let nanos = dt.timestamp_nanos_opt().unwrap_or(0);
    EPOCH_OFFSET_TICKS + nanos / 100
}

#[must_use]
pub fn datetime_from_ticks(ticks: i64) -> Option<DateTime<Utc>> {
    if ticks == 0 {
        return None;
    }
    let unix_ticks = ticks - EPOCH_OFFSET_TICKS;
    let secs = unix_ticks.div_euclid(TICKS_PER_SECOND);
    let remainder_ticks = unix_ticks.rem_euclid(TICKS_PER_SECOND);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let nanos = (remainder_ticks * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}

pub fn encode_datetime(dt: Option<DateTime<Utc>>) -> [u8; 8] {
    let ticks = dt.map_or(0, ticks_from_datetime);
    encode_long(ticks)
}

pub fn decode_datetime(bytes: &[u8]) -> Result<(Option<DateTime<Utc>>, &[u8]), CodecError> {
    let (ticks, rest) = decode_long(bytes)?;
    Ok((datetime_from_ticks(ticks), rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn zero_ticks_is_absent() {
        assert_eq!(datetime_from_ticks(0), None);
        let (decoded, rest) = decode_datetime(&[0; 8]).unwrap();
        assert_eq!(decoded, None);
        assert!(rest.is_empty());
    }

    #[test]
    fn round_trips_a_concrete_instant() {
        let dt = Utc.with_ymd_and_hms(2007, 6, 13, 6, 46, 42).unwrap();
        let ticks = ticks_from_datetime(dt);
        let back = datetime_from_ticks(ticks).unwrap();
        assert_eq!(back, dt);
    }

    #[test]
    fn encode_decode_round_trip() {
        let dt = Utc.with_ymd_and_hms(2020, 12, 31, 15, 59, 0).unwrap();
        let bytes = encode_datetime(Some(dt));
        let (decoded, rest) = decode_datetime(&bytes).unwrap();
        assert_eq!(decoded, Some(dt));
        assert!(rest.is_empty());
    }
}
