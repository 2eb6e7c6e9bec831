//! INT96 timestamp codec.
//!
//! Legacy writers (Impala, Hive, older Spark and pandas exports) store an
//! instant as a 12-byte INT96: eight little-endian bytes of nanoseconds since
//! midnight followed by a four-byte Julian day number. This module converts
//! that pair into a signed Unix epoch timestamp and back.
//!
//! The conversion is exact integer arithmetic on `i128`, using floor
//! division so instants before 1970 still decompose into a non-negative
//! nanosecond remainder.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use parquet::data_type::Int96;
use serde::{Serialize, Serializer};

/// Julian day number of 1970-01-01.
pub const JULIAN_DAY_OF_UNIX_EPOCH: i32 = 2_440_588;

/// Nanoseconds in one second.
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Nanoseconds in one day.
pub const NANOS_PER_DAY: i64 = 86_400 * NANOS_PER_SECOND;

/// The two halves of an INT96 timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Int96Timestamp {
    /// Julian day number (day 2440588 is 1970-01-01).
    pub julian_day: i32,
    /// Nanoseconds elapsed since midnight of `julian_day`.
    pub nanos_of_day: i64,
}

impl Int96Timestamp {
    /// Convert to a Unix epoch timestamp; see [`decode_timestamp`].
    pub fn to_epoch(self) -> EpochTimestamp {
        decode_timestamp(self.julian_day, self.nanos_of_day)
    }
}

impl From<&Int96> for Int96Timestamp {
    fn from(value: &Int96) -> Self {
        // words: nanos low, nanos high, julian day
        let words = value.data();
        let nanos = (u64::from(words[1]) << 32) | u64::from(words[0]);
        Self {
            julian_day: words[2] as i32,
            nanos_of_day: nanos as i64,
        }
    }
}

impl From<Int96Timestamp> for Int96 {
    fn from(value: Int96Timestamp) -> Self {
        let nanos = value.nanos_of_day as u64;
        let mut out = Int96::new();
        out.set_data(nanos as u32, (nanos >> 32) as u32, value.julian_day as u32);
        out
    }
}

/// A signed Unix epoch timestamp with nanosecond precision.
///
/// `nanos` is always in `[0, 1_000_000_000)`; negative instants carry their
/// sign in `seconds` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpochTimestamp {
    /// Whole seconds since 1970-01-01T00:00:00Z, floored.
    pub seconds: i64,
    /// Nanosecond remainder.
    pub nanos: u32,
}

impl EpochTimestamp {
    /// The instant as a chrono UTC datetime, or `None` when it lies outside
    /// chrono's representable range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }
}

/// ISO-8601 in UTC with as many fractional digits as needed
/// (`2019-03-01T00:00:00Z`, `1969-12-31T23:59:59.999999999Z`).
impl fmt::Display for EpochTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => write!(f, "{}s+{}ns", self.seconds, self.nanos),
        }
    }
}

impl Serialize for EpochTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Convert an INT96 `(julian_day, nanos_of_day)` pair into a Unix epoch
/// timestamp.
///
/// `epoch_nanos = (julian_day - 2440588) * 86400 * 10^9 + nanos_of_day`,
/// split with floor division into seconds and a non-negative remainder.
pub fn decode_timestamp(julian_day: i32, nanos_of_day: i64) -> EpochTimestamp {
    let days = i128::from(julian_day) - i128::from(JULIAN_DAY_OF_UNIX_EPOCH);
    let epoch_nanos = days * i128::from(NANOS_PER_DAY) + i128::from(nanos_of_day);
    let seconds = epoch_nanos.div_euclid(i128::from(NANOS_PER_SECOND));
    let nanos = epoch_nanos.rem_euclid(i128::from(NANOS_PER_SECOND));

    // |seconds| <= 2^32 * 86400 + 2^63 / 10^9, far inside i64.
    EpochTimestamp {
        seconds: seconds as i64,
        nanos: nanos as u32,
    }
}

/// Inverse of [`decode_timestamp`].
///
/// The result always has `0 <= nanos_of_day < NANOS_PER_DAY`. Returns `None`
/// when the Julian day does not fit the 32-bit on-disk field.
pub fn encode_timestamp(ts: EpochTimestamp) -> Option<Int96Timestamp> {
    let epoch_nanos =
        i128::from(ts.seconds) * i128::from(NANOS_PER_SECOND) + i128::from(ts.nanos);
    let days = epoch_nanos.div_euclid(i128::from(NANOS_PER_DAY));
    let nanos_of_day = epoch_nanos.rem_euclid(i128::from(NANOS_PER_DAY));
    let julian_day = i32::try_from(days + i128::from(JULIAN_DAY_OF_UNIX_EPOCH)).ok()?;

    Some(Int96Timestamp {
        julian_day,
        nanos_of_day: nanos_of_day as i64,
    })
}
