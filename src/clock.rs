//! Server/local clock alignment
//!
//! Countdown start times are assigned by the document store's server at
//! write time, so deriving remaining time locally requires correcting the
//! local clock by the server-minus-local offset the store feeds to every
//! client. This module provides the millisecond timestamp type used across
//! the crate and the offset tracker that applies the correction.

use std::{ops::Add, time::Duration};

use serde::{Deserialize, Serialize};
use web_time::{SystemTime, UNIX_EPOCH};

/// A point in time expressed as milliseconds since the Unix epoch
///
/// This matches the representation the document store uses for its
/// server-assigned timestamps, so resolved `startAt` values deserialize
/// directly into it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Samples the local wall clock
    ///
    /// Uses `web-time` so the same code path works on native and WASM
    /// targets. Times before the Unix epoch clamp to zero.
    pub fn now() -> Self {
        Self(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as i64,
        )
    }

    /// Creates a timestamp from milliseconds since the Unix epoch
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as milliseconds since the Unix epoch
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Returns the signed distance from `earlier` to `self` in milliseconds
    ///
    /// Negative when `self` precedes `earlier`.
    pub fn millis_since(self, earlier: Self) -> i64 {
        self.0 - earlier.0
    }
}

impl Add<Duration> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.as_millis() as i64)
    }
}

/// Server-minus-local clock correction
///
/// The store continuously pushes its estimate of `server_time - local_time`
/// to every connected client; hosts forward each sample to [`update`].
/// Before the first sample arrives the offset is zero, i.e. the local clock
/// is trusted as-is.
///
/// [`update`]: ClockOffset::update
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClockOffset {
    millis: i64,
}

impl ClockOffset {
    /// Records a fresh offset sample from the store's offset feed
    pub fn update(&mut self, offset_millis: i64) {
        self.millis = offset_millis;
    }

    /// Returns the current correction in milliseconds
    pub fn as_millis(self) -> i64 {
        self.millis
    }

    /// Estimates the server clock from a local timestamp
    pub fn server_now(self, local_now: Timestamp) -> Timestamp {
        Timestamp(local_now.0 + self.millis)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_offset_defaults_to_local_clock() {
        let offset = ClockOffset::default();
        let local = Timestamp::from_millis(1_000);

        assert_eq!(offset.server_now(local), local);
    }

    #[test]
    fn test_offset_applies_correction() {
        let mut offset = ClockOffset::default();
        offset.update(250);
        assert_eq!(
            offset.server_now(Timestamp::from_millis(1_000)),
            Timestamp::from_millis(1_250)
        );

        offset.update(-400);
        assert_eq!(
            offset.server_now(Timestamp::from_millis(1_000)),
            Timestamp::from_millis(600)
        );
    }

    #[test]
    fn test_millis_since() {
        let earlier = Timestamp::from_millis(500);
        let later = Timestamp::from_millis(2_000);

        assert_eq!(later.millis_since(earlier), 1_500);
        assert_eq!(earlier.millis_since(later), -1_500);
    }

    #[test]
    fn test_add_duration() {
        let start = Timestamp::from_millis(1_000);
        assert_eq!(
            start + Duration::from_millis(500),
            Timestamp::from_millis(1_500)
        );
    }

    #[test]
    fn test_timestamp_serializes_as_plain_number() {
        let timestamp = Timestamp::from_millis(1_234);
        assert_eq!(serde_json::to_value(timestamp).unwrap(), 1_234);

        let parsed: Timestamp = serde_json::from_value(1_234.into()).unwrap();
        assert_eq!(parsed, timestamp);
    }
}
