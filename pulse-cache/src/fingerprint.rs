//! Deterministic cache keys for sensor-data queries.
//!
//! A [`Fingerprint`] is a structured rendering of the query parameter
//! tuple, not a digest: keys stay human-readable in the cache backend and
//! collisions are structurally impossible because every field occupies a
//! fixed, colon-delimited position.

use pulse_core::QueryParams;
use pulse_core::Timestamp;
use std::fmt;

/// Sentinel for an absent time bound.
///
/// Lowercase `none` can never collide with an RFC 3339 timestamp rendering,
/// which always starts with a digit.
const ABSENT: &str = "none";

/// Key prefix for primary query results.
const PREFIX: &str = "sensor_data";

/// A cache key uniquely and deterministically derived from [`QueryParams`].
///
/// The private field means a `Fingerprint` can only come from [`of`],
/// so every key in the store was derived from a validated parameter tuple.
///
/// [`of`]: Fingerprint::of
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Derive the fingerprint for a parameter tuple.
    ///
    /// Format: `sensor_data:{start}:{end}:{limit}:{offset}` with RFC 3339
    /// timestamps and the `none` sentinel for absent bounds. Limit and
    /// offset are plain base-10 integers. Pure and total: equal params
    /// always yield equal fingerprints.
    pub fn of(params: &QueryParams) -> Self {
        Self(format!(
            "{}:{}:{}:{}:{}",
            PREFIX,
            render_bound(params.start_time()),
            render_bound(params.end_time()),
            params.limit(),
            params.offset(),
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn render_bound(bound: Option<Timestamp>) -> String {
    match bound {
        Some(ts) => ts.to_rfc3339(),
        None => ABSENT.to_string(),
    }
}
