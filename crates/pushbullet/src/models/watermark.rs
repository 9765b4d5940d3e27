//! Watermark for incremental push sync

use std::fmt;
use std::str::FromStr;

use super::Collection;
use crate::error::PushError;

const MICROS_PER_SEC: i64 = 1_000_000;

/// Unix timestamp below which everything has already been seen
///
/// Zero means "nothing seen yet". A watermark only ever moves forward.
/// It keeps microsecond precision: the server compares `modified_after`
/// against fractional `modified` values, and a truncated watermark would
/// hand the newest item back on every sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark(i64);

impl Watermark {
    pub const ZERO: Watermark = Watermark(0);

    /// Watermark at whole seconds
    pub fn new(secs: i64) -> Self {
        Self(secs.max(0).saturating_mul(MICROS_PER_SEC))
    }

    /// Watermark at fractional seconds, rounded to the microsecond
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() || secs <= 0.0 {
            return Watermark::ZERO;
        }
        Self((secs * MICROS_PER_SEC as f64).round() as i64)
    }

    /// Whole seconds, rounded down
    pub fn as_secs(self) -> i64 {
        self.0 / MICROS_PER_SEC
    }

    /// Advance past every item in `collection`
    ///
    /// Returns `max(self, max modified)`; an empty collection, or one whose
    /// items carry no modification time, leaves the watermark unchanged.
    pub fn advanced_by(self, collection: &Collection) -> Self {
        match collection.max_modified() {
            Some(latest) => self.max(Watermark::from_secs_f64(latest)),
            None => self,
        }
    }
}

impl fmt::Display for Watermark {
    /// Seconds, with the fraction only when there is one (`1000`, `1010.5`)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0 / MICROS_PER_SEC;
        let micros = self.0 % MICROS_PER_SEC;
        if micros == 0 {
            return write!(f, "{}", secs);
        }
        let fraction = format!("{:06}", micros);
        write!(f, "{}.{}", secs, fraction.trim_end_matches('0'))
    }
}

impl FromStr for Watermark {
    type Err = PushError;

    /// Accepts integer or fractional seconds; an empty string is zero
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Watermark::ZERO);
        }
        if let Ok(secs) = s.parse::<i64>() {
            return Ok(Watermark::new(secs));
        }
        match s.parse::<f64>() {
            Ok(secs) if secs.is_finite() => Ok(Watermark::from_secs_f64(secs)),
            _ => Err(PushError::malformed(format!("'{}' is not a timestamp", s))),
        }
    }
}
