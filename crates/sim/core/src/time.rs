//! Simulated time.
//!
//! [`SimTime`] is an instant on a single trial's timeline, measured from the
//! start of that trial. Lengths of time are plain [`Duration`]s.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::time::Duration;

/// Instant on the simulation clock (elapsed time since trial start).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(Duration);

impl SimTime {
    pub const ZERO: Self = Self(Duration::ZERO);

    pub const fn from_duration(elapsed: Duration) -> Self {
        Self(elapsed)
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// Elapsed time since trial start.
    pub const fn elapsed(self) -> Duration {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0.as_secs_f64()
    }

    /// Time from `earlier` to `self`, or zero if `earlier` is later.
    pub fn saturating_since(self, earlier: SimTime) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: Duration) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl AddAssign<Duration> for SimTime {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs;
    }
}

impl Sub for SimTime {
    type Output = Duration;

    fn sub(self, rhs: SimTime) -> Duration {
        self.saturating_since(rhs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0.as_secs_f64())
    }
}

/// Divides a duration by a speed factor (`1.0` = unchanged, `1.25` = 25% faster).
///
/// Rounds to the nearest nanosecond so repeated trials stay bit-identical.
pub fn scale_by_speed(duration: Duration, speed: f64) -> Duration {
    if speed <= 0.0 || speed == 1.0 {
        return duration;
    }
    let nanos = (duration.as_nanos() as f64 / speed).round();
    Duration::from_nanos(nanos as u64)
}

/// Serializes a [`Duration`] as fractional seconds, for hand-written config
/// files: `duration_cutoff = 180.0`.
#[cfg(feature = "serde")]
pub mod serde_secs {
    use std::time::Duration;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturating_difference_never_underflows() {
        let early = SimTime::from_millis(500);
        let late = SimTime::from_secs(2);
        assert_eq!(late - early, Duration::from_millis(1500));
        assert_eq!(early - late, Duration::ZERO);
    }

    #[test]
    fn speed_scaling_shortens_durations() {
        let cast = Duration::from_millis(1500);
        assert_eq!(scale_by_speed(cast, 1.5), Duration::from_secs(1));
        assert_eq!(scale_by_speed(cast, 1.0), cast);
        assert_eq!(scale_by_speed(cast, 0.0), cast);
    }
}
