//! Simulated time.
//!
//! # Design
//!
//! The event clock is continuous: arrival and service draws are real-valued,
//! so time is an `f64` rather than an integer tick.  `SimTime` wraps it with a
//! total order (`f64::total_cmp`) so it can key a `BinaryHeap` directly.
//!
//! All constructors reject NaN in debug builds; the scheduler never produces
//! negative or non-finite times because it validates every delay.

use std::cmp::Ordering;
use std::fmt;

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute point on the simulation clock, in model time units.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    #[inline]
    pub fn new(t: f64) -> Self {
        debug_assert!(!t.is_nan(), "SimTime must not be NaN");
        SimTime(t)
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::ops::Add<f64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: f64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={:.4}", self.0)
    }
}
