//! Validated run parameters.

use crate::{CoreError, CoreResult};

/// Name given to the single modeled unit when none is configured.
pub const DEFAULT_UNIT: &str = "OBS";

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically assembled by the application from a YAML file plus CLI flags and
/// passed to the simulation builder.  Call [`SimConfig::validate`] before use;
/// the builder does so itself.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Poisson arrival rate (entities per time unit).
    pub arr_rate: f64,

    /// Mean length of stay in the unit.
    pub mean_los: f64,

    /// Erlang stages of the length-of-stay distribution.  1 = exponential.
    pub los_stages: u32,

    /// Number of servers (beds).
    pub capacity: usize,

    /// Run horizon.  Events scheduled later than this are abandoned.
    pub horizon: f64,

    /// Unit identity written into occupancy and stop records.
    pub unit: String,
}

impl SimConfig {
    /// Config with the given rates, exponential service, and the default unit name.
    pub fn new(arr_rate: f64, mean_los: f64, capacity: usize, horizon: f64) -> Self {
        Self {
            arr_rate,
            mean_los,
            los_stages: 1,
            capacity,
            horizon,
            unit: DEFAULT_UNIT.to_string(),
        }
    }

    /// Offered load in erlangs (`arr_rate * mean_los`).
    #[inline]
    pub fn offered_load(&self) -> f64 {
        self.arr_rate * self.mean_los
    }

    /// Reject non-positive or non-finite parameters.
    pub fn validate(&self) -> CoreResult<()> {
        fn positive(name: &str, v: f64) -> CoreResult<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(CoreError::Config(format!("{name} must be a positive real, got {v}")))
            }
        }

        positive("arr_rate", self.arr_rate)?;
        positive("mean_los", self.mean_los)?;
        positive("runtime", self.horizon)?;
        if self.los_stages == 0 {
            return Err(CoreError::Config("los_stages must be at least 1".into()));
        }
        if self.capacity == 0 {
            return Err(CoreError::Config("capacity must be at least 1".into()));
        }
        if self.unit.is_empty() {
            return Err(CoreError::Config("unit name must not be empty".into()));
        }
        Ok(())
    }
}
