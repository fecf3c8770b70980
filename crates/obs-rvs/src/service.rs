//! Length-of-stay distribution used by the simulation.

use rand_distr::{Distribution, Exp, Gamma};

use obs_core::SimRng;

use crate::{VariateResult, erlang_dist, exp_dist};

/// Service (length-of-stay) time distribution.
///
/// One stage is plain exponential, so a `los_stages = 1` run draws exactly
/// the same values as a hand-written `exponential(1 / mean)` call.
#[derive(Debug, Clone)]
pub enum ServiceDistribution {
    Exponential { mean: f64, dist: Exp<f64> },
    ErlangK { stages: u32, mean: f64, dist: Gamma<f64> },
}

impl ServiceDistribution {
    pub fn new(stages: u32, mean: f64) -> VariateResult<Self> {
        if stages == 1 {
            Ok(Self::Exponential { mean, dist: exp_dist(1.0 / mean)? })
        } else {
            Ok(Self::ErlangK { stages, mean, dist: erlang_dist(stages, mean)? })
        }
    }

    pub fn mean(&self) -> f64 {
        match *self {
            Self::Exponential { mean, .. } | Self::ErlangK { mean, .. } => mean,
        }
    }

    pub fn stages(&self) -> u32 {
        match *self {
            Self::Exponential { .. } => 1,
            Self::ErlangK { stages, .. } => stages,
        }
    }

    #[inline]
    pub fn sample(&self, rng: &mut SimRng) -> f64 {
        match self {
            Self::Exponential { dist, .. } => dist.sample(rng.inner()),
            Self::ErlangK { dist, .. } => dist.sample(rng.inner()),
        }
    }
}
