//! One-shot variate functions and the batch sampler behind `obsim rvs`.
//!
//! Every function takes the RNG from the caller and holds no state of its
//! own: the same generator state and the same call sequence always give the
//! same samples.

use rand::Rng;
use rand_distr::{Distribution, Exp, Gamma};
use tracing::info;

use obs_core::SimRng;

use crate::{VariateError, VariateResult};

fn check_rate(rate: f64) -> VariateResult<()> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(VariateError::InvalidRate(rate))
    }
}

fn check_mean(mean: f64) -> VariateResult<()> {
    if mean.is_finite() && mean > 0.0 {
        Ok(())
    } else {
        Err(VariateError::InvalidMean(mean))
    }
}

/// Build an exponential distribution with the given rate (mean `1 / rate`).
pub fn exp_dist(rate: f64) -> VariateResult<Exp<f64>> {
    check_rate(rate)?;
    Exp::new(rate).map_err(|e| VariateError::Distribution(e.to_string()))
}

/// Build an Erlang-k distribution with overall mean `mean`.
///
/// Erlang(k) with mean `b` is Gamma with shape `k` and scale `b / k`: each of
/// the `k` exponential stages has mean `b / k`.
pub fn erlang_dist(stages: u32, mean: f64) -> VariateResult<Gamma<f64>> {
    if stages == 0 {
        return Err(VariateError::ZeroStages);
    }
    check_mean(mean)?;
    let shape = stages as f64;
    Gamma::new(shape, mean / shape).map_err(|e| VariateError::Distribution(e.to_string()))
}

/// Draw one exponential sample with the given rate.
pub fn exponential<R: Rng + ?Sized>(rate: f64, rng: &mut R) -> VariateResult<f64> {
    Ok(exp_dist(rate)?.sample(rng))
}

/// Draw one Erlang-k sample with `stages` stages and overall mean `mean`.
pub fn gamma_erlangk<R: Rng + ?Sized>(stages: u32, mean: f64, rng: &mut R) -> VariateResult<f64> {
    Ok(erlang_dist(stages, mean)?.sample(rng))
}

/// Generate `n` Erlang-k variates with `k` stages and overall mean `b`.
///
/// `seed = None` seeds from OS entropy and logs a reproducibility warning.
pub fn generate_rvs(k: u32, b: f64, n: usize, seed: Option<u64>) -> VariateResult<Vec<f64>> {
    let dist = erlang_dist(k, b)?;
    let mut rng = SimRng::from_seed(seed);
    info!(k, b, n, "generating erlang variates");
    Ok((0..n).map(|_| dist.sample(rng.inner())).collect())
}
