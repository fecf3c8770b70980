//! `obs-erlang` — closed-form queueing formulas.
//!
//! Standalone: nothing here depends on the simulation engine, so the
//! formulas can serve as an oracle for simulated occupancy and waiting.
//!
//! # Recursion
//!
//! Erlang B is computed through its reciprocal:
//!
//! ```text
//! invB_0 = 1
//! invB_j = 1 + invB_{j-1} * j / load      for j = 1..=c
//! B(load, c) = 1 / invB_c
//! ```
//!
//! which never forms `load^c` or `c!` and so stays finite for large `c`.
//! Erlang C follows from B:
//!
//! ```text
//! rho = load / c
//! C(load, c) = 1 / (rho + (1 - rho) / B(load, c))     (rho < 1)
//! ```
//!
//! # Boundaries
//!
//! - `c = 0` gives `B = 1` (with no servers every arrival is lost).
//! - `rho >= 1` is saturated; `rho == 1` included.  `c = 0` is saturated too.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ErlangError {
    #[error("offered load must be a positive real, got {0}")]
    InvalidLoad(f64),

    #[error("traffic intensity {rho} >= 1 (load {load} on {servers} servers): queue is unstable")]
    Saturated { load: f64, servers: u32, rho: f64 },
}

pub type ErlangResult<T> = Result<T, ErlangError>;

fn check_load(load: f64) -> ErlangResult<()> {
    if load.is_finite() && load > 0.0 {
        Ok(())
    } else {
        Err(ErlangError::InvalidLoad(load))
    }
}

/// Offered load in erlangs: arrival rate × mean service time.
#[inline]
pub fn offered_load(arr_rate: f64, mean_service: f64) -> f64 {
    arr_rate * mean_service
}

/// Traffic intensity `load / c`.  Infinite for `c = 0`.
#[inline]
pub fn traffic_intensity(load: f64, c: u32) -> f64 {
    load / c as f64
}

/// Probability an arrival finds all `c` servers busy in an M/G/c/c loss system.
pub fn erlang_b(load: f64, c: u32) -> ErlangResult<f64> {
    check_load(load)?;
    let mut inv_b = 1.0;
    for j in 1..=c {
        inv_b = 1.0 + inv_b * j as f64 / load;
    }
    Ok(1.0 / inv_b)
}

/// Probability an arrival has to wait in an M/M/c queue with unlimited room.
///
/// Fails with [`ErlangError::Saturated`] when `load / c >= 1`.
pub fn erlang_c(load: f64, c: u32) -> ErlangResult<f64> {
    check_load(load)?;
    let rho = traffic_intensity(load, c);
    if rho >= 1.0 {
        return Err(ErlangError::Saturated { load, servers: c, rho });
    }
    let eb = erlang_b(load, c)?;
    Ok(1.0 / (rho + (1.0 - rho) / eb))
}

/// Mean queueing delay in an M/M/c queue: `C(load, c) * mean_service / (c - load)`.
pub fn mmc_mean_wait(load: f64, c: u32, mean_service: f64) -> ErlangResult<f64> {
    let ec = erlang_c(load, c)?;
    Ok(ec * mean_service / (c as f64 - load))
}

#[cfg(test)]
mod tests;
