//! `obs-rvs` — random variate generation for the obsim queueing simulator.
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`variate`]   | `exponential`, `gamma_erlangk`, `generate_rvs`             |
//! | [`service`]   | `ServiceDistribution` (exponential or Erlang-k LOS)        |
//! | [`error`]     | `VariateError`, `VariateResult<T>`                         |

pub mod error;
pub mod service;
pub mod variate;

#[cfg(test)]
mod tests;

pub use error::{VariateError, VariateResult};
pub use service::ServiceDistribution;
pub use variate::{erlang_dist, exp_dist, exponential, gamma_erlangk, generate_rvs};
