//! `obs-core` — foundational types for the `obsim` queueing simulator.
//!
//! This crate is a dependency of every other `obs-*` crate.  It has no
//! `obs-*` dependencies and minimal external ones (`rand`, `thiserror`,
//! `tracing`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `ProcessId`, `EntityId`                               |
//! | [`time`]        | `SimTime`                                             |
//! | [`rng`]         | `SimRng` (seeded or entropy-backed)                   |
//! | [`config`]      | `SimConfig` — validated run parameters                |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{DEFAULT_UNIT, SimConfig};
pub use error::{CoreError, CoreResult};
pub use ids::{EntityId, ProcessId};
pub use rng::SimRng;
pub use time::SimTime;
