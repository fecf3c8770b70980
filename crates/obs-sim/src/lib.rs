//! `obs-sim` — discrete-event engine for a single finite-capacity unit.
//!
//! # Event loop
//!
//! ```text
//! on first dispatch: record the unit's starting level
//! while next event time <= horizon:
//!   ① Advance  — pop the earliest (time, seq) event; clock jumps to its time.
//!   ② Resume   — run exactly that process to its next suspension point:
//!                  Generator  → spawn a flow, draw the next gap, sleep
//!                  Flow       → request / begin service / release
//!   ③ Trace    — grants, releases and pseudo-unit passes go to the
//!                TraceObserver as they happen.
//! drop remaining events; clock := horizon
//! ```
//!
//! Only one process runs at a time and nothing preempts it, so the resource
//! needs no locking and the event order is fully determined by the seed.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use obs_core::SimConfig;
//! use obs_sim::{SimBuilder, TraceCollector};
//!
//! let mut trace = TraceCollector::new();
//! let mut sim = SimBuilder::new(SimConfig::new(0.4, 3.0, 2, 250.0))
//!     .seed(6353)
//!     .build()?;
//! sim.run(&mut trace)?;
//! ```

pub mod builder;
pub mod error;
pub mod process;
pub mod resource;
pub mod scheduler;
pub mod sim;
pub mod trace;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use process::{FlowProcess, FlowState, Process};
pub use resource::{RequestOutcome, Resource};
pub use scheduler::{Event, Scheduler, Wake};
pub use sim::{Facility, Sim};
pub use trace::{
    ENTRY_UNIT, EXIT_UNIT, NoopObserver, OccupancyRecord, StopRecord, TraceCollector, TraceObserver,
    is_pseudo_unit,
};
