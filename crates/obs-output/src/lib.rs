//! `obs-output` — trace logs, variate export and run statistics for obsim.
//!
//! | Item                     | Output                                              |
//! |--------------------------|-----------------------------------------------------|
//! | [`CsvWriter`]            | `{scenario}_occ_log_rep{n}.csv`, `{scenario}_stop_log_rep{n}.csv` |
//! | [`write_summary`]        | `{scenario}_summary.csv`                            |
//! | [`write_variates`]       | one `%.18e` value per line                          |
//! | [`occupancy_stats`]      | time-weighted mean / sd / min / max / quantiles     |
//! | [`wait_stats`]           | fraction delayed, mean and max wait                 |
//! | [`StatsObserver`]        | both summaries computed during the run              |
//!
//! Trace writers implement [`OutputWriter`] and are driven by
//! [`TraceOutputObserver`], which implements `obs_sim::TraceObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use obs_output::{CsvWriter, TraceOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"), "baseline", 1, false)?;
//! let mut obs = TraceOutputObserver::new(writer);
//! sim.run(&mut obs)?;
//! if let Some(e) = obs.take_error() { return Err(e.into()); }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod stats;
pub mod variates;
pub mod writer;


pub use crate::csv::{CsvWriter, occ_log_path, stop_log_path, summary_path, write_summary};
pub use error::{OutputError, OutputResult};
pub use observer::TraceOutputObserver;
pub use row::SummaryRow;
pub use stats::{
    DEFAULT_QUANTILES, OccupancyAccumulator, OccupancyStats, StatsObserver, WaitAccumulator, WaitStats,
    occupancy_stats, quantile_label, wait_stats,
};
pub use variates::{write_variates, write_variates_to_path};
pub use writer::OutputWriter;
