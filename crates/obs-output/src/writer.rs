//! The `OutputWriter` trait implemented by trace log backends.

use obs_sim::{OccupancyRecord, StopRecord};

use crate::OutputResult;

/// Sink for trace records as the simulation produces them.
///
/// Errors are stored by [`TraceOutputObserver`][crate::TraceOutputObserver]
/// and retrieved with its `take_error`.
pub trait OutputWriter {
    /// Write one occupancy change.
    fn write_occupancy(&mut self, record: &OccupancyRecord) -> OutputResult<()>;

    /// Write one completed stop.
    fn write_stop(&mut self, record: &StopRecord) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent; safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
