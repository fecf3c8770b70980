//! `TraceOutputObserver<W>` — bridges `TraceObserver` to an `OutputWriter`.

use obs_core::SimTime;
use obs_sim::{OccupancyRecord, StopRecord, TraceObserver};

use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`TraceObserver`] that streams every record to an [`OutputWriter`].
///
/// Errors from the writer are stored internally because `TraceObserver`
/// methods have no return value.  After `sim.run()` returns, check for errors
/// with [`take_error`][Self::take_error].
pub struct TraceOutputObserver<W: OutputWriter> {
    writer:     W,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> TraceOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> TraceObserver for TraceOutputObserver<W> {
    fn on_occupancy(&mut self, record: &OccupancyRecord) {
        let result = self.writer.write_occupancy(record);
        self.store_err(result);
    }

    fn on_stop(&mut self, record: &StopRecord) {
        let result = self.writer.write_stop(record);
        self.store_err(result);
    }

    fn on_run_end(&mut self, _end_time: SimTime) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
