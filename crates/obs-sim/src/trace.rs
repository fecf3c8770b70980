//! Trace records and the observer interface that receives them.

use std::sync::Arc;

use obs_core::{EntityId, SimTime};

/// Pseudo-unit every entity passes through on arrival.
pub const ENTRY_UNIT: &str = "ENTRY";
/// Pseudo-unit every entity passes through on departure.
pub const EXIT_UNIT: &str = "EXIT";

/// `true` for the `ENTRY`/`EXIT` pass-through pseudo-units.
pub fn is_pseudo_unit(unit: &str) -> bool {
    unit == ENTRY_UNIT || unit == EXIT_UNIT
}

// ── Records ───────────────────────────────────────────────────────────────────

/// Occupancy level of `unit` from `timestamp` until the unit's next record.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyRecord {
    pub timestamp: f64,
    pub unit:      Arc<str>,
    pub occupancy: usize,
}

/// One entity's visit to one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct StopRecord {
    pub entity:      EntityId,
    pub unit:        Arc<str>,
    /// When the entity asked for a slot.
    pub request_ts:  f64,
    /// When the slot was granted.
    pub entry_ts:    f64,
    pub exit_ts:     f64,
    /// Drawn length of stay.  Zero for pseudo-units.
    pub planned_los: f64,
}

impl StopRecord {
    /// Time spent queued before entry.
    #[inline]
    pub fn wait(&self) -> f64 {
        self.entry_ts - self.request_ts
    }
}

// ── TraceObserver ─────────────────────────────────────────────────────────────

/// Callbacks invoked by the simulation as the trace is produced.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
pub trait TraceObserver {
    /// Called on every resource grant and release, and twice per pass through
    /// a pseudo-unit.
    fn on_occupancy(&mut self, _record: &OccupancyRecord) {}

    /// Called when an entity leaves a unit.
    fn on_stop(&mut self, _record: &StopRecord) {}

    /// Called once after the run reaches its horizon.
    fn on_run_end(&mut self, _end_time: SimTime) {}
}

/// A [`TraceObserver`] that does nothing.
pub struct NoopObserver;

impl TraceObserver for NoopObserver {}

impl<T: TraceObserver + ?Sized> TraceObserver for &mut T {
    fn on_occupancy(&mut self, record: &OccupancyRecord) {
        (**self).on_occupancy(record);
    }

    fn on_stop(&mut self, record: &StopRecord) {
        (**self).on_stop(record);
    }

    fn on_run_end(&mut self, end_time: SimTime) {
        (**self).on_run_end(end_time);
    }
}

/// Feed every callback to both observers, left first.
impl<A: TraceObserver, B: TraceObserver> TraceObserver for (A, B) {
    fn on_occupancy(&mut self, record: &OccupancyRecord) {
        self.0.on_occupancy(record);
        self.1.on_occupancy(record);
    }

    fn on_stop(&mut self, record: &StopRecord) {
        self.0.on_stop(record);
        self.1.on_stop(record);
    }

    fn on_run_end(&mut self, end_time: SimTime) {
        self.0.on_run_end(end_time);
        self.1.on_run_end(end_time);
    }
}

// ── TraceCollector ────────────────────────────────────────────────────────────

/// In-memory trace: keeps every record in arrival order.
#[derive(Debug, Default, Clone)]
pub struct TraceCollector {
    pub occupancy: Vec<OccupancyRecord>,
    pub stops:     Vec<StopRecord>,
    /// Set by `on_run_end`.
    pub end_time:  Option<f64>,
}

impl TraceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Occupancy records for a single unit, in time order.
    pub fn occupancy_of<'a>(&'a self, unit: &'a str) -> impl Iterator<Item = &'a OccupancyRecord> + 'a {
        self.occupancy.iter().filter(move |r| &*r.unit == unit)
    }

    /// Stop records for a single unit, in departure order.
    pub fn stops_at<'a>(&'a self, unit: &'a str) -> impl Iterator<Item = &'a StopRecord> + 'a {
        self.stops.iter().filter(move |r| &*r.unit == unit)
    }

    /// Highest recorded occupancy of `unit`, or `None` if it has no records.
    pub fn max_occupancy(&self, unit: &str) -> Option<usize> {
        self.occupancy_of(unit).map(|r| r.occupancy).max()
    }
}

impl TraceObserver for TraceCollector {
    fn on_occupancy(&mut self, record: &OccupancyRecord) {
        self.occupancy.push(record.clone());
    }

    fn on_stop(&mut self, record: &StopRecord) {
        self.stops.push(record.clone());
    }

    fn on_run_end(&mut self, end_time: SimTime) {
        self.end_time = Some(end_time.as_f64());
    }
}
