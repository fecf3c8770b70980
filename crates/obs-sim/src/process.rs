//! Process state machines driven by the scheduler.
//!
//! ```text
//! Flow:      Created ──Start──▶ Requesting ──(granted)──▶ Holding ──Timeout──▶ Done
//!                                   │                        ▲
//!                                   └──── queued … Granted ──┘
//!
//! Generator: Start → draw gap, sleep
//!            Timeout → draw LOS, spawn flow, draw gap, sleep   (forever)
//! ```

use std::sync::Arc;

use obs_core::EntityId;

use crate::StopRecord;

/// Where a flow process is in its lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlowState {
    /// Registered; its `Start` event is pending.
    Created,
    /// Has called `request`; holding nothing yet (queued, or about to be
    /// resumed by a hand-off).
    Requesting,
    /// Holds a slot; its service `Timeout` is pending.
    Holding,
    /// Released its slot.  Never resumed again.
    Done,
}

/// One entity's passage through the unit.
///
/// Timestamps are `None` until the corresponding step happens.
#[derive(Clone, Debug)]
pub struct FlowProcess {
    pub entity:     EntityId,
    pub state:      FlowState,
    /// Drawn length of stay.
    pub service:    f64,
    pub arrival_ts: Option<f64>,
    pub request_ts: Option<f64>,
    pub grant_ts:   Option<f64>,
    pub release_ts: Option<f64>,
}

impl FlowProcess {
    pub fn new(entity: EntityId, service: f64) -> Self {
        Self {
            entity,
            state: FlowState::Created,
            service,
            arrival_ts: None,
            request_ts: None,
            grant_ts: None,
            release_ts: None,
        }
    }

    /// Queueing delay, once granted.  Zero when granted on request.
    pub fn wait(&self) -> Option<f64> {
        Some(self.grant_ts? - self.request_ts?)
    }

    pub fn is_done(&self) -> bool {
        self.state == FlowState::Done
    }

    /// The stop record for a completed visit to `unit`.
    pub(crate) fn stop_record(&self, unit: &Arc<str>) -> Option<StopRecord> {
        Some(StopRecord {
            entity:      self.entity,
            unit:        Arc::clone(unit),
            request_ts:  self.request_ts?,
            entry_ts:    self.grant_ts?,
            exit_ts:     self.release_ts?,
            planned_los: self.service,
        })
    }
}

/// An entry in the simulation's process table.
#[derive(Clone, Debug)]
pub enum Process {
    /// The Poisson arrival generator.  Stateless; the entity counter lives
    /// on the facility.
    Generator,
    Flow(FlowProcess),
    /// Slot of a finished flow that was not retained.
    Vacant,
}

impl Process {
    pub fn as_flow(&self) -> Option<&FlowProcess> {
        match self {
            Process::Flow(f) => Some(f),
            Process::Generator | Process::Vacant => None,
        }
    }
}
