//! `Scheduler` — the event clock.
//!
//! # Model
//!
//! Time jumps from one pending event to the next; nothing happens between
//! events.  Every suspension point of a process (start, timeout, resource
//! grant) becomes one `Event` holding the process to resume.
//!
//! Events are ordered by `(time, seq)` where `seq` is a global insertion
//! counter, so events at equal times are dispatched in the order they were
//! scheduled.  Dispatch order is therefore a pure function of the scheduled
//! times and the order of `schedule_*` calls; with a fixed seed a run is
//! exactly replayable.
//!
//! # Performance note
//!
//! `BinaryHeap` gives O(log E) push and pop where E = pending events.  In the
//! single-unit model E ≈ one timeout per holder plus one generator wake-up.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tracing::debug;

use obs_core::{ProcessId, SimTime};

use crate::{SimError, SimResult};

// ── Event ─────────────────────────────────────────────────────────────────────

/// Why a process is being resumed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Wake {
    /// First activation of a newly registered process.
    Start,
    /// A `schedule_after` delay has elapsed.
    Timeout,
    /// A queued resource request was granted by a release.
    Granted,
}

/// One pending resumption.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub time:    SimTime,
    /// Insertion sequence number; breaks ties between equal `time`s.
    pub seq:     u64,
    pub process: ProcessId,
    pub wake:    Wake,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time.cmp(&other.time).then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// Simulation clock plus the min-ordered set of pending events.
pub struct Scheduler {
    now:      SimTime,
    pending:  BinaryHeap<Reverse<Event>>,
    next_seq: u64,
    active:   bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            now:      SimTime::ZERO,
            pending:  BinaryHeap::new(),
            next_seq: 0,
            active:   true,
        }
    }

    /// Current simulated time.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// `false` once [`close`][Self::close] or [`run_until`][Self::run_until]
    /// has finished the run.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Time of the earliest pending event, or `None` if nothing is pending.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.pending.peek().map(|Reverse(e)| e.time)
    }

    /// Register a resumption of `process` at `now + delay`.
    ///
    /// Returns the scheduled time.  A negative or NaN delay is a caller bug
    /// and fails with [`SimError::InvalidDelay`]; scheduling on a closed
    /// scheduler fails with [`SimError::InactiveScheduler`].
    pub fn schedule_after(&mut self, process: ProcessId, delay: f64, wake: Wake) -> SimResult<SimTime> {
        if !self.active {
            return Err(SimError::InactiveScheduler);
        }
        // `!(delay >= 0.0)` also catches NaN.
        if !(delay >= 0.0) {
            return Err(SimError::InvalidDelay { delay });
        }
        let time = self.now + delay;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Reverse(Event { time, seq, process, wake }));
        Ok(time)
    }

    /// Register a resumption at the current time, behind any events already
    /// pending for this instant.
    #[inline]
    pub fn schedule_now(&mut self, process: ProcessId, wake: Wake) -> SimResult<SimTime> {
        self.schedule_after(process, 0.0, wake)
    }

    /// Remove the earliest pending event and move the clock to its time.
    ///
    /// The caller resumes exactly the process named in the returned event.
    pub fn advance(&mut self) -> Option<Event> {
        let Reverse(event) = self.pending.pop()?;
        debug_assert!(event.time >= self.now, "event clock moved backwards");
        self.now = event.time;
        Some(event)
    }

    /// Advance and `dispatch` events while the next one is due at or before
    /// `horizon`.
    ///
    /// Afterwards the clock reads `horizon` (if it was behind it), every
    /// event still pending is dropped, and the scheduler is closed.
    /// Processes suspended past the horizon are abandoned without error.
    ///
    /// Returns the number of events dispatched.
    pub fn run_until<F>(&mut self, horizon: SimTime, mut dispatch: F) -> SimResult<u64>
    where
        F: FnMut(&mut Scheduler, Event) -> SimResult<()>,
    {
        if !self.active {
            return Err(SimError::InactiveScheduler);
        }

        let mut dispatched = 0u64;
        while self.peek_time().is_some_and(|t| t <= horizon) {
            let Some(event) = self.advance() else { break };
            dispatch(self, event)?;
            dispatched += 1;
        }

        if horizon > self.now {
            self.now = horizon;
        }
        let dropped = self.close();
        debug!(dispatched, dropped, horizon = horizon.as_f64(), "event loop reached horizon");
        Ok(dispatched)
    }

    /// Drop every pending event and refuse further scheduling.
    ///
    /// Returns how many events were dropped.  Idempotent.
    pub fn close(&mut self) -> usize {
        self.active = false;
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }
}
