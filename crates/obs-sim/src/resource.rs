//! `Resource` — a unit with a fixed number of slots and a FIFO wait queue.
//!
//! # Hand-off on release
//!
//! When a holder releases while requesters are queued, the freed slot goes
//! straight to the head of the queue inside the same `release` call: the
//! head becomes a holder before `release` returns and only its *resumption*
//! is scheduled.  `held` therefore never dips between the release and the
//! queued grant, and no requester arriving at the same instant can take the
//! slot first.
//!
//! A consequence is that `held < capacity` implies an empty queue, so a new
//! request is granted immediately only when nobody is waiting.
//!
//! # Invariants
//!
//! - `0 <= held <= capacity`
//! - a process is a holder, queued, or absent (exactly one)
//! - `held + queue_len` = requests made − releases completed

use std::collections::VecDeque;
use std::sync::Arc;

use obs_core::ProcessId;

use crate::{OccupancyRecord, Scheduler, SimError, SimResult, TraceObserver, Wake};

/// Result of [`Resource::request`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A slot was free; the requester holds it now and keeps running.
    Granted,
    /// All slots busy; the requester waits at `position` (0 = head).
    Queued { position: usize },
}

/// Finite-capacity shared resource.
pub struct Resource {
    name:     Arc<str>,
    capacity: usize,
    holders:  Vec<ProcessId>,
    queue:    VecDeque<ProcessId>,
}

impl Resource {
    pub fn new(name: impl Into<Arc<str>>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            holders: Vec::with_capacity(capacity),
            queue: VecDeque::new(),
        }
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently granted.
    #[inline]
    pub fn held(&self) -> usize {
        self.holders.len()
    }

    #[inline]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Requests not yet released: `held + queue_len`.
    #[inline]
    pub fn outstanding(&self) -> usize {
        self.held() + self.queue_len()
    }

    pub fn is_holding(&self, process: ProcessId) -> bool {
        self.holders.contains(&process)
    }

    pub fn is_queued(&self, process: ProcessId) -> bool {
        self.queue.contains(&process)
    }

    /// Queued requesters, head first.
    pub fn queued(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.queue.iter().copied()
    }

    /// Ask for one slot.
    ///
    /// Grants immediately (recording the new occupancy at the current time)
    /// when a slot is free; otherwise appends `requester` to the wait queue.
    /// A queued requester is resumed with [`Wake::Granted`] by the release
    /// that hands it a slot.
    pub fn request<O>(&mut self, requester: ProcessId, sched: &Scheduler, observer: &mut O) -> SimResult<RequestOutcome>
    where
        O: TraceObserver + ?Sized,
    {
        if self.is_holding(requester) || self.is_queued(requester) {
            return Err(SimError::AlreadyRequested { process: requester, unit: self.name.to_string() });
        }

        if self.held() < self.capacity {
            self.holders.push(requester);
            self.record(sched, observer);
            Ok(RequestOutcome::Granted)
        } else {
            self.queue.push_back(requester);
            Ok(RequestOutcome::Queued { position: self.queue.len() - 1 })
        }
    }

    /// Give back `requester`'s slot.
    ///
    /// If anyone is queued, the head is granted the slot in this same call
    /// and scheduled to resume now; its id is returned.  Fails with
    /// [`SimError::NotHolding`] if `requester` holds no slot.
    pub fn release<O>(&mut self, requester: ProcessId, sched: &mut Scheduler, observer: &mut O) -> SimResult<Option<ProcessId>>
    where
        O: TraceObserver + ?Sized,
    {
        if !sched.is_active() {
            return Err(SimError::InactiveScheduler);
        }
        let pos = self
            .holders
            .iter()
            .position(|&p| p == requester)
            .ok_or_else(|| SimError::NotHolding { process: requester, unit: self.name.to_string() })?;
        self.holders.remove(pos);

        let next = self.queue.pop_front();
        if let Some(next) = next {
            self.holders.push(next);
            sched.schedule_now(next, Wake::Granted)?;
        }
        self.record(sched, observer);
        Ok(next)
    }

    fn record<O: TraceObserver + ?Sized>(&self, sched: &Scheduler, observer: &mut O) {
        debug_assert!(self.held() <= self.capacity);
        observer.on_occupancy(&OccupancyRecord {
            timestamp: sched.now().as_f64(),
            unit:      Arc::clone(&self.name),
            occupancy: self.held(),
        });
    }
}
