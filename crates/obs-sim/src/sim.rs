//! The `Sim` struct and its event loop.

use std::sync::Arc;

use rand_distr::{Distribution, Exp};
use tracing::{debug, info};

use obs_core::{EntityId, ProcessId, SimConfig, SimRng, SimTime};
use obs_rvs::ServiceDistribution;

use crate::{
    Event, FlowProcess, FlowState, OccupancyRecord, Process, RequestOutcome, Resource, Scheduler,
    SimError, SimResult, StopRecord, TraceObserver, Wake,
};

// ── Facility ──────────────────────────────────────────────────────────────────

/// Everything a process touches while it runs: the unit, the process table,
/// and the random streams.
///
/// Kept apart from the [`Scheduler`] so the event loop can lend the scheduler
/// and the facility to a dispatch closure at the same time.
pub struct Facility {
    /// The modeled unit.
    pub resource:  Resource,

    /// Process table indexed by `ProcessId`.  Finished flows stay in place so
    /// their timestamps can be inspected after the run, unless flow
    /// retention is off; then their slots are vacated and reused.
    pub processes: Vec<Process>,

    /// The run's single random stream.  Arrival and service draws are taken
    /// in event order.
    pub rng:       SimRng,

    arrivals:      Option<Exp<f64>>,
    service:       ServiceDistribution,
    entry:         Arc<str>,
    exit:          Arc<str>,
    retain:        bool,
    /// Vacated process slots, reused before the table grows.
    free:          Vec<ProcessId>,
    opened:        bool,
    entities:      u32,
    requests:      u64,
    releases:      u64,
}

impl Facility {
    pub(crate) fn new(
        resource: Resource,
        rng:      SimRng,
        arrivals: Option<Exp<f64>>,
        service:  ServiceDistribution,
        retain:   bool,
    ) -> Self {
        Self {
            resource,
            processes: Vec::new(),
            rng,
            arrivals,
            service,
            entry: Arc::from(crate::ENTRY_UNIT),
            exit: Arc::from(crate::EXIT_UNIT),
            retain,
            free: Vec::new(),
            opened: false,
            entities: 0,
            requests: 0,
            releases: 0,
        }
    }

    /// Register the arrival generator and schedule its first activation now.
    pub(crate) fn start_generator(&mut self, sched: &mut Scheduler) -> SimResult<ProcessId> {
        let pid = self.alloc(Process::Generator)?;
        sched.schedule_now(pid, Wake::Start)?;
        Ok(pid)
    }

    /// Create a flow process for a new entity, starting `delay` from now.
    pub(crate) fn spawn_flow(&mut self, sched: &mut Scheduler, service: f64, delay: f64) -> SimResult<ProcessId> {
        let entity = EntityId(self.entities + 1);
        let pid = self.alloc(Process::Flow(FlowProcess::new(entity, service)))?;
        self.entities += 1;
        sched.schedule_after(pid, delay, Wake::Start)?;
        Ok(pid)
    }

    /// Place `process` in a vacated slot, or append it.
    fn alloc(&mut self, process: Process) -> SimResult<ProcessId> {
        if let Some(pid) = self.free.pop() {
            self.processes[pid.index()] = process;
            return Ok(pid);
        }
        let pid = ProcessId::try_from(self.processes.len())
            .map_err(|_| SimError::Config("process table is full".into()))?;
        self.processes.push(process);
        Ok(pid)
    }

    /// Record the unit's starting level once, before the first dispatch, so
    /// the time until the first grant is weighted too.
    fn open<O: TraceObserver + ?Sized>(&mut self, now: SimTime, observer: &mut O) {
        if !self.opened {
            self.opened = true;
            observer.on_occupancy(&OccupancyRecord {
                timestamp: now.as_f64(),
                unit:      Arc::clone(self.resource.name()),
                occupancy: self.resource.held(),
            });
        }
    }

    /// Resume the process named in `event`.
    pub fn resume<O>(&mut self, sched: &mut Scheduler, event: Event, observer: &mut O) -> SimResult<()>
    where
        O: TraceObserver + ?Sized,
    {
        match self.processes.get(event.process.index()) {
            Some(Process::Generator) => self.resume_generator(sched, event),
            Some(Process::Flow(_)) => self.resume_flow(sched, event, observer),
            Some(Process::Vacant) | None => Err(SimError::UnknownProcess(event.process)),
        }
    }

    fn resume_generator(&mut self, sched: &mut Scheduler, event: Event) -> SimResult<()> {
        // Waking from an interarrival gap means an entity arrives now.
        if event.wake == Wake::Timeout {
            let los = self.service.sample(&mut self.rng);
            self.spawn_flow(sched, los, 0.0)?;
        }

        let gap = match &self.arrivals {
            Some(arrivals) => arrivals.sample(self.rng.inner()),
            None => return Err(SimError::UnknownProcess(event.process)),
        };
        sched.schedule_after(event.process, gap, Wake::Timeout)?;
        Ok(())
    }

    fn resume_flow<O>(&mut self, sched: &mut Scheduler, event: Event, observer: &mut O) -> SimResult<()>
    where
        O: TraceObserver + ?Sized,
    {
        let pid = event.process;
        let now = sched.now().as_f64();
        let (state, entity) = {
            let flow = self.flow_mut(pid)?;
            (flow.state, flow.entity)
        };

        match (state, event.wake) {
            (FlowState::Created, Wake::Start) => {
                let entry = Arc::clone(&self.entry);
                pass_through(&entry, entity, now, observer);
                {
                    let flow = self.flow_mut(pid)?;
                    flow.arrival_ts = Some(now);
                    flow.request_ts = Some(now);
                    flow.state = FlowState::Requesting;
                }
                debug!("{entity} trying to get {} at {now}", self.resource.name());

                self.requests += 1;
                match self.resource.request(pid, sched, observer)? {
                    RequestOutcome::Granted => self.begin_service(sched, pid),
                    RequestOutcome::Queued { position } => {
                        debug!("{entity} queued for {} at position {position}", self.resource.name());
                        Ok(())
                    }
                }
            }

            (FlowState::Requesting, Wake::Granted) => self.begin_service(sched, pid),

            (FlowState::Holding, Wake::Timeout) => {
                let handed_to = self.resource.release(pid, sched, observer)?;
                self.releases += 1;

                let unit = Arc::clone(self.resource.name());
                let flow = self.flow_mut(pid)?;
                flow.release_ts = Some(now);
                flow.state = FlowState::Done;
                if let Some(stop) = flow.stop_record(&unit) {
                    observer.on_stop(&stop);
                }
                debug!("{entity} leaving {unit} at {now}");
                if let Some(next) = handed_to {
                    debug!("{unit} slot handed to {next} at {now}");
                }

                let exit = Arc::clone(&self.exit);
                pass_through(&exit, entity, now, observer);

                if !self.retain {
                    self.processes[pid.index()] = Process::Vacant;
                    self.free.push(pid);
                }
                Ok(())
            }

            (state, wake) => Err(SimError::UnexpectedWake { process: pid, state, wake }),
        }
    }

    /// The flow has its slot: record the grant and sleep for the service time.
    fn begin_service(&mut self, sched: &mut Scheduler, pid: ProcessId) -> SimResult<()> {
        let now = sched.now().as_f64();
        let unit = Arc::clone(self.resource.name());
        let flow = self.flow_mut(pid)?;
        flow.grant_ts = Some(now);
        flow.state = FlowState::Holding;
        let service = flow.service;
        let entity = flow.entity;

        debug!("{entity} entering {unit} at {now}");
        if let Some(wait) = flow.wait().filter(|&w| w > 0.0) {
            debug!("{entity} waited {wait} time units for {unit}");
        }
        sched.schedule_after(pid, service, Wake::Timeout)?;
        Ok(())
    }

    fn flow_mut(&mut self, pid: ProcessId) -> SimResult<&mut FlowProcess> {
        match self.processes.get_mut(pid.index()) {
            Some(Process::Flow(f)) => Ok(f),
            _ => Err(SimError::UnknownProcess(pid)),
        }
    }
}

/// Record an instantaneous pass through a pseudo-unit.
fn pass_through<O: TraceObserver + ?Sized>(unit: &Arc<str>, entity: EntityId, now: f64, observer: &mut O) {
    for occupancy in [1, 0] {
        observer.on_occupancy(&OccupancyRecord { timestamp: now, unit: Arc::clone(unit), occupancy });
    }
    observer.on_stop(&StopRecord {
        entity,
        unit:        Arc::clone(unit),
        request_ts:  now,
        entry_ts:    now,
        exit_ts:     now,
        planned_los: 0.0,
    });
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The simulation runner.
///
/// Holds one independent run: clock, unit, processes and RNG.  Separate `Sim`
/// values share nothing, so batch replications can be built side by side.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    pub config:    SimConfig,
    pub scheduler: Scheduler,
    pub facility:  Facility,
}

impl Sim {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run to `config.horizon`, then call `observer.on_run_end`.
    pub fn run<O: TraceObserver + ?Sized>(&mut self, observer: &mut O) -> SimResult<()> {
        let horizon = self.config.horizon;
        let dispatched = self.run_until(horizon, observer)?;
        observer.on_run_end(self.scheduler.now());
        info!(
            dispatched,
            entities = self.entities_created(),
            completed = self.completed(),
            "run finished at {}",
            self.scheduler.now()
        );
        Ok(())
    }

    /// Dispatch every event due at or before `horizon`; later events are
    /// abandoned and the scheduler closes.
    ///
    /// Returns the number of events dispatched.
    pub fn run_until<O: TraceObserver + ?Sized>(&mut self, horizon: f64, observer: &mut O) -> SimResult<u64> {
        let Sim { scheduler, facility, .. } = self;
        facility.open(scheduler.now(), observer);
        scheduler.run_until(SimTime::new(horizon), |sched, event| facility.resume(sched, event, observer))
    }

    /// Dispatch exactly one event.  Returns `None` when nothing is pending.
    ///
    /// Useful for tests that check invariants between events.
    pub fn step<O: TraceObserver + ?Sized>(&mut self, observer: &mut O) -> SimResult<Option<Event>> {
        self.facility.open(self.scheduler.now(), observer);
        let Some(event) = self.scheduler.advance() else {
            return Ok(None);
        };
        self.facility.resume(&mut self.scheduler, event, observer)?;
        Ok(Some(event))
    }

    #[inline]
    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn resource(&self) -> &Resource {
        &self.facility.resource
    }

    /// Flow processes still in the process table, in slot order.  With flow
    /// retention on (the default) that is every flow, in creation order.
    pub fn flows(&self) -> impl Iterator<Item = &FlowProcess> + '_ {
        self.facility.processes.iter().filter_map(Process::as_flow)
    }

    /// Number of entities created so far.
    pub fn entities_created(&self) -> u32 {
        self.facility.entities
    }

    /// Flows that have released their slot.
    pub fn completed(&self) -> u64 {
        self.facility.releases
    }

    /// Requests made minus releases completed.
    pub fn outstanding_requests(&self) -> u64 {
        self.facility.requests - self.facility.releases
    }
}
