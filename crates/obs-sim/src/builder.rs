//! Fluent builder for constructing a [`Sim`].

use obs_core::{SimConfig, SimRng};
use obs_rvs::{ServiceDistribution, exp_dist};

use crate::sim::Facility;
use crate::{Resource, Scheduler, Sim, SimError, SimResult};

/// Fluent builder for [`Sim`].
///
/// # Optional inputs (have defaults)
///
/// | Method                   | Default                                   |
/// |--------------------------|-------------------------------------------|
/// | `.rng(r)` / `.seed(s)`   | Unseeded `SimRng` (logs a warning)        |
/// | `.poisson_arrivals(b)`   | `true`                                    |
/// | `.arrival(at, service)`  | No fixed arrivals                         |
/// | `.retain_flows(b)`       | `true`                                    |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(SimConfig::new(0.4, 3.0, 2, 250.0))
///     .seed(6353)
///     .build()?;
/// sim.run(&mut TraceCollector::new())?;
/// ```
pub struct SimBuilder {
    config:   SimConfig,
    rng:      Option<SimRng>,
    poisson:  bool,
    arrivals: Vec<(f64, f64)>,
    retain:   bool,
}

impl SimBuilder {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            rng:      None,
            poisson:  true,
            arrivals: Vec::new(),
            retain:   true,
        }
    }

    /// Use `rng` for every arrival and service draw.
    pub fn rng(mut self, rng: SimRng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Shorthand for `.rng(SimRng::new(seed))`.
    pub fn seed(self, seed: u64) -> Self {
        self.rng(SimRng::new(seed))
    }

    /// Enable or disable the Poisson arrival generator.
    ///
    /// With the generator off, only arrivals added via [`arrival`][Self::arrival]
    /// enter the system.
    pub fn poisson_arrivals(mut self, enabled: bool) -> Self {
        self.poisson = enabled;
        self
    }

    /// Add an entity that arrives at absolute time `at` and stays `service`.
    ///
    /// Fixed arrivals at equal times start in the order they were added.
    pub fn arrival(mut self, at: f64, service: f64) -> Self {
        self.arrivals.push((at, service));
        self
    }

    /// Keep finished flows in the process table (the default).
    ///
    /// Turn off for long runs whose trace goes to an observer: finished
    /// slots are then reused and the table stays as large as the peak
    /// number of flows in the system.
    pub fn retain_flows(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    /// Validate inputs, register the initial processes, and return a
    /// ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim> {
        self.config.validate()?;

        for &(at, service) in &self.arrivals {
            if !(at.is_finite() && at >= 0.0) {
                return Err(SimError::Config(format!("arrival time must be finite and >= 0, got {at}")));
            }
            if !(service.is_finite() && service >= 0.0) {
                return Err(SimError::Config(format!("service time must be finite and >= 0, got {service}")));
            }
        }

        // ── Distributions ─────────────────────────────────────────────────
        let arrivals = if self.poisson {
            Some(exp_dist(self.config.arr_rate)?)
        } else {
            None
        };
        let service = ServiceDistribution::new(self.config.los_stages, self.config.mean_los)?;
        let rng = self.rng.unwrap_or_else(|| SimRng::from_seed(None));

        // ── Initial processes ─────────────────────────────────────────────
        let mut scheduler = Scheduler::new();
        let resource = Resource::new(self.config.unit.as_str(), self.config.capacity);
        let mut facility = Facility::new(resource, rng, arrivals, service, self.retain);

        if self.poisson {
            facility.start_generator(&mut scheduler)?;
        }
        for (at, service) in self.arrivals {
            facility.spawn_flow(&mut scheduler, service, at)?;
        }

        Ok(Sim {
            config: self.config,
            scheduler,
            facility,
        })
    }
}
