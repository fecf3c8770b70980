//! Occupancy and waiting-time summaries computed from a run's trace.
//!
//! Occupancy is a step function: each record holds until the next record for
//! the same unit, so every statistic is weighted by that holding time.

use obs_core::SimTime;
use obs_sim::{OccupancyRecord, StopRecord, TraceObserver};

/// Quantile levels reported when none are requested explicitly.
pub const DEFAULT_QUANTILES: [f64; 6] = [0.05, 0.25, 0.5, 0.75, 0.95, 0.99];

/// Column label for quantile level `p`, e.g. `p95_occ`.
pub fn quantile_label(p: f64) -> String {
    format!("p{:02.0}_occ", 100.0 * p)
}

// ── Occupancy ─────────────────────────────────────────────────────────────────

/// Time-weighted occupancy summary for one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyStats {
    pub unit:      String,
    pub capacity:  usize,
    pub mean:      f64,
    /// Population standard deviation.
    pub sd:        f64,
    pub min:       usize,
    pub max:       usize,
    /// `(level, value)` pairs in the order requested.
    pub quantiles: Vec<(f64, f64)>,
}

/// Running occupancy summary for one unit, fed one record at a time.
///
/// Only the time spent at each level is kept, so memory depends on the
/// capacity rather than the run length.  Each level is weighted over
/// `[max(timestamp, warmup), next timestamp)`; the record in effect at
/// `warmup` therefore counts from `warmup` on.
#[derive(Debug, Clone)]
pub struct OccupancyAccumulator {
    unit:     String,
    capacity: usize,
    warmup:   f64,
    /// Time spent at each level, indexed by level.
    weights:  Vec<f64>,
    last:     Option<(f64, usize)>,
    min:      Option<usize>,
    max:      Option<usize>,
}

impl OccupancyAccumulator {
    pub fn new(unit: &str, capacity: usize, warmup: f64) -> Self {
        Self {
            unit: unit.to_string(),
            capacity,
            warmup,
            weights: vec![0.0; capacity + 1],
            last: None,
            min: None,
            max: None,
        }
    }

    /// The unit's level changed to `occupancy` at `timestamp`.  Records must
    /// arrive in time order.
    pub fn push(&mut self, timestamp: f64, occupancy: usize) {
        if let Some((since, level)) = self.last {
            self.credit(since, level, timestamp);
        }
        self.last = Some((timestamp, occupancy));
    }

    fn credit(&mut self, since: f64, level: usize, until: f64) {
        let from = since.max(self.warmup);
        let held = until - from;
        if held > 0.0 {
            if level >= self.weights.len() {
                self.weights.resize(level + 1, 0.0);
            }
            self.weights[level] += held;
        }
        // Instantaneous levels after warmup still count toward the range.
        if since >= self.warmup || held > 0.0 {
            self.min = Some(self.min.map_or(level, |m| m.min(level)));
            self.max = Some(self.max.map_or(level, |m| m.max(level)));
        }
    }

    /// Close the last record at `end_time` and summarize.
    ///
    /// Returns `None` when no time after warmup was observed.
    pub fn finish(mut self, end_time: f64, quantiles: &[f64]) -> Option<OccupancyStats> {
        if let Some((since, level)) = self.last.take() {
            self.credit(since, level, end_time);
        }

        let total: f64 = self.weights.iter().sum();
        if total <= 0.0 {
            return None;
        }
        let levels = || self.weights.iter().enumerate().map(|(x, &w)| (x as f64, w));
        let mean = levels().map(|(x, w)| x * w).sum::<f64>() / total;
        let var = levels().map(|(x, w)| w * (x - mean).powi(2)).sum::<f64>() / total;

        Some(OccupancyStats {
            quantiles: quantiles.iter().map(|&p| (p, weighted_quantile(&self.weights, total, p))).collect(),
            unit: self.unit,
            capacity: self.capacity,
            mean,
            sd: var.sqrt(),
            min: self.min?,
            max: self.max?,
        })
    }
}

/// Summarize the occupancy of `unit` from a complete trace.
///
/// Each record is weighted by the time until the unit's next record; the last
/// one is weighted up to `end_time`.  Time before `warmup` carries no weight.
///
/// Returns `None` when the unit has no records or no time after warmup.
pub fn occupancy_stats(
    records:   &[OccupancyRecord],
    unit:      &str,
    capacity:  usize,
    end_time:  f64,
    warmup:    f64,
    quantiles: &[f64],
) -> Option<OccupancyStats> {
    let mut acc = OccupancyAccumulator::new(unit, capacity, warmup);
    for r in records.iter().filter(|r| &*r.unit == unit) {
        acc.push(r.timestamp, r.occupancy);
    }
    acc.finish(end_time, quantiles)
}

/// Smallest level whose cumulative weight share reaches `p`.
fn weighted_quantile(weights: &[f64], total: f64, p: f64) -> f64 {
    let mut cum = 0.0;
    let mut top = f64::NAN;
    for (x, &w) in weights.iter().enumerate().filter(|&(_, &w)| w > 0.0) {
        cum += w;
        top = x as f64;
        if cum / total >= p {
            return top;
        }
    }
    top
}

// ── Waiting ───────────────────────────────────────────────────────────────────

/// Queueing delay summary for one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitStats {
    pub unit:       String,
    /// Completed stops.
    pub count:      usize,
    /// Stops that waited a positive time before entry.
    pub delayed:    usize,
    /// `delayed / count`; the simulated counterpart of Erlang C.
    pub prob_delay: f64,
    pub mean_wait:  f64,
    pub max_wait:   f64,
}

/// Running wait summary for one unit.
#[derive(Debug, Clone)]
pub struct WaitAccumulator {
    unit:    String,
    count:   usize,
    delayed: usize,
    total:   f64,
    max:     f64,
}

impl WaitAccumulator {
    pub fn new(unit: &str) -> Self {
        Self { unit: unit.to_string(), count: 0, delayed: 0, total: 0.0, max: 0.0 }
    }

    pub fn push(&mut self, wait: f64) {
        self.count += 1;
        if wait > 0.0 {
            self.delayed += 1;
        }
        self.total += wait;
        self.max = self.max.max(wait);
    }

    /// `None` if no stop was pushed.
    pub fn finish(self) -> Option<WaitStats> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(WaitStats {
            unit:       self.unit,
            count:      self.count,
            delayed:    self.delayed,
            prob_delay: self.delayed as f64 / n,
            mean_wait:  self.total / n,
            max_wait:   self.max,
        })
    }
}

/// Summarize the waits of completed stops at `unit`.  `None` if there are none.
pub fn wait_stats(stops: &[StopRecord], unit: &str) -> Option<WaitStats> {
    let mut acc = WaitAccumulator::new(unit);
    for s in stops.iter().filter(|s| &*s.unit == unit) {
        acc.push(s.wait());
    }
    acc.finish()
}

// ── StatsObserver ─────────────────────────────────────────────────────────────

/// A [`TraceObserver`] that summarizes one unit while the run goes, without
/// keeping the trace.
///
/// Occupancy is clipped at `warmup`; only stops requested after `warmup`
/// count toward the wait summary.
#[derive(Debug, Clone)]
pub struct StatsObserver {
    occupancy: OccupancyAccumulator,
    waits:     WaitAccumulator,
    warmup:    f64,
    end_time:  Option<f64>,
}

impl StatsObserver {
    pub fn new(unit: &str, capacity: usize, warmup: f64) -> Self {
        Self {
            occupancy: OccupancyAccumulator::new(unit, capacity, warmup),
            waits:     WaitAccumulator::new(unit),
            warmup,
            end_time:  None,
        }
    }

    /// Summaries for the run.  The occupancy summary ends at the time passed
    /// to `on_run_end`, or at `horizon` if the run never ended.
    pub fn finish(self, horizon: f64, quantiles: &[f64]) -> (Option<OccupancyStats>, Option<WaitStats>) {
        let end_time = self.end_time.unwrap_or(horizon);
        (self.occupancy.finish(end_time, quantiles), self.waits.finish())
    }
}

impl TraceObserver for StatsObserver {
    fn on_occupancy(&mut self, record: &OccupancyRecord) {
        if *record.unit == *self.occupancy.unit {
            self.occupancy.push(record.timestamp, record.occupancy);
        }
    }

    fn on_stop(&mut self, record: &StopRecord) {
        if *record.unit == *self.waits.unit && record.request_ts > self.warmup {
            self.waits.push(record.wait());
        }
    }

    fn on_run_end(&mut self, end_time: SimTime) {
        self.end_time = Some(end_time.as_f64());
    }
}
