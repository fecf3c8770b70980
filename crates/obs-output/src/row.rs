//! Plain data rows written to the batch summary table.

use crate::stats::{OccupancyStats, WaitStats};

/// One replication's summary for one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub scenario:  String,
    pub rep:       u32,
    pub occupancy: OccupancyStats,
    /// `None` when no stop completed at the unit.
    pub wait:      Option<WaitStats>,
}

impl SummaryRow {
    pub const FIXED_COLUMNS: [&str; 8] =
        ["scenario", "rep", "unit", "capacity", "mean_occ", "sd_occ", "min_occ", "max_occ"];
    pub const WAIT_COLUMNS: [&str; 4] = ["num_stops", "prob_delay", "mean_wait", "max_wait"];

    /// Field values in column order.  Missing wait stats become empty cells.
    pub fn fields(&self) -> Vec<String> {
        let occ = &self.occupancy;
        let mut out = vec![
            self.scenario.clone(),
            self.rep.to_string(),
            occ.unit.clone(),
            occ.capacity.to_string(),
            occ.mean.to_string(),
            occ.sd.to_string(),
            occ.min.to_string(),
            occ.max.to_string(),
        ];
        out.extend(occ.quantiles.iter().map(|&(_, v)| v.to_string()));
        match &self.wait {
            Some(w) => out.extend([
                w.count.to_string(),
                w.prob_delay.to_string(),
                w.mean_wait.to_string(),
                w.max_wait.to_string(),
            ]),
            None => out.extend(std::iter::repeat_n(String::new(), Self::WAIT_COLUMNS.len())),
        }
        out
    }
}
