//! CSV output backend.
//!
//! Creates two files per replication in the configured output directory:
//! - `{scenario}_occ_log_rep{rep}.csv`
//! - `{scenario}_stop_log_rep{rep}.csv`
//!
//! plus, via [`write_summary`], one `{scenario}_summary.csv` per batch.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::Writer;
use tracing::info;

use obs_sim::{OccupancyRecord, StopRecord, is_pseudo_unit};

use crate::row::SummaryRow;
use crate::writer::OutputWriter;
use crate::OutputResult;

pub const OCC_LOG_HEADER: [&str; 3] = ["timestamp", "unit", "occupancy"];
pub const STOP_LOG_HEADER: [&str; 7] =
    ["entity", "unit", "request_ts", "entry_ts", "exit_ts", "planned_los", "wait"];

/// Path of the occupancy log for one replication.
pub fn occ_log_path(dir: &Path, scenario: &str, rep: u32) -> PathBuf {
    dir.join(format!("{scenario}_occ_log_rep{rep}.csv"))
}

/// Path of the stop log for one replication.
pub fn stop_log_path(dir: &Path, scenario: &str, rep: u32) -> PathBuf {
    dir.join(format!("{scenario}_stop_log_rep{rep}.csv"))
}

/// Path of the per-batch summary table.
pub fn summary_path(dir: &Path, scenario: &str) -> PathBuf {
    dir.join(format!("{scenario}_summary.csv"))
}

/// Streams one replication's trace to two CSV files.
///
/// Records for the `ENTRY`/`EXIT` pseudo-units are dropped unless `egress`
/// is set.
pub struct CsvWriter {
    occupancy: Writer<File>,
    stops:     Writer<File>,
    egress:    bool,
    finished:  bool,
}

impl CsvWriter {
    /// Create the two log files in `dir` and write the header rows.
    pub fn new(dir: &Path, scenario: &str, rep: u32, egress: bool) -> OutputResult<Self> {
        let mut occupancy = Writer::from_path(occ_log_path(dir, scenario, rep))?;
        occupancy.write_record(OCC_LOG_HEADER)?;

        let mut stops = Writer::from_path(stop_log_path(dir, scenario, rep))?;
        stops.write_record(STOP_LOG_HEADER)?;

        Ok(Self {
            occupancy,
            stops,
            egress,
            finished: false,
        })
    }

    fn keep(&self, unit: &str) -> bool {
        self.egress || !is_pseudo_unit(unit)
    }
}

impl OutputWriter for CsvWriter {
    fn write_occupancy(&mut self, record: &OccupancyRecord) -> OutputResult<()> {
        if !self.keep(&record.unit) {
            return Ok(());
        }
        self.occupancy.write_record(&[
            record.timestamp.to_string(),
            record.unit.to_string(),
            record.occupancy.to_string(),
        ])?;
        Ok(())
    }

    fn write_stop(&mut self, record: &StopRecord) -> OutputResult<()> {
        if !self.keep(&record.unit) {
            return Ok(());
        }
        self.stops.write_record(&[
            record.entity.0.to_string(),
            record.unit.to_string(),
            record.request_ts.to_string(),
            record.entry_ts.to_string(),
            record.exit_ts.to_string(),
            record.planned_los.to_string(),
            record.wait().to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.occupancy.flush()?;
        self.stops.flush()?;
        Ok(())
    }
}

/// Write a batch summary table to `path`, one row per replication and unit.
///
/// Quantile columns are taken from the first row; every row is expected to
/// carry the same quantile levels.
pub fn write_summary(path: &Path, rows: &[SummaryRow]) -> OutputResult<()> {
    let mut w = Writer::from_path(path)?;

    let mut header: Vec<String> = SummaryRow::FIXED_COLUMNS.iter().map(|s| s.to_string()).collect();
    if let Some(first) = rows.first() {
        header.extend(first.occupancy.quantiles.iter().map(|&(p, _)| crate::stats::quantile_label(p)));
    }
    header.extend(SummaryRow::WAIT_COLUMNS.iter().map(|s| s.to_string()));
    w.write_record(&header)?;

    for row in rows {
        w.write_record(row.fields())?;
    }
    w.flush()?;
    info!("summary for {} rows written to {}", rows.len(), path.display());
    Ok(())
}
