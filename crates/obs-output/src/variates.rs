//! Plain-text export of random variates.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::OutputResult;

/// Write one value per line in `%.18e` notation.
pub fn write_variates<W: Write>(out: &mut W, values: &[f64]) -> OutputResult<()> {
    for v in values {
        writeln!(out, "{v:.18e}")?;
    }
    out.flush()?;
    Ok(())
}

/// Create (or truncate) `path` and write `values` to it.
pub fn write_variates_to_path(path: &Path, values: &[f64]) -> OutputResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_variates(&mut out, values)?;
    info!("{} random variates written to {}", values.len(), path.display());
    Ok(())
}
