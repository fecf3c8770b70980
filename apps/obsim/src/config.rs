//! YAML configuration and its merge with command-line flags.
//!
//! Precedence for every key: command line, then config file, then default.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;
use tracing::{Level, info};

use obs_core::{DEFAULT_UNIT, SimConfig};

use crate::cli::{ErlangArgs, RvsArgs, SimulateArgs};

// ── Defaults ──────────────────────────────────────────────────────────────────

pub const DEFAULT_K:        u32   = 1;
pub const DEFAULT_B:        f64   = 1.0;
pub const DEFAULT_N:        usize = 1;
pub const DEFAULT_STAGES:   u32   = 1;
pub const DEFAULT_RUNTIME:  f64   = 250.0;
pub const DEFAULT_WARMUP:   f64   = 0.0;
pub const DEFAULT_REPS:     u32   = 1;
pub const DEFAULT_SCENARIO: &str  = "baseline";
pub const DEFAULT_LOGLEVEL: &str  = "WARNING";

// ── FileConfig ────────────────────────────────────────────────────────────────

/// Contents of a YAML config file.  Every key is optional; unknown keys are
/// rejected.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub k:                Option<u32>,
    pub b:                Option<f64>,
    pub n:                Option<usize>,
    pub s:                Option<u64>,
    pub arr_rate:         Option<f64>,
    pub mean_los:         Option<f64>,
    pub los_stages:       Option<u32>,
    pub capacity:         Option<usize>,
    pub runtime:          Option<f64>,
    pub warmup:           Option<f64>,
    pub num_replications: Option<u32>,
    pub scenario:         Option<String>,
    pub loglevel:         Option<String>,
    pub output:           Option<PathBuf>,
    pub egress:           Option<bool>,
}

impl FileConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        // An empty document parses as `null`; treat it as "no keys".
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Load `path` if given, otherwise an empty config.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

// ── Log level ─────────────────────────────────────────────────────────────────

/// Map a severity name to a `tracing` level.  Case-insensitive.
pub fn parse_level(name: &str) -> Result<Level> {
    Ok(match name.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Level::TRACE,
        "DEBUG" => Level::DEBUG,
        "INFO" => Level::INFO,
        "WARNING" | "WARN" => Level::WARN,
        "ERROR" | "CRITICAL" => Level::ERROR,
        other => bail!("unknown log level {other:?}"),
    })
}

/// Log level from the command line, else the file, else `WARNING`.
pub fn resolve_level(cli: Option<&str>, file: &FileConfig) -> Result<Level> {
    parse_level(cli.or(file.loglevel.as_deref()).unwrap_or(DEFAULT_LOGLEVEL))
}

// ── Resolved parameters ───────────────────────────────────────────────────────

/// Inputs to the `rvs` command.
#[derive(Debug, Clone, PartialEq)]
pub struct RvsParams {
    pub k:        u32,
    pub b:        f64,
    pub n:        usize,
    pub seed:     Option<u64>,
    pub scenario: String,
    pub output:   Option<PathBuf>,
}

impl RvsParams {
    pub fn resolve(args: &RvsArgs, file: &FileConfig) -> Result<Self> {
        let params = Self {
            k:        args.k.or(file.k).unwrap_or(DEFAULT_K),
            b:        args.b.or(file.b).unwrap_or(DEFAULT_B),
            n:        args.n.or(file.n).unwrap_or(DEFAULT_N),
            seed:     args.s.or(file.s),
            scenario: args.scenario.clone().or_else(|| file.scenario.clone()).unwrap_or_else(|| DEFAULT_SCENARIO.into()),
            output:   args.output.clone().or_else(|| file.output.clone()),
        };
        ensure!(params.k >= 1, "k must be a positive integer, got {}", params.k);
        ensure!(params.b.is_finite() && params.b > 0.0, "b must be a positive real, got {}", params.b);
        ensure!(params.n >= 1, "n must be a positive integer, got {}", params.n);
        info!(?params, "rvs parameters");
        Ok(params)
    }
}

/// Inputs to the `simulate` command.
#[derive(Debug, Clone, PartialEq)]
pub struct RunParams {
    pub sim:              SimConfig,
    pub seed:             Option<u64>,
    pub warmup:           f64,
    pub num_replications: u32,
    pub scenario:         String,
    pub output:           Option<PathBuf>,
    pub egress:           bool,
}

impl RunParams {
    pub fn resolve(args: &SimulateArgs, file: &FileConfig) -> Result<Self> {
        let arr_rate = args.arr_rate.or(file.arr_rate).context("arr_rate is required")?;
        let mean_los = args.mean_los.or(file.mean_los).context("mean_los is required")?;
        let capacity = args.capacity.or(file.capacity).context("capacity is required")?;

        let sim = SimConfig {
            arr_rate,
            mean_los,
            los_stages: args.los_stages.or(file.los_stages).unwrap_or(DEFAULT_STAGES),
            capacity,
            horizon: args.runtime.or(file.runtime).unwrap_or(DEFAULT_RUNTIME),
            unit: DEFAULT_UNIT.to_string(),
        };
        sim.validate()?;

        let params = Self {
            sim,
            seed:             args.s.or(file.s),
            warmup:           args.warmup.or(file.warmup).unwrap_or(DEFAULT_WARMUP),
            num_replications: args.num_replications.or(file.num_replications).unwrap_or(DEFAULT_REPS),
            scenario:         args.scenario.clone().or_else(|| file.scenario.clone()).unwrap_or_else(|| DEFAULT_SCENARIO.into()),
            output:           args.output.clone().or_else(|| file.output.clone()),
            egress:           args.egress.or(file.egress).unwrap_or(false),
        };
        ensure!(
            params.warmup.is_finite() && params.warmup >= 0.0 && params.warmup < params.sim.horizon,
            "warmup must lie in [0, runtime), got {}",
            params.warmup
        );
        ensure!(params.num_replications >= 1, "num_replications must be at least 1");
        info!(?params, "simulation parameters");
        Ok(params)
    }
}

/// Inputs to the `erlang` command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErlangParams {
    pub load:     f64,
    pub capacity: u32,
    /// Mean service time, when known; enables the mean-wait line.
    pub mean_los: Option<f64>,
}

impl ErlangParams {
    pub fn resolve(args: &ErlangArgs, file: &FileConfig) -> Result<Self> {
        fn positive(name: &str, v: Option<f64>) -> Result<Option<f64>> {
            if let Some(v) = v {
                ensure!(v.is_finite() && v > 0.0, "{name} must be a positive real, got {v}");
            }
            Ok(v)
        }

        let arr_rate = positive("arr_rate", args.arr_rate.or(file.arr_rate))?;
        let mean_los = positive("mean_los", args.mean_los.or(file.mean_los))?;

        let load = match (positive("load", args.load)?, arr_rate, mean_los) {
            (Some(load), _, _) => load,
            (None, Some(a), Some(m)) => obs_erlang::offered_load(a, m),
            _ => bail!("either load or both arr_rate and mean_los are required"),
        };
        let capacity = match args.capacity {
            Some(c) => c,
            None => {
                let c = file.capacity.context("capacity is required")?;
                u32::try_from(c).context("capacity does not fit in u32")?
            }
        };
        ensure!(load.is_finite() && load > 0.0, "load must be a positive real, got {load}");
        let params = Self { load, capacity, mean_los };
        info!(?params, "erlang parameters");
        Ok(params)
    }
}
