//! obsim — observation-unit queueing simulation with Erlang B / C cross-checks.
//!
//! ```text
//! obsim rvs -k 3 -b 2.0 -n 1000 -s 42 -o rvs.csv
//! obsim simulate --arr-rate 0.4 --mean-los 3 -c 2 --runtime 10000 -s 6353 --reps 5 -o output/
//! obsim erlang --load 1.2 -c 2
//! obsim --config scenario.yaml simulate --reps 10
//! ```
//!
//! Every parameter may also come from the `--config` YAML file; flags given
//! on the command line win.

mod cli;
mod config;


use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use obs_core::SimRng;
use obs_erlang::{ErlangError, erlang_b, erlang_c, mmc_mean_wait, traffic_intensity};
use obs_output::{
    CsvWriter, DEFAULT_QUANTILES, StatsObserver, SummaryRow, TraceOutputObserver, summary_path,
    write_summary, write_variates, write_variates_to_path,
};
use obs_rvs::generate_rvs;
use obs_sim::SimBuilder;

use cli::{Cli, Command};
use config::{ErlangParams, FileConfig, RunParams, RvsParams, resolve_level};

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let file = FileConfig::load_optional(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_max_level(resolve_level(cli.loglevel.as_deref(), &file)?)
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Rvs(args) => run_rvs(&RvsParams::resolve(args, &file)?),
        Command::Simulate(args) => run_simulate(&RunParams::resolve(args, &file)?),
        Command::Erlang(args) => run_erlang(&ErlangParams::resolve(args, &file)?),
    }
}

// ── rvs ───────────────────────────────────────────────────────────────────────

/// Where `rvs` writes: the given file, `{scenario}_rvs.csv` inside the given
/// directory, or standard output.
fn rvs_target(p: &RvsParams) -> Option<PathBuf> {
    let out = p.output.as_ref()?;
    if out.is_dir() {
        Some(out.join(format!("{}_rvs.csv", p.scenario)))
    } else {
        Some(out.clone())
    }
}

fn run_rvs(p: &RvsParams) -> Result<()> {
    let rvs = generate_rvs(p.k, p.b, p.n, p.seed)?;
    match rvs_target(p) {
        Some(path) => write_variates_to_path(&path, &rvs)?,
        None => write_variates(&mut io::stdout().lock(), &rvs)?,
    }
    Ok(())
}

// ── simulate ──────────────────────────────────────────────────────────────────

/// `{scenario}_config.yaml` inside `dir`.
fn config_path(dir: &Path, scenario: &str) -> PathBuf {
    dir.join(format!("{scenario}_config.yaml"))
}

/// Save the resolved run parameters next to the logs they produced.
fn write_run_config(dir: &Path, p: &RunParams) -> Result<()> {
    let path = config_path(dir, &p.scenario);
    let text = serde_yaml::to_string(&p.sim)?;
    fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "run config written");
    Ok(())
}

/// Run every replication and return one summary row per replication that
/// recorded occupancy after warmup.
///
/// Statistics are computed while each run goes, so nothing grows with the
/// horizon apart from the CSV logs on disk.
fn simulate_replications(p: &RunParams) -> Result<Vec<SummaryRow>> {
    if let Some(dir) = &p.output {
        fs::create_dir_all(dir).with_context(|| format!("creating output directory {}", dir.display()))?;
        write_run_config(dir, p)?;
    }

    let unit = p.sim.unit.as_str();
    let mut master = SimRng::from_seed(p.seed);
    let mut rows = Vec::with_capacity(p.num_replications as usize);
    let t0 = Instant::now();

    for rep in 1..=p.num_replications {
        let mut sim = SimBuilder::new(p.sim.clone())
            .rng(master.child(u64::from(rep)))
            .retain_flows(false)
            .build()?;

        let mut stats = StatsObserver::new(unit, p.sim.capacity, p.warmup);
        match &p.output {
            Some(dir) => run_logged(&mut sim, &mut stats, dir, p, rep)?,
            None => sim.run(&mut stats)?,
        }

        let (occupancy, wait) = stats.finish(p.sim.horizon, &DEFAULT_QUANTILES);
        let Some(occupancy) = occupancy else {
            warn!(rep, "no occupancy recorded after warmup; replication skipped");
            continue;
        };

        rows.push(SummaryRow {
            scenario: p.scenario.clone(),
            rep,
            occupancy,
            wait,
        });
    }

    info!(
        reps = p.num_replications,
        elapsed_s = t0.elapsed().as_secs_f64(),
        "replications finished"
    );

    if let Some(dir) = &p.output {
        write_summary(&summary_path(dir, &p.scenario), &rows)?;
    }
    Ok(rows)
}

/// Run one replication while streaming its trace to CSV.
fn run_logged(
    sim:   &mut obs_sim::Sim,
    stats: &mut StatsObserver,
    dir:   &Path,
    p:     &RunParams,
    rep:   u32,
) -> Result<()> {
    let writer = CsvWriter::new(dir, &p.scenario, rep, p.egress)?;
    let mut obs = (stats, TraceOutputObserver::new(writer));
    sim.run(&mut obs)?;
    if let Some(e) = obs.1.take_error() {
        return Err(e).with_context(|| format!("writing trace logs for rep {rep}"));
    }
    Ok(())
}

fn run_simulate(p: &RunParams) -> Result<()> {
    let rows = simulate_replications(p)?;

    println!("=== obsim — scenario {} ===", p.scenario);
    println!(
        "arr_rate: {}  |  mean_los: {}  |  los_stages: {}  |  capacity: {}",
        p.sim.arr_rate, p.sim.mean_los, p.sim.los_stages, p.sim.capacity
    );
    println!(
        "runtime: {}  |  warmup: {}  |  reps: {}",
        p.sim.horizon, p.warmup, p.num_replications
    );
    println!();

    println!(
        "{:<5} {:>10} {:>8} {:>8} {:>8} {:>8} {:>11} {:>10}",
        "Rep", "mean_occ", "sd_occ", "p95_occ", "max_occ", "stops", "prob_delay", "mean_wait"
    );
    println!("{}", "-".repeat(75));
    for row in &rows {
        let occ = &row.occupancy;
        let p95 = occ.quantiles.iter().find(|&&(q, _)| q == 0.95).map_or(f64::NAN, |&(_, v)| v);
        let (stops, prob_delay, mean_wait) =
            row.wait.as_ref().map_or((0, f64::NAN, f64::NAN), |w| (w.count, w.prob_delay, w.mean_wait));
        println!(
            "{:<5} {:>10.4} {:>8.4} {:>8} {:>8} {:>8} {:>11.4} {:>10.4}",
            row.rep, occ.mean, occ.sd, p95, occ.max, stops, prob_delay, mean_wait
        );
    }
    println!();

    let n = rows.len().max(1) as f64;
    let mean_occ = rows.iter().map(|r| r.occupancy.mean).sum::<f64>() / n;
    let waits: Vec<_> = rows.iter().filter_map(|r| r.wait.as_ref()).collect();
    let wn = waits.len().max(1) as f64;
    let prob_delay = waits.iter().map(|w| w.prob_delay).sum::<f64>() / wn;
    let mean_wait = waits.iter().map(|w| w.mean_wait).sum::<f64>() / wn;

    let load = p.sim.offered_load();
    let servers = u32::try_from(p.sim.capacity).context("capacity does not fit in u32")?;

    println!("{:<22} {:>12} {:>12}", "", "simulated", "M/M/c");
    println!("{}", "-".repeat(48));
    println!("{:<22} {:>12.4} {:>12.4}", "mean occupancy", mean_occ, load);
    match (erlang_c(load, servers), mmc_mean_wait(load, servers, p.sim.mean_los)) {
        (Ok(c), Ok(wq)) => {
            println!("{:<22} {:>12.4} {:>12.4}", "P(delay)", prob_delay, c);
            println!("{:<22} {:>12.4} {:>12.4}", "mean wait", mean_wait, wq);
        }
        (Err(e), _) | (_, Err(e)) => {
            println!("{:<22} {:>12.4} {:>12}", "P(delay)", prob_delay, "n/a");
            println!("{:<22} {:>12.4} {:>12}", "mean wait", mean_wait, "n/a");
            println!("({e})");
        }
    }
    if p.sim.los_stages > 1 {
        println!("(M/M/c column assumes exponential length of stay)");
    }
    Ok(())
}

// ── erlang ────────────────────────────────────────────────────────────────────

fn run_erlang(p: &ErlangParams) -> Result<()> {
    let rho = traffic_intensity(p.load, p.capacity);
    let b = erlang_b(p.load, p.capacity)?;

    println!("load:     {:.4} erlangs", p.load);
    println!("servers:  {}", p.capacity);
    println!("rho:      {rho:.4}");
    println!("Erlang B: {b:.6}");

    match erlang_c(p.load, p.capacity) {
        Ok(c) => println!("Erlang C: {c:.6}"),
        Err(e @ ErlangError::Saturated { .. }) => {
            println!("Erlang C: undefined");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    }

    if let Some(mean_los) = p.mean_los {
        let wq = mmc_mean_wait(p.load, p.capacity, mean_los)?;
        println!("Wq:       {wq:.6}");
    }
    Ok(())
}
