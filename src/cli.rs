/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The CLI front end (A4): a `clap`-derive binary wrapping
[`ls_packing::driver::run_packing`].

Grounded on the original's leading-dash mode flag (`-ls`, `-lsgd`, …) but
expressed as `clap` subcommands the way the teacher's `webgraph` binary
dispatches `build-ef`/`convert`/`transpose`/… — a deliberate idiomatic-Rust
adaptation (§6, REDESIGN): subcommands are how mode selection is
conventionally expressed in the Rust CLI ecosystem, where the original's
flag style is a C++ getopt convention. `-md`/`-mdi`/`-fba`/`-ojt` are kept
as named subcommands purely so selecting them produces a clear
`ConfigError` rather than "unrecognized subcommand" (§6).

*/

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ls_packing::config::GenerationConfig;
use ls_packing::driver::{run_packing, RunOptions, RunReport, StrategyKind};
use ls_packing::io::{apply_diameters, read_diameters, read_packing, write_packing, write_packing_info, PackingInfo};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ls-packing", about = "Generates jammed hard-sphere packings by event-driven molecular dynamics.")]
pub struct Cli {
    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand)]
pub enum Mode {
    /// Simple Lubachevsky-Stillinger: grow until the reduced pressure diverges.
    Ls(RunArgs),
    /// Gradual densification: suppress growth to equilibrate, then resume at a decayed rate.
    Lsgd(RunArgs),
    /// Equilibration between compressions: resume at the initial rate once pressure stabilizes.
    Lsebc(RunArgs),
    /// Constant-power: continuously retarget the growth rate to a fixed compression power.
    Lscp(RunArgs),
    /// Biazzo et al. (2009) fixed pressure-threshold growth-rate table.
    Lsb(RunArgs),
    /// Equilibration-only generator (molecular dynamics). Not implemented by this core.
    Md(UnsupportedArgs),
    /// Equilibration-only generator, inertia variant. Not implemented by this core.
    Mdi(UnsupportedArgs),
    /// Force-biased generator. Not implemented by this core.
    Fba(UnsupportedArgs),
    /// Jodrey-Tory generator. Not implemented by this core.
    Ojt(UnsupportedArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Path to a `generation.conf`-style config file.
    #[arg(long, default_value = "generation.conf")]
    pub config: PathBuf,

    /// Initial packing, `packing.xyzd` format.
    #[arg(long, default_value = "packing.init.xyzd")]
    pub input_packing: PathBuf,

    /// Diameters sidecar, one ASCII float per line; defaults to 1.0 if absent.
    #[arg(long, default_value = "diameters")]
    pub diameters: PathBuf,

    /// Where to write the final packing.
    #[arg(long, default_value = "packing.xyzd")]
    pub output_packing: PathBuf,

    /// Where to write the end-of-run summary.
    #[arg(long, default_value = "packing.nfo")]
    pub info: PathBuf,

    /// Only log warnings and errors.
    #[arg(long)]
    pub suppress: bool,

    /// Overrides `generation.conf`'s `Contraction rate`.
    #[arg(long)]
    pub contraction_rate: Option<f64>,

    /// Stops after this many cycles regardless of termination criteria.
    #[arg(long)]
    pub max_cycles: Option<u64>,

    /// Stops (returning a non-zero exit code) after this many seconds of wall-clock time.
    #[arg(long)]
    pub wall_clock_cap_secs: Option<u64>,

    /// Target temperature for the velocity thermostat.
    #[arg(long, default_value_t = 0.1)]
    pub temperature: f64,
}

/// Absorbs any arguments for a named-but-unsupported mode so `clap` parses
/// it successfully and lets `main` turn it into a `ConfigError`.
#[derive(Args)]
pub struct UnsupportedArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<String>,
}

fn strategy_for(mode: &Mode) -> Option<StrategyKind> {
    match mode {
        Mode::Ls(_) => Some(StrategyKind::Simple),
        Mode::Lsgd(_) => Some(StrategyKind::GradualDensification),
        Mode::Lsebc(_) => Some(StrategyKind::EquilibrationBetweenCompressions),
        Mode::Lscp(_) => Some(StrategyKind::ConstantPower),
        Mode::Lsb(_) => Some(StrategyKind::Biazzo),
        Mode::Md(_) | Mode::Mdi(_) | Mode::Fba(_) | Mode::Ojt(_) => None,
    }
}

fn run_args(mode: &Mode) -> Option<&RunArgs> {
    match mode {
        Mode::Ls(args) | Mode::Lsgd(args) | Mode::Lsebc(args) | Mode::Lscp(args) | Mode::Lsb(args) => Some(args),
        Mode::Md(_) | Mode::Mdi(_) | Mode::Fba(_) | Mode::Ojt(_) => None,
    }
}

pub fn main(cli: Cli) -> Result<()> {
    let strategy_kind = strategy_for(&cli.mode).ok_or_else(|| {
        anyhow::anyhow!(ls_packing::error::PackingError::Config(
            "this generator mode (-md/-mdi/-fba/-ojt) is out of scope for this core; only -ls/-lsgd/-lsebc/-lscp/-lsb are implemented".into()
        ))
    })?;
    let args = run_args(&cli.mode).expect("strategy_for returned Some implies run_args does too");

    if !args.suppress {
        log::info!("reading config from {}", args.config.display());
    }
    let mut config = GenerationConfig::read(&args.config).with_context(|| format!("reading config {}", args.config.display()))?;
    if let Some(rate) = args.contraction_rate {
        config.contraction_rate = rate;
    }

    let mut packing = read_packing(&args.input_packing).with_context(|| format!("reading initial packing {}", args.input_packing.display()))?;
    let diameters = read_diameters(&args.diameters).with_context(|| format!("reading diameters {}", args.diameters.display()))?;
    apply_diameters(&mut packing, diameters.as_deref())?;

    let options = RunOptions {
        temperature: args.temperature,
        wall_clock_cap: args.wall_clock_cap_secs.map(Duration::from_secs),
        max_cycles: args.max_cycles,
    };

    let start = std::time::Instant::now();
    let report: RunReport = run_packing(&config, packing, strategy_kind, options)?;
    let elapsed = start.elapsed();

    log::info!(
        "stopped after {} cycles: {:?}, final density ratio {:.6}, reduced pressure {:.3e}",
        report.cycles_run,
        report.stop_reason,
        report.final_inner_diameter_ratio,
        report.final_reduced_pressure,
    );
    for change in &report.rate_changes {
        log::info!("cycle {}: ratioGrowthRate {} -> {}", change.cycle, change.old_rate, change.new_rate);
    }

    write_packing(&args.output_packing, &report.final_packing).with_context(|| format!("writing final packing {}", args.output_packing.display()))?;

    let particles_volume: f64 = report.final_packing.iter().map(|p| (std::f64::consts::PI / 6.0) * p.diameter.powi(3)).sum();
    let box_volume = config.packing_size.0.iter().product::<f64>();
    let info = PackingInfo {
        particles_count: report.final_packing.len(),
        box_: ls_packing::geometry::PeriodicBox::new(config.packing_size),
        theoretical_porosity: 1.0 - particles_volume / box_volume,
        calculated_porosity: 1.0 - particles_volume * report.final_inner_diameter_ratio.powi(3) / box_volume,
        tolerance: 1e-14,
        total_wall_clock_seconds: elapsed.as_secs_f64(),
        iterations_count: report.cycles_run,
    };
    write_packing_info(&args.info, &info).with_context(|| format!("writing packing info {}", args.info.display()))?;

    Ok(())
}
