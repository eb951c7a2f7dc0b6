/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The EDMD driver (C7): the outer per-cycle loop a compression run actually
executes, wrapping [`crate::scheduler::Scheduler`].

Grounded on
`Generation/PackingGenerators/LubachevsckyStillinger/Source/LubachevsckyStillingerStep.cpp`'s
`DisplaceParticles` / `ProcessEvents` / `CalculateStatistics` / `ResetTime` /
`DisplaceRealParticles`. One [`Driver::run_cycle`] call performs, in the
order the original's comment calls "very crucial, very interdependent":
process `eventsPerParticle * N` events, rescale velocities, reset the time
origin (folding it into the collision calculus' diameter-ratio baseline),
recompute every particle's scheduled event from scratch, copy state back to
the external packing, check the closest-pair invariant, then consult the
compression strategy for the next cycle's growth rate.

*/

use crate::collision::CollisionCalculus;
use crate::config::GenerationConfig;
use crate::equilibration::{CycleReport, EquilibrationChain, EquilibrationStatus};
use crate::error::{PackingError, Result};
use crate::geometry::PeriodicBox;
use crate::neighbors::verlet::VerletListNeighborProvider;
use crate::particle::Packing;
use crate::processors::{CollisionEventProcessor, EventProcessor, MoveEventProcessor, NeighborTransferEventProcessor, WallTransferEventProcessor};
use crate::providers::{CollisionEventProvider, EventProvider, NeighborTransferEventProvider, WallTransferEventProvider};
use crate::scheduler::Scheduler;
use crate::strategies::{
    Biazzo, CompressionContext, CompressionStrategy, ConstantPower, EquilibrationBetweenCompressions, GradualDensification, RateChangeEvent, Simple,
    MAX_PRESSURE,
};
use crate::velocity::VelocityService;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f64::consts::PI;
use std::time::{Duration, Instant};

/// `eventsPerParticle` in the original: how many events make up one cycle,
/// scaled by particle count.
const EVENTS_PER_PARTICLE: u64 = 20;

/// Tolerance the closest-pair invariant is checked against (§8, Testable
/// Property 1; `1e-14` in `DisplaceRealParticles`).
const CLOSEST_PAIR_TOLERANCE: f64 = 1e-14;

/// Statistics measured over one cycle, mirroring the original's
/// `Statistics` struct fields that survive into this port.
#[derive(Debug, Clone, Copy)]
pub struct CycleStatistics {
    pub events_count: u64,
    pub kinetic_energy: f64,
    pub time_period: f64,
    pub reduced_pressure: f64,
    pub collision_errors_existed: bool,
    /// The raw, signed momentum exchange the pressure estimator took the
    /// absolute value of (§9, "Sign of exchanged momentum"); occasionally
    /// negative, kept here purely as a diagnostic.
    pub signed_exchanged_momentum: f64,
}

/// Why a [`Driver::run`] call stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopReason {
    /// The compression strategy's pressure ceiling was crossed with no
    /// further rate decrease available: the packing is jammed.
    Jammed,
    /// `max_cycles` was reached before the strategy signalled completion.
    MaxCyclesReached,
    /// An equilibration gatherer chain reported `EnoughStatistics`.
    Equilibrated,
    /// An equilibration gatherer chain reported `ErrorsFound`.
    EquilibrationErrors,
}

/// The final outcome of a full run: the packing itself plus the bookkeeping
/// a caller (the CLI front end, or a test) needs to report on it.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub stop_reason: StopReason,
    pub cycles_run: u64,
    pub final_packing: Packing,
    pub final_inner_diameter_ratio: f64,
    pub final_reduced_pressure: f64,
    pub rate_changes: Vec<RateChangeEvent>,
}

/// Drives a [`Scheduler`] through compression cycles under one
/// [`CompressionStrategy`], optionally bounded by a wall-clock cap and/or
/// an equilibration gatherer chain.
///
/// Grounded on `LubachevsckyStillingerStep`, which plays exactly this role
/// around its owned `eventsQueue`/`movingParticles`.
pub struct Driver {
    scheduler: Scheduler,
    strategy: Box<dyn CompressionStrategy>,
    context: CompressionContext,
    equilibration: Option<EquilibrationChain>,
    rate_changes: Vec<RateChangeEvent>,
    events_per_particle: u64,
    wall_clock_cap: Option<Duration>,
    cycles_run: u64,
    /// Sum of the per-cycle time origins [`Scheduler::reset_time`] has
    /// folded away, i.e. total elapsed simulation time since the run
    /// began — used only to timestamp [`RateChangeEvent`]s, since the
    /// scheduler's own clock is zeroed every cycle.
    total_simulated_time: f64,
}

impl Driver {
    /// `particles_volume` is the sum of the real sphere volumes of the
    /// nominal (diameter-ratio 1) packing, i.e. `sum(pi/6 * d_i^3)`;
    /// [`Driver::new`] derives it from the scheduler's own starting
    /// packing (grounded on `GeometryService::GetParticlesVolume`, whose
    /// call site in `PackingGenerator::SetParticles` measures the packing
    /// exactly once, before any growth).
    pub fn new(
        scheduler: Scheduler,
        strategy: Box<dyn CompressionStrategy>,
        initial_contraction_rate: f64,
        final_contraction_rate: f64,
        contraction_rate_decrease_factor: f64,
    ) -> Self {
        let particles_volume: f64 = scheduler.particles().iter().map(|p| (PI / 6.0) * p.diameter.powi(3)).sum();
        let box_volume = scheduler.box_().volume();

        let context = CompressionContext {
            particles_volume,
            box_volume,
            initial_contraction_rate,
            final_contraction_rate,
            contraction_rate_decrease_factor,
        };

        Driver {
            scheduler,
            strategy,
            context,
            equilibration: None,
            rate_changes: Vec::new(),
            events_per_particle: EVENTS_PER_PARTICLE,
            wall_clock_cap: None,
            cycles_run: 0,
            total_simulated_time: 0.0,
        }
    }

    /// Switches termination to an equilibration gatherer chain instead of
    /// (or alongside) the compression strategy's own `should_continue`
    /// verdict — the `-mdi`/`-md` modes of §4.8. Not exercised by the CLI
    /// front end (those modes are out of scope per §1), but kept as a
    /// library entry point so the gatherer chain is actually reachable.
    pub fn with_equilibration(mut self, chain: EquilibrationChain) -> Self {
        self.equilibration = Some(chain);
        self
    }

    pub fn with_wall_clock_cap(mut self, cap: Duration) -> Self {
        self.wall_clock_cap = Some(cap);
        self
    }

    pub fn rate_changes(&self) -> &[RateChangeEvent] {
        &self.rate_changes
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Runs exactly one cycle: `ProcessEvents` + `RescaleVelocities` +
    /// `ResetTime` + `InitializeEvents` + `DisplaceRealParticles`, in that
    /// order. Does not consult the compression strategy or equilibration
    /// chain — callers needing full termination logic should use
    /// [`Driver::run`].
    pub fn run_cycle(&mut self) -> CycleStatistics {
        let particle_count = self.scheduler.particles().len() as u64;
        let max_events = self.events_per_particle * particle_count;

        let momentum_before = self.scheduler.exchanged_momentum();
        let stats = self.scheduler.run_cycle(max_events);
        let signed_exchanged_momentum = self.scheduler.exchanged_momentum() - momentum_before;

        // `CalculateStatistics` reads the kinetic energy *before*
        // `RescaleVelocities` runs (the original's comment calls this
        // ordering "very crucial, very interdependent"): growth impulses
        // inject energy over the cycle, so the post-rescale energy is
        // always exactly `E*` and would make `p_red` pressure-blind to
        // that injected energy.
        let kinetic_energy = self.scheduler.velocity_service().actual_kinetic_energy(self.scheduler.particles());
        self.scheduler.rescale_velocities();

        let time_period = stats.final_time;
        let reduced_pressure = if time_period > 0.0 {
            1.0 + stats.exchanged_momentum_abs / (2.0 * kinetic_energy * time_period)
        } else {
            1.0
        };

        let origin = self.scheduler.reset_time();
        self.total_simulated_time += origin;
        if origin > 0.0 {
            let new_initial_ratio = self.scheduler.collision_calculus().inner_diameter_ratio(origin);
            let rate = self.scheduler.collision_calculus().ratio_growth_rate;
            self.scheduler.set_collision_calculus(CollisionCalculus::new(new_initial_ratio, rate));
        }
        self.scheduler.recompute_all_events();

        let collision_errors_existed = self.check_closest_pair_invariant();

        CycleStatistics {
            events_count: stats.events_processed,
            kinetic_energy,
            time_period,
            reduced_pressure,
            collision_errors_existed,
            signed_exchanged_momentum,
        }
    }

    /// `DisplaceRealParticles`'s invariant check: the closest pair found by
    /// the independent `O(N^2)` scan, normalized by that pair's own
    /// `(d_i + d_j)/2` (mirroring `sqrt(closestPair.normalizedDistanceSquare)`,
    /// not the raw center distance, since only monodisperse nominal
    /// diameter 1 makes those the same value), must not be closer than the
    /// diameter ratio the collision calculus expects, beyond floating-point
    /// noise. Logs a warning and returns `true` (rather than aborting the
    /// run) on violation, matching the original's `collisionErrorsExisted`
    /// flag.
    fn check_closest_pair_invariant(&self) -> bool {
        let expected_ratio = self.scheduler.collision_calculus().inner_diameter_ratio(self.scheduler.current_time());
        match self.scheduler.closest_pair() {
            Some((i, j, distance)) => {
                let particles = self.scheduler.particles();
                let radii_sum = (particles[i].diameter + particles[j].diameter) * 0.5;
                let actual = distance / radii_sum;
                if actual < expected_ratio - CLOSEST_PAIR_TOLERANCE {
                    log::warn!(
                        "innerDiameterRatio incorrect: actual {actual:.15}, expected {expected_ratio:.15}. Closest pair: {i}, {j}"
                    );
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    /// Runs cycles until the compression strategy (and, if present, the
    /// equilibration chain) says to stop, or `max_cycles`/the wall-clock
    /// cap is hit.
    pub fn run(&mut self, max_cycles: Option<u64>) -> Result<RunReport> {
        let start = Instant::now();
        if let Some(chain) = self.equilibration.as_mut() {
            chain.start();
        }

        loop {
            if let Some(cap) = self.wall_clock_cap {
                let elapsed = start.elapsed();
                if elapsed > cap {
                    return Err(PackingError::Timeout { elapsed_secs: elapsed.as_secs_f64(), cap_secs: cap.as_secs_f64() });
                }
            }

            let stats = self.run_cycle();
            self.cycles_run += 1;

            let current_rate = self.scheduler.collision_calculus().ratio_growth_rate;
            let current_ratio = self.scheduler.collision_calculus().inner_diameter_ratio(0.0);
            let decision = self.strategy.after_cycle(&self.context, current_rate, current_ratio, stats.reduced_pressure);

            if let Some(new_rate) = decision.new_ratio_growth_rate {
                self.rate_changes.push(RateChangeEvent {
                    cycle: self.cycles_run,
                    at_time: self.total_simulated_time,
                    old_rate: current_rate,
                    new_rate,
                });
                log::info!("cycle {}: ratioGrowthRate {current_rate} -> {new_rate}", self.cycles_run);
                let initial_ratio = self.scheduler.collision_calculus().inner_diameter_ratio(0.0);
                self.scheduler.set_collision_calculus(CollisionCalculus::new(initial_ratio, new_rate));
                self.scheduler.recompute_all_events();
            }

            let equilibration_status = self.equilibration.as_mut().map(|chain| {
                let report = CycleReport { reduced_pressure: stats.reduced_pressure, collision_errors_existed: stats.collision_errors_existed };
                chain.process_step(&self.scheduler.to_packing(), &report)
            });

            let stop_reason = match equilibration_status {
                Some(EquilibrationStatus::ErrorsFound) => Some(StopReason::EquilibrationErrors),
                Some(EquilibrationStatus::EnoughStatistics) => Some(StopReason::Equilibrated),
                _ => {
                    if !decision.should_continue {
                        Some(StopReason::Jammed)
                    } else if max_cycles.map(|cap| self.cycles_run >= cap).unwrap_or(false) {
                        Some(StopReason::MaxCyclesReached)
                    } else {
                        None
                    }
                }
            };

            if let Some(stop_reason) = stop_reason {
                return Ok(RunReport {
                    stop_reason,
                    cycles_run: self.cycles_run,
                    final_packing: self.scheduler.to_packing(),
                    final_inner_diameter_ratio: self.scheduler.collision_calculus().inner_diameter_ratio(0.0),
                    final_reduced_pressure: stats.reduced_pressure,
                    rate_changes: self.rate_changes.clone(),
                });
            }

            if stats.reduced_pressure >= MAX_PRESSURE * 1e6 {
                log::error!("reduced pressure diverging without bound at cycle {}", self.cycles_run);
            }
        }
    }
}

/// Which compression-rate control strategy to run with — the CLI front
/// end's subcommand selection (§6), reified so the library entry point
/// below doesn't need to know about `clap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Simple,
    GradualDensification,
    EquilibrationBetweenCompressions,
    ConstantPower,
    Biazzo,
}

impl StrategyKind {
    fn build(self) -> Box<dyn CompressionStrategy> {
        match self {
            StrategyKind::Simple => Box::new(Simple),
            StrategyKind::GradualDensification => Box::new(GradualDensification::new()),
            StrategyKind::EquilibrationBetweenCompressions => Box::new(EquilibrationBetweenCompressions::default()),
            StrategyKind::ConstantPower => Box::new(ConstantPower),
            StrategyKind::Biazzo => Box::new(Biazzo),
        }
    }
}

/// The subset of a run's bounds that come from the CLI rather than
/// `generation.conf`.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub temperature: f64,
    pub wall_clock_cap: Option<Duration>,
    pub max_cycles: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions { temperature: 0.1, wall_clock_cap: None, max_cycles: None }
    }
}

/// The diameter-ratio scale at which the closest pair in `packing` is
/// exactly touching: the original's `PackingGenerator::SetParticles`
/// reads this off `packingStep->GetInnerDiameterRatio()` immediately after
/// loading the initial packing, so growth starts from a configuration
/// guaranteed collision-free at `t = 0`.
fn initial_inner_diameter_ratio(packing: &Packing, box_: &PeriodicBox) -> f64 {
    let mut best = f64::INFINITY;
    for i in 0..packing.len() {
        for j in (i + 1)..packing.len() {
            let distance = box_.minimum_image(packing[i].coordinates, packing[j].coordinates).norm();
            let radii_sum = (packing[i].diameter + packing[j].diameter) * 0.5;
            let ratio = distance / radii_sum;
            if ratio < best {
                best = ratio;
            }
        }
    }
    if best.is_finite() {
        best
    } else {
        1.0
    }
}

/// The library's top-level entry point (§7, "the library's top-level
/// `run_packing` entry point"): builds a scheduler from `config` and
/// `packing`, runs it under `strategy_kind` to completion, and returns the
/// final packing plus run statistics.
pub fn run_packing(config: &GenerationConfig, packing: Packing, strategy_kind: StrategyKind, options: RunOptions) -> Result<RunReport> {
    config.require_bulk()?;

    let box_ = PeriodicBox::new(config.packing_size);
    let initial_ratio = initial_inner_diameter_ratio(&packing, &box_);
    let calculus = CollisionCalculus::new(initial_ratio, config.contraction_rate);

    let cutoff_distance = packing.iter().map(|p| p.diameter).fold(0.0_f64, f64::max).max(1.0);
    let neighbor_provider: Box<dyn crate::neighbors::NeighborProvider> = Box::new(VerletListNeighborProvider::new(cutoff_distance));

    let providers: Vec<Box<dyn EventProvider>> =
        vec![Box::new(CollisionEventProvider), Box::new(WallTransferEventProvider), Box::new(NeighborTransferEventProvider)];
    let processors: Vec<Box<dyn EventProcessor>> = vec![
        Box::new(CollisionEventProcessor),
        Box::new(WallTransferEventProcessor),
        Box::new(NeighborTransferEventProcessor),
        Box::new(MoveEventProcessor),
    ];

    let velocity_service = VelocityService::new(options.temperature);
    let mut scheduler = Scheduler::new(&packing, box_, calculus, neighbor_provider, providers, processors, velocity_service);

    let mut rng = StdRng::seed_from_u64(config.seed);
    VelocityService::new(options.temperature).fill_velocities(scheduler.particles_mut(), &mut rng);
    scheduler.recompute_all_events();

    let final_contraction_rate = config.final_contraction_rate.unwrap_or(config.contraction_rate * 1e-2);
    let contraction_rate_decrease_factor = config.contraction_rate_decrease_factor.unwrap_or(2.0);

    let mut driver = Driver::new(scheduler, strategy_kind.build(), config.contraction_rate, final_contraction_rate, contraction_rate_decrease_factor);
    if let Some(cap) = options.wall_clock_cap {
        driver = driver.with_wall_clock_cap(cap);
    }

    driver.run(options.max_cycles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{PeriodicBox, Vec3};
    use crate::neighbors::verlet::VerletListNeighborProvider;
    use crate::particle::Particle;
    use crate::processors::{CollisionEventProcessor, EventProcessor, MoveEventProcessor, NeighborTransferEventProcessor, WallTransferEventProcessor};
    use crate::providers::{CollisionEventProvider, EventProvider, NeighborTransferEventProvider, WallTransferEventProvider};
    use crate::strategies::Simple;
    use crate::velocity::VelocityService;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cubic_lattice_scheduler(n_per_axis: usize, spacing: f64, diameter: f64, initial_ratio: f64, temperature: f64, seed: u64) -> Scheduler {
        let mut packing = Packing::new();
        for x in 0..n_per_axis {
            for y in 0..n_per_axis {
                for z in 0..n_per_axis {
                    let coordinates = Vec3::new((x as f64 + 0.5) * spacing, (y as f64 + 0.5) * spacing, (z as f64 + 0.5) * spacing);
                    packing.push(Particle { coordinates, diameter });
                }
            }
        }
        let box_ = PeriodicBox::cubic(n_per_axis as f64 * spacing);
        let calculus = CollisionCalculus::new(initial_ratio, 1e-3);
        let neighbor_provider = Box::new(VerletListNeighborProvider::new(spacing));

        let providers: Vec<Box<dyn EventProvider>> =
            vec![Box::new(CollisionEventProvider), Box::new(WallTransferEventProvider), Box::new(NeighborTransferEventProvider)];
        let processors: Vec<Box<dyn EventProcessor>> = vec![
            Box::new(CollisionEventProcessor),
            Box::new(WallTransferEventProcessor),
            Box::new(NeighborTransferEventProcessor),
            Box::new(MoveEventProcessor),
        ];

        let velocity_service = VelocityService::new(temperature);
        let mut scheduler = Scheduler::new(&packing, box_, calculus, neighbor_provider, providers, processors, velocity_service);

        let mut rng = StdRng::seed_from_u64(seed);
        VelocityService::new(temperature).fill_velocities(scheduler.particles_mut(), &mut rng);
        scheduler.recompute_all_events();
        scheduler
    }

    #[test]
    fn one_cycle_preserves_particle_count_and_advances_diameter_ratio() {
        let scheduler = cubic_lattice_scheduler(3, 2.0, 1.0, 0.3, 0.05, 11);
        let mut driver = Driver::new(scheduler, Box::new(Simple), 1e-3, 1e-5, 2.0);

        let before_ratio = driver.scheduler().collision_calculus().inner_diameter_ratio(0.0);
        let stats = driver.run_cycle();

        assert_eq!(driver.scheduler().to_packing().len(), 27);
        assert!(stats.events_count > 0);
        let after_ratio = driver.scheduler().collision_calculus().inner_diameter_ratio(0.0);
        assert!(after_ratio >= before_ratio);
    }

    #[test]
    fn run_stops_with_a_reason_within_a_cycle_budget() {
        let scheduler = cubic_lattice_scheduler(3, 2.0, 1.0, 0.3, 0.05, 12);
        let mut driver = Driver::new(scheduler, Box::new(Simple), 1e-3, 1e-5, 2.0);

        let report = driver.run(Some(5)).expect("run should not time out");
        assert!(report.cycles_run <= 5);
        assert!(report.final_packing.len() == 27);
    }

    #[test]
    fn run_packing_from_config_respects_max_cycles() {
        let config_text = "\
Particles count: 8
Packing size: 2.0 2.0 2.0
Generation start: 1
Seed: 3
Steps to write: 10
Boundaries mode: 1
Contraction rate: 0.01
";
        let config = GenerationConfig::parse(config_text).unwrap();

        let mut packing = Packing::new();
        for x in 0..2 {
            for y in 0..2 {
                for z in 0..2 {
                    packing.push(Particle { coordinates: Vec3::new(x as f64 + 0.5, y as f64 + 0.5, z as f64 + 0.5), diameter: 1.0 });
                }
            }
        }

        let options = RunOptions { temperature: 0.05, wall_clock_cap: None, max_cycles: Some(3) };
        let report = run_packing(&config, packing, StrategyKind::Simple, options).unwrap();

        assert_eq!(report.final_packing.len(), 8);
        assert!(report.cycles_run <= 3);
    }
}
