#![cfg(feature = "slow_tests")]

//! End-to-end jamming scenarios (§8 of the specification this crate
//! implements): whole runs, through the public [`ls_packing::driver`]
//! entry point, checked against known close-packing densities rather than
//! against individual component behavior. Slow because each one runs a
//! generator to jamming; gated the way the teacher gates its own
//! full-pipeline test (`tests/test_llp_pipeline.rs`).

use ls_packing::config::GenerationConfig;
use ls_packing::driver::{run_packing, RunOptions, StopReason, StrategyKind};
use ls_packing::geometry::Vec3;
use ls_packing::particle::{Packing, Particle};
use std::f64::consts::PI;

fn density(packing: &Packing, box_volume: f64, diameter_ratio: f64) -> f64 {
    let particles_volume: f64 = packing.iter().map(|p| (PI / 6.0) * (p.diameter * diameter_ratio).powi(3)).sum();
    particles_volume / box_volume
}

fn config(particles_count: usize, packing_size: f64, seed: u64, contraction_rate: f64) -> GenerationConfig {
    let text = format!(
        "Particles count: {particles_count}\n\
         Packing size: {packing_size} {packing_size} {packing_size}\n\
         Generation start: 1\n\
         Seed: {seed}\n\
         Steps to write: 0\n\
         Boundaries mode: 1\n\
         Contraction rate: {contraction_rate}\n"
    );
    GenerationConfig::parse(&text).expect("well-formed test config")
}

/// E1: an 8-particle 2x2x2 cubic lattice seed, grown under the `Simple`
/// strategy, should jam near the face-centered-cubic close-packing limit
/// `pi*sqrt(2)/6`, confirming the engine recovers the dense ordered state
/// from a trivial starting arrangement.
#[test]
fn e1_cubic_lattice_jams_near_fcc_density() {
    let edge = 2.0;
    let config = config(8, edge, 1, 1e-2);

    let mut packing: Packing = Vec::new();
    for x in 0..2 {
        for y in 0..2 {
            for z in 0..2 {
                packing.push(Particle { coordinates: Vec3::new(x as f64 + 0.5, y as f64 + 0.5, z as f64 + 0.5), diameter: 1.0 });
            }
        }
    }

    let options = RunOptions { temperature: 0.2, wall_clock_cap: None, max_cycles: None };
    let report = run_packing(&config, packing, StrategyKind::Simple, options).expect("packing generation should not error");

    assert_eq!(report.stop_reason, StopReason::Jammed);
    assert!(report.final_reduced_pressure >= 1e12);

    let box_volume = edge * edge * edge;
    let final_density = density(&report.final_packing, box_volume, report.final_inner_diameter_ratio);
    let fcc_limit = PI * std::f64::consts::SQRT_2 / 6.0;
    assert!((final_density - fcc_limit).abs() / fcc_limit < 1e-3, "density {final_density} not within 0.1% of {fcc_limit}");
}

fn random_dilute_packing(n: usize, box_edge: f64, target_density: f64, seed: u64) -> Packing {
    use rand::rngs::StdRng;
    use rand::Rng;
    use rand::SeedableRng;

    let mut rng = StdRng::seed_from_u64(seed);
    let box_volume = box_edge * box_edge * box_edge;
    let diameter = (target_density * box_volume / (n as f64) / (PI / 6.0)).cbrt();

    let mut packing = Packing::new();
    for _ in 0..n {
        let coordinates = Vec3::new(rng.random_range(0.0..box_edge), rng.random_range(0.0..box_edge), rng.random_range(0.0..box_edge));
        packing.push(Particle { coordinates, diameter });
    }
    packing
}

/// E2: 100 uniform-random particles at initial density 0.3, grown under
/// `Simple`, should jam within `10^5` cycles near the random close-packing
/// density (`0.64 +/- 0.02`).
#[test]
fn e2_random_packing_jams_near_random_close_packing() {
    let edge = 1.0;
    let config = config(100, edge, 0, 1e-2);
    let packing = random_dilute_packing(100, edge, 0.3, 0);

    let options = RunOptions { temperature: 0.2, wall_clock_cap: None, max_cycles: Some(100_000) };
    let report = run_packing(&config, packing, StrategyKind::Simple, options).expect("packing generation should not error");

    assert_eq!(report.stop_reason, StopReason::Jammed);
    assert!(report.cycles_run < 100_000);

    let box_volume = edge * edge * edge;
    let final_density = density(&report.final_packing, box_volume, report.final_inner_diameter_ratio);
    assert!((0.62..=0.66).contains(&final_density), "density {final_density} outside random close packing band");
}

/// E3: the same initial condition as E2, but under the `Biazzo` strategy;
/// at termination the growth rate must have settled on the table's last
/// entry, `0.9e-4`.
#[test]
fn e3_biazzo_strategy_terminates_at_final_table_rate() {
    let edge = 1.0;
    let config = config(100, edge, 0, 1e-2);
    let packing = random_dilute_packing(100, edge, 0.3, 0);

    let options = RunOptions { temperature: 0.2, wall_clock_cap: None, max_cycles: Some(200_000) };
    let report = run_packing(&config, packing, StrategyKind::Biazzo, options).expect("packing generation should not error");

    assert_eq!(report.stop_reason, StopReason::Jammed);
    let last_rate_change = report.rate_changes.last().expect("Biazzo run should have changed rate at least once");
    assert!((last_rate_change.new_rate - 0.9e-4).abs() < 1e-12);
}

/// E6: two runs from identical seeds and inputs produce byte-for-byte
/// identical final packings (§5, "ordering of concurrent collisions...
/// making the stream reproducible").
#[test]
fn e6_identical_seeds_are_deterministic() {
    let edge = 1.0;
    let config = config(100, edge, 0, 1e-2);

    let run_once = || {
        let packing = random_dilute_packing(100, edge, 0.3, 0);
        let options = RunOptions { temperature: 0.2, wall_clock_cap: None, max_cycles: Some(100_000) };
        run_packing(&config, packing, StrategyKind::Simple, options).expect("packing generation should not error")
    };

    let first = run_once();
    let second = run_once();

    assert_eq!(first.cycles_run, second.cycles_run);
    assert_eq!(first.final_packing.len(), second.final_packing.len());
    for (a, b) in first.final_packing.iter().zip(second.final_packing.iter()) {
        for axis in 0..3 {
            assert_eq!(a.coordinates[axis].to_bits(), b.coordinates[axis].to_bits());
        }
        assert_eq!(a.diameter.to_bits(), b.diameter.to_bits());
    }
}
