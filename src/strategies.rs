/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Compression-rate control strategies (C7).

Grounded on the five branches of
`LubachevsckyStillingerStep::DisplaceParticles` in
`Source/LubachevsckyStillingerStep.cpp`: `Simple` is the trailing `else`
(no rate changes, stop once `reduced_pressure >= MAX_PRESSURE`);
[`GradualDensification`] mirrors `DecreaseCompressionRate`;
[`EquilibrationBetweenCompressions`] mirrors
`SwitchCompressionRateWithZero`; [`ConstantPower`] mirrors
`EnsureConstantPower`; [`Biazzo`] mirrors `DecreaseCompressionRateAsBiazzo`.
The original persists a rate change to `packing.conf` via
`packingSerializer->SerializeConfig` mid-run so an interrupted run resumes
at the right rate; we do not reopen the config file mid-run (§4.7, Open
Question (a)) — instead every rate change is appended to
[`CompressionOutcome::rate_changes`] and logged at `info` level, and the
final config snapshot written by the CLI front end reflects the rate the
run ended at.

*/

use crate::geometry::DIMENSIONS;

/// Hard pressure ceiling shared by every strategy:
/// `Source/LubachevsckyStillingerStep.cpp`'s `maxPressure`.
pub const MAX_PRESSURE: f64 = 1e12;

/// A record of one compression-rate change, in lieu of the original's
/// mid-run config rewrite.
#[derive(Debug, Clone, Copy)]
pub struct RateChangeEvent {
    pub cycle: u64,
    pub at_time: f64,
    pub old_rate: f64,
    pub new_rate: f64,
}

/// Inputs a strategy needs to decide on a rate change, beyond the
/// just-measured reduced pressure: geometric constants fixed for the
/// whole run.
#[derive(Debug, Clone, Copy)]
pub struct CompressionContext {
    /// Sum of nominal (diameter-ratio 1) particle volumes.
    pub particles_volume: f64,
    pub box_volume: f64,
    pub initial_contraction_rate: f64,
    pub final_contraction_rate: f64,
    pub contraction_rate_decrease_factor: f64,
}

impl CompressionContext {
    /// `density(ratio) = particlesVolume * ratio^DIMENSIONS / totalVolume`,
    /// the complement of `CalculateCurrentPorosity`.
    pub fn density_at_ratio(&self, ratio: f64) -> f64 {
        self.particles_volume * ratio.powi(DIMENSIONS as i32) / self.box_volume
    }
}

/// What a strategy decided after one cycle's worth of events.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyDecision {
    pub should_continue: bool,
    pub new_ratio_growth_rate: Option<f64>,
}

pub trait CompressionStrategy {
    /// `reduced_pressure` and `inner_diameter_ratio` are as measured at
    /// the end of the cycle that just ran, at `time` (already reset to
    /// near zero by the driver's `ResetTime` equivalent is irrelevant here
    /// — `time` is the cycle's elapsed sim time, used only for logging).
    fn after_cycle(
        &mut self,
        ctx: &CompressionContext,
        current_ratio_growth_rate: f64,
        inner_diameter_ratio: f64,
        reduced_pressure: f64,
    ) -> StrategyDecision;
}

/// No rate changes; stops once the reduced pressure crosses
/// [`MAX_PRESSURE`]. The original's implicit default (the trailing `else`
/// in `DisplaceParticles`).
#[derive(Debug, Default)]
pub struct Simple;

impl CompressionStrategy for Simple {
    fn after_cycle(&mut self, _ctx: &CompressionContext, _rate: f64, _ratio: f64, pressure: f64) -> StrategyDecision {
        StrategyDecision { should_continue: pressure < MAX_PRESSURE, new_ratio_growth_rate: None }
    }
}

/// Mirrors `DecreaseCompressionRate`: suppress growth entirely once
/// pressure exceeds the ceiling, then resume at a geometrically decayed
/// rate once pressure has relaxed back below it, up to
/// `max_equilibrations_count` suppress/resume rounds.
#[derive(Debug)]
pub struct GradualDensification {
    growth_rate_updates_count: u32,
    equilibrations_count: u32,
    max_equilibrations_count: u32,
}

impl GradualDensification {
    pub fn new() -> Self {
        GradualDensification { growth_rate_updates_count: 0, equilibrations_count: 0, max_equilibrations_count: 50 }
    }
}

impl Default for GradualDensification {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionStrategy for GradualDensification {
    fn after_cycle(&mut self, ctx: &CompressionContext, rate: f64, _ratio: f64, pressure: f64) -> StrategyDecision {
        if rate > 0.0 {
            let should_continue = !(pressure > MAX_PRESSURE && rate <= ctx.final_contraction_rate);
            if pressure > MAX_PRESSURE {
                log::info!("suppressing growth to equilibrate");
                self.equilibrations_count = 0;
                return StrategyDecision { should_continue, new_ratio_growth_rate: Some(0.0) };
            }
            StrategyDecision { should_continue, new_ratio_growth_rate: None }
        } else if pressure < MAX_PRESSURE {
            self.growth_rate_updates_count += 1;
            let next_rate = ctx.initial_contraction_rate / ctx.contraction_rate_decrease_factor.powi(self.growth_rate_updates_count as i32);
            log::info!("resuming growth at rate {next_rate}");
            StrategyDecision { should_continue: true, new_ratio_growth_rate: Some(next_rate) }
        } else {
            self.equilibrations_count += 1;
            let should_continue = self.equilibrations_count < self.max_equilibrations_count;
            if !should_continue {
                log::warn!("equilibration lasted {} rounds; pressure still high", self.max_equilibrations_count);
            }
            StrategyDecision { should_continue, new_ratio_growth_rate: None }
        }
    }
}

/// Mirrors `SwitchCompressionRateWithZero`: suppress growth above the
/// ceiling like [`GradualDensification`], but resume at the full initial
/// rate (no decay) once the reduced pressure has stabilized (changed by
/// less than 1% from the previous cycle) rather than after a fixed
/// suppression count.
#[derive(Debug, Default)]
pub struct EquilibrationBetweenCompressions {
    previous_pressure: Option<f64>,
}

impl CompressionStrategy for EquilibrationBetweenCompressions {
    fn after_cycle(&mut self, ctx: &CompressionContext, rate: f64, _ratio: f64, pressure: f64) -> StrategyDecision {
        let previous_pressure = self.previous_pressure;
        self.previous_pressure = Some(pressure);

        if rate > 0.0 {
            if pressure > MAX_PRESSURE {
                log::info!("suppressing growth to equilibrate");
                return StrategyDecision { should_continue: true, new_ratio_growth_rate: Some(0.0) };
            }
            return StrategyDecision { should_continue: true, new_ratio_growth_rate: None };
        }

        let equilibrated = previous_pressure.map(|prev| ((prev - pressure) / pressure).abs() < 1e-2).unwrap_or(false);
        if equilibrated {
            log::info!("equilibrated; resuming growth at rate {}", ctx.initial_contraction_rate);
            StrategyDecision { should_continue: pressure < MAX_PRESSURE, new_ratio_growth_rate: Some(ctx.initial_contraction_rate) }
        } else {
            StrategyDecision { should_continue: true, new_ratio_growth_rate: None }
        }
    }
}

/// Mirrors `EnsureConstantPower`: continuously adjusts the growth rate so
/// the product of rate and pressure tracks a constant "compression power",
/// scaled by how far the packing's density still has to travel to its
/// expected final density (`0.64`, or the initial density if already
/// denser).
#[derive(Debug, Default)]
pub struct ConstantPower;

impl ConstantPower {
    const EXPECTED_FINAL_DENSITY: f64 = 0.64;
}

impl CompressionStrategy for ConstantPower {
    fn after_cycle(&mut self, ctx: &CompressionContext, rate: f64, ratio: f64, pressure: f64) -> StrategyDecision {
        let initial_density = ctx.density_at_ratio(1.0).min(ctx.particles_volume / ctx.box_volume);
        let current_density = ctx.density_at_ratio(ratio);
        let final_density = initial_density.max(Self::EXPECTED_FINAL_DENSITY);

        let next_rate = ctx.final_contraction_rate * MAX_PRESSURE / pressure * (current_density / final_density).powf(4.0 / 3.0);
        let should_change = next_rate < rate && next_rate >= ctx.final_contraction_rate * 0.5;
        let should_continue = !(next_rate <= ctx.final_contraction_rate && pressure >= MAX_PRESSURE);

        if should_change {
            log::info!("ratioGrowthRate: {next_rate}");
            StrategyDecision { should_continue, new_ratio_growth_rate: Some(next_rate) }
        } else {
            StrategyDecision { should_continue, new_ratio_growth_rate: None }
        }
    }
}

/// Mirrors `DecreaseCompressionRateAsBiazzo`: a fixed table of pressure
/// thresholds, each mapped to a growth rate to drop to once crossed, per
/// Biazzo et al. (2009) *Theory of Amorphous Packings of Binary Mixtures
/// of Hard Spheres*.
#[derive(Debug, Default)]
pub struct Biazzo;

impl Biazzo {
    const PRESSURE_THRESHOLDS: [f64; 4] = [1e2, 1e3, 1e9, 1e12];
    const NEXT_RATIO_GROWTH_RATES: [f64; 4] = [1e-2, 1e-3, 1e-4, 1e-4 * 0.9];
}

impl CompressionStrategy for Biazzo {
    fn after_cycle(&mut self, ctx: &CompressionContext, rate: f64, _ratio: f64, pressure: f64) -> StrategyDecision {
        let should_continue = !(pressure > MAX_PRESSURE && rate <= ctx.final_contraction_rate);

        let first_larger_index = Self::PRESSURE_THRESHOLDS.iter().position(|&t| t >= pressure).unwrap_or(Self::PRESSURE_THRESHOLDS.len());
        if first_larger_index == 0 {
            return StrategyDecision { should_continue, new_ratio_growth_rate: None };
        }
        let next_rate = Self::NEXT_RATIO_GROWTH_RATES[first_larger_index - 1];
        if next_rate >= rate {
            return StrategyDecision { should_continue, new_ratio_growth_rate: None };
        }

        log::info!("ratioGrowthRate: {next_rate}");
        StrategyDecision { should_continue, new_ratio_growth_rate: Some(next_rate) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> CompressionContext {
        CompressionContext {
            particles_volume: 0.5,
            box_volume: 1.0,
            initial_contraction_rate: 1.0,
            final_contraction_rate: 1e-5,
            contraction_rate_decrease_factor: 2.0,
        }
    }

    #[test]
    fn simple_stops_once_pressure_exceeds_ceiling() {
        let mut strategy = Simple;
        let decision = strategy.after_cycle(&ctx(), 1.0, 1.0, MAX_PRESSURE * 2.0);
        assert!(!decision.should_continue);
    }

    #[test]
    fn gradual_densification_suppresses_growth_above_ceiling() {
        let mut strategy = GradualDensification::new();
        let decision = strategy.after_cycle(&ctx(), 1.0, 1.0, MAX_PRESSURE * 2.0);
        assert_eq!(decision.new_ratio_growth_rate, Some(0.0));
        assert!(decision.should_continue);
    }

    #[test]
    fn gradual_densification_resumes_with_decayed_rate() {
        let mut strategy = GradualDensification::new();
        let decision = strategy.after_cycle(&ctx(), 0.0, 1.0, MAX_PRESSURE / 2.0);
        assert_eq!(decision.new_ratio_growth_rate, Some(0.5));
    }

    #[test]
    fn biazzo_drops_rate_at_threshold() {
        let mut strategy = Biazzo;
        let decision = strategy.after_cycle(&ctx(), 1.0, 1.0, 5e2);
        assert_eq!(decision.new_ratio_growth_rate, Some(1e-2));
    }
}
