/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Velocity initialization and thermostat rescaling (C4).

Grounded on
`Generation/PackingGenerators/LubachevsckyStillinger/Source/VelocityService.cpp`
and `Core/Source/Math.cpp`'s `GetNextGaussianRandom` (Marsaglia polar
method). Mass and Boltzmann's constant are fixed at `1.0`, matching the
original; only `temperature` is a free parameter.

*/

use crate::particle::MovingParticle;
use rand::Rng;

const MASS: f64 = 1.0;
const BOLTZMANN_CONSTANT: f64 = 1.0;
const DEGREES_OF_FREEDOM: f64 = 3.0;

/// Marsaglia-polar Gaussian sampler with one-value spare caching: every
/// pair of uniform draws yields two independent normal variates, and the
/// second is cached for the next call rather than discarded.
pub struct GaussianSampler {
    spare: Option<f64>,
}

impl GaussianSampler {
    pub fn new() -> Self {
        GaussianSampler { spare: None }
    }

    pub fn next(&mut self, rng: &mut impl Rng, mean: f64, standard_deviation: f64) -> f64 {
        if let Some(spare) = self.spare.take() {
            return mean + standard_deviation * spare;
        }

        let (x, y, radius_square) = loop {
            let x = rng.random_range(0.0..1.0) * 2.0 - 1.0;
            let y = rng.random_range(0.0..1.0) * 2.0 - 1.0;
            let radius_square = x * x + y * y;
            if radius_square < 1.0 {
                break (x, y, radius_square);
            }
        };

        let multiplier = if radius_square == 0.0 {
            0.0
        } else {
            (-2.0 * radius_square.ln() / radius_square).sqrt()
        };

        self.spare = Some(y * multiplier);
        mean + standard_deviation * (x * multiplier)
    }
}

impl Default for GaussianSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Draws initial Maxwell-Boltzmann velocities for every particle, removes
/// the center-of-mass drift, and rescales to the exact target temperature.
pub struct VelocityService {
    pub temperature: f64,
}

impl VelocityService {
    pub fn new(temperature: f64) -> Self {
        VelocityService { temperature }
    }

    fn expected_kinetic_energy(&self, particles_count: usize) -> f64 {
        particles_count as f64 * DEGREES_OF_FREEDOM * BOLTZMANN_CONSTANT * self.temperature / 2.0
    }

    pub fn actual_kinetic_energy(&self, particles: &[MovingParticle]) -> f64 {
        particles.iter().map(|p| 0.5 * MASS * p.velocity.norm_squared()).sum()
    }

    /// `E = N i k T / 2`.
    pub fn actual_temperature(&self, kinetic_energy: f64, particles_count: usize) -> f64 {
        2.0 * kinetic_energy / particles_count as f64 / DEGREES_OF_FREEDOM / BOLTZMANN_CONSTANT
    }

    /// Advances `particle` to `current_time` under free flight before its
    /// velocity is changed, so the stored `coordinates`/`last_event_time`
    /// stay consistent with whatever new velocity gets assigned. Does not
    /// wrap into the periodic box — wall transfers own that.
    pub fn synchronize_with_current_time(&self, current_time: f64, particle: &mut MovingParticle) {
        particle.coordinates = particle.position_at(current_time);
        particle.last_event_time = current_time;
    }

    /// Rescales every particle's velocity so the system's kinetic energy
    /// matches `expected_kinetic_energy`, synchronizing each particle to
    /// `current_time` first since the rescale multiplies the velocity in
    /// place.
    pub fn rescale_velocities(&self, current_time: f64, actual_kinetic_energy: f64, particles: &mut [MovingParticle]) {
        let expected_kinetic_energy = self.expected_kinetic_energy(particles.len());
        let rescale_factor = (expected_kinetic_energy / actual_kinetic_energy).sqrt();
        for particle in particles.iter_mut() {
            self.synchronize_with_current_time(current_time, particle);
            particle.velocity = particle.velocity * rescale_factor;
        }
    }

    /// Draws a fresh Maxwell-Boltzmann velocity, removes center-of-mass
    /// drift across the whole system, and rescales to exact temperature.
    /// Logs a warning (rather than failing) if the drift before removal is
    /// implausibly large, mirroring the original's diagnostic printf.
    pub fn fill_velocities(&self, particles: &mut [MovingParticle], rng: &mut impl Rng) {
        let particles_count = particles.len();
        let standard_deviation = (BOLTZMANN_CONSTANT * self.temperature / MASS).sqrt();
        let mut sampler = GaussianSampler::new();

        let mut total_impetus = crate::geometry::Vec3::ZERO;
        for particle in particles.iter_mut() {
            let velocity = crate::geometry::Vec3::new(
                sampler.next(rng, 0.0, standard_deviation),
                sampler.next(rng, 0.0, standard_deviation),
                sampler.next(rng, 0.0, standard_deviation),
            );
            particle.velocity = velocity;
            total_impetus = total_impetus + velocity * MASS;
        }

        let center_of_mass_velocity = total_impetus / (MASS * particles_count as f64);
        let drift = center_of_mass_velocity.norm();
        if drift > 500.0 / MASS / particles_count as f64 {
            log::warn!("center-of-mass velocity not zero: {drift:.6}");
        }

        for particle in particles.iter_mut() {
            particle.velocity = particle.velocity - center_of_mass_velocity;
        }

        let actual_kinetic_energy = self.actual_kinetic_energy(particles);
        self.rescale_velocities(0.0, actual_kinetic_energy, particles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn particle(index: usize) -> MovingParticle {
        MovingParticle::new(index, Vec3::new(index as f64, 0.0, 0.0), 1.0)
    }

    #[test]
    fn fill_velocities_zeroes_center_of_mass_and_matches_temperature() {
        let service = VelocityService::new(0.3);
        let mut particles: Vec<_> = (0..200).map(particle).collect();
        let mut rng = StdRng::seed_from_u64(7);
        service.fill_velocities(&mut particles, &mut rng);

        let mut total = Vec3::ZERO;
        for p in &particles {
            total = total + p.velocity;
        }
        assert!((total.norm() / particles.len() as f64) < 1e-9);

        let kinetic_energy = service.actual_kinetic_energy(&particles);
        let temperature = service.actual_temperature(kinetic_energy, particles.len());
        assert!((temperature - 0.3).abs() < 1e-9);
    }

    #[test]
    fn gaussian_sampler_reuses_spare_value() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sampler = GaussianSampler::new();
        let _first = sampler.next(&mut rng, 0.0, 1.0);
        assert!(sampler.spare.is_some());
        let _second = sampler.next(&mut rng, 0.0, 1.0);
        assert!(sampler.spare.is_none());
    }
}
