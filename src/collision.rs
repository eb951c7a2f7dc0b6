/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Collision calculus for growing hard spheres (C3).

Two particles grow at the same linear rate `ratio_growth_rate`, so the
separation between their surfaces is a quadratic function of time. Finding
the next collision is finding the smallest positive root of that quadratic;
resolving a collision is an elastic exchange of the velocity components
parallel to the line of centers, offset by the boundary velocity the growth
rate imparts.

Grounded on
`Generation/PackingGenerators/LubachevsckyStillinger/Source/ParticleCollisionService.cpp`.
The quadratic is written `a t^2 + 2 b t + c = 0` (note the factor of two on
the linear term folded into `b`, which is why the roots below divide by `a`
rather than `2a`), matching the original's comment verbatim.

*/

use crate::geometry::PeriodicBox;
use crate::particle::MovingParticle;

/// Discriminants within this distance of zero (from below) are treated as a
/// double root rather than "no collision", absorbing floating-point noise
/// around a tangency. Mirrors `Core::Constants::EPSILON` usage in
/// `GetCollisionTime`, where `EPSILON` is `std::numeric_limits<double>::epsilon()`.
const DISCRIMINANT_EPSILON: f64 = f64::EPSILON;

/// Computes collision times and post-collision velocities for a pair of
/// growing spheres.
///
/// `ratio_growth_rate` is `d(innerDiameterRatio)/dt`; `initial_inner_diameter_ratio`
/// and the current time together give the present diameter scaling factor.
#[derive(Debug, Clone, Copy)]
pub struct CollisionCalculus {
    pub initial_inner_diameter_ratio: f64,
    pub ratio_growth_rate: f64,
}

impl CollisionCalculus {
    pub fn new(initial_inner_diameter_ratio: f64, ratio_growth_rate: f64) -> Self {
        CollisionCalculus { initial_inner_diameter_ratio, ratio_growth_rate }
    }

    /// `D(t) = D_0 + gamma * t`, the scalar every nominal diameter is
    /// multiplied by at `time` (§3, "Global scaling").
    pub fn inner_diameter_ratio(&self, time: f64) -> f64 {
        self.initial_inner_diameter_ratio + self.ratio_growth_rate * time
    }

    /// Minimum-image vector from `first` to `second` at `current_time`, with
    /// each particle advanced by free flight from its own `last_event_time`.
    fn difference(&self, current_time: f64, first: &MovingParticle, second: &MovingParticle, box_: &PeriodicBox) -> crate::geometry::Vec3 {
        let first_coords = first.position_at(current_time);
        let second_coords = second.position_at(current_time);
        box_.minimum_image(first_coords, second_coords)
    }

    /// The time at which `first` and `second` next collide, if ever, given
    /// both are growing at `ratio_growth_rate`. Returns `None` if the pair
    /// never collides (boundaries separating, or growth too slow to close
    /// the gap).
    ///
    /// A return of `Some(current_time)` means the spheres are already in
    /// contact (or infinitesimally overlapping) with approaching boundaries
    /// — the collision should be processed immediately.
    pub fn collision_time(
        &self,
        current_time: f64,
        first: &MovingParticle,
        second: &MovingParticle,
        box_: &PeriodicBox,
    ) -> Option<f64> {
        let current_ratio = self.inner_diameter_ratio(current_time);

        let relative_velocity = second.velocity - first.velocity;
        let relative_velocity_square = relative_velocity.norm_squared();

        let difference = self.difference(current_time, first, second, box_);
        let distance_square = difference.norm_squared();

        let radii_sum = (first.diameter + second.diameter) * 0.5;
        let radii_sum_square = radii_sum * radii_sum;

        let a = relative_velocity_square - radii_sum_square * self.ratio_growth_rate * self.ratio_growth_rate;
        let b = relative_velocity.dot(&difference) - radii_sum_square * current_ratio * self.ratio_growth_rate;
        let c = distance_square - radii_sum_square * current_ratio * current_ratio;

        Self::solve(current_time, a, b, c)
    }

    fn solve(current_time: f64, a: f64, b: f64, c: f64) -> Option<f64> {
        if c < 0.0 {
            // Already overlapping.
            return if b <= 0.0 { Some(current_time) } else { None };
        }
        if c == 0.0 {
            // Exactly in contact.
            return if b < 0.0 { Some(current_time) } else { None };
        }

        // c > 0.0: spheres apart.
        if a == 0.0 {
            return if b < 0.0 { Some(current_time - c / b * 0.5) } else { None };
        }

        let mut discriminant = b * b - a * c;
        if discriminant < 0.0 {
            if discriminant > -10.0 * DISCRIMINANT_EPSILON {
                discriminant = 0.0;
            } else {
                return None;
            }
        }

        // Either boundaries are approaching (b <= 0) or the growth rate is
        // closing the gap faster than the particles separate (a < 0).
        if b <= 0.0 || a < 0.0 {
            let root = (-b - discriminant.sqrt()) / a;
            Some(current_time + root)
        } else {
            None
        }
    }

    /// Splits `vector` into the component parallel to the unit `normal` and
    /// the transverse remainder. Returns the (unsigned) length of the
    /// parallel component.
    fn split(vector: crate::geometry::Vec3, normal: crate::geometry::Vec3) -> (crate::geometry::Vec3, crate::geometry::Vec3, f64) {
        let projection = normal.dot(&vector);
        let parallel = normal * projection;
        let transverse = vector - parallel;
        (parallel, transverse, projection.abs())
    }

    /// Resolves an elastic collision between `first` and `second` at
    /// `current_time`: velocity components transverse to the line of
    /// centers are preserved, parallel components are exchanged and offset
    /// by the boundary velocity the diameter growth contributes.
    ///
    /// Returns `(first_velocity, second_velocity, exchanged_momentum)`. The
    /// momentum term is signed: positive when the parallel velocities carry
    /// net momentum along `first -> second`, consistent with how the driver
    /// accumulates it before taking an absolute value for the pressure
    /// estimator (§4.7, Open Question (c)).
    pub fn resolve_collision(
        &self,
        current_time: f64,
        first: &MovingParticle,
        second: &MovingParticle,
        box_: &PeriodicBox,
    ) -> (crate::geometry::Vec3, crate::geometry::Vec3, f64) {
        let difference = self.difference(current_time, first, second, box_);
        let length = difference.norm();
        let unit = difference / length;

        let (first_parallel, first_transverse, first_parallel_length) = Self::split(first.velocity, unit);
        let (second_parallel, second_transverse, second_parallel_length) = Self::split(second.velocity, unit);

        let radius_growth_sum = (first.diameter + second.diameter) * self.ratio_growth_rate * 0.5;
        let first_boundary_velocity = unit * (2.0 * radius_growth_sum);
        let second_boundary_velocity = unit * (-2.0 * radius_growth_sum);

        let first_velocity = first_transverse + second_boundary_velocity + second_parallel;
        let second_velocity = second_transverse + first_parallel + first_boundary_velocity;

        let exchanged_momentum = (first_parallel_length + second_parallel_length) * length;

        (first_velocity, second_velocity, exchanged_momentum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec3;

    fn particle(index: usize, x: f64, vx: f64, diameter: f64) -> MovingParticle {
        MovingParticle {
            index,
            coordinates: Vec3::new(x, 0.0, 0.0),
            diameter,
            velocity: Vec3::new(vx, 0.0, 0.0),
            last_event_time: 0.0,
            next_event: crate::events::Event::Invalid,
        }
    }

    #[test]
    fn approaching_equal_spheres_collide_at_midpoint_closure() {
        let calculus = CollisionCalculus::new(1.0, 0.0);
        let box_ = PeriodicBox::cubic(100.0);
        let a = particle(0, 0.0, 0.5, 1.0);
        let b = particle(1, 3.0, -0.5, 1.0);

        // Gap between surfaces closes at relative speed 1.0; surfaces
        // touch when centers are `diameter` apart: travel 2.0 at speed 1.0.
        let t = calculus.collision_time(0.0, &a, &b, &box_).unwrap();
        assert!((t - 2.0).abs() < 1e-9);
    }

    #[test]
    fn separating_spheres_never_collide() {
        let calculus = CollisionCalculus::new(1.0, 0.0);
        let box_ = PeriodicBox::cubic(100.0);
        let a = particle(0, 0.0, -0.5, 1.0);
        let b = particle(1, 3.0, 0.5, 1.0);

        assert!(calculus.collision_time(0.0, &a, &b, &box_).is_none());
    }

    #[test]
    fn growth_alone_closes_stationary_pair() {
        // Particles at rest, but diameters growing: must eventually touch.
        let calculus = CollisionCalculus::new(0.5, 0.01);
        let box_ = PeriodicBox::cubic(100.0);
        let a = particle(0, 0.0, 0.0, 1.0);
        let b = particle(1, 3.0, 0.0, 1.0);

        let t = calculus.collision_time(0.0, &a, &b, &box_);
        assert!(t.is_some());
    }

    #[test]
    fn two_particles_collide_at_the_documented_time_and_swap_velocities() {
        // d_i = d_j = 1 at (0.25, 0.5, 0.5) and (0.75, 0.5, 0.5) in a unit
        // periodic box; v_i = (+1, 0, 0), v_j = (-1, 0, 0); gamma = 0,
        // D = 0.4. Surfaces are `radii_sum * D = 0.4` apart when the gap
        // (`0.5` between centers) has closed by `0.1` at relative speed
        // `2.0`, i.e. at t = 0.05; after the collision the parallel
        // velocity components swap exactly (equal masses, no growth
        // impulse since gamma = 0).
        let calculus = CollisionCalculus::new(0.4, 0.0);
        let box_ = PeriodicBox::cubic(1.0);
        let a = MovingParticle {
            index: 0,
            coordinates: Vec3::new(0.25, 0.5, 0.5),
            diameter: 1.0,
            velocity: Vec3::new(1.0, 0.0, 0.0),
            last_event_time: 0.0,
            next_event: crate::events::Event::Invalid,
        };
        let b = MovingParticle {
            index: 1,
            coordinates: Vec3::new(0.75, 0.5, 0.5),
            diameter: 1.0,
            velocity: Vec3::new(-1.0, 0.0, 0.0),
            last_event_time: 0.0,
            next_event: crate::events::Event::Invalid,
        };

        let t = calculus.collision_time(0.0, &a, &b, &box_).unwrap();
        assert!((t - 0.05).abs() < 1e-12);

        let (va, vb, _momentum) = calculus.resolve_collision(t, &a, &b, &box_);
        assert!((va[0] - (-1.0)).abs() < 1e-12);
        assert!((vb[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn elastic_collision_conserves_kinetic_energy_for_equal_masses() {
        let calculus = CollisionCalculus::new(1.0, 0.0);
        let box_ = PeriodicBox::cubic(100.0);
        let a = particle(0, 0.0, 1.0, 1.0);
        let b = particle(1, 2.0, -1.0, 1.0);

        let (va, vb, _momentum) = calculus.resolve_collision(2.0, &a, &b, &box_);
        let ke_before = a.velocity.norm_squared() + b.velocity.norm_squared();
        let ke_after = va.norm_squared() + vb.norm_squared();
        assert!((ke_before - ke_after).abs() < 1e-9);
    }
}
