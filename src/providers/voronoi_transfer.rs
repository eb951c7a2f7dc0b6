/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Grounded on `Headers/VoronoiTransferEventProvider.h`: the retrieval pack
//! is missing this provider's `.cpp`, so the crossing calculus below is
//! derived from the wall-crossing style of `WallTransferEventProvider`
//! (free flight, linear-crossing-time) applied to a plane instead of an
//! axis, plus the analytic growth-rate crossing already used by
//! [`crate::collision::CollisionCalculus`] for the inscribed-sphere case.

use super::EventProvider;
use crate::events::Event;
use crate::state::SchedulerState;
use crate::voronoi::VoronoiTesselation;

/// Proposes the next Voronoi-face or inscribed-sphere crossing for each
/// particle, once a [`VoronoiTesselation`] has been supplied. Absent one
/// (empty tesselation), this provider proposes nothing, matching the
/// original's optional use (only the cell-locking generator modes build a
/// tesselation at all).
#[derive(Debug)]
pub struct VoronoiTransferEventProvider {
    tesselation: VoronoiTesselation,
}

impl VoronoiTransferEventProvider {
    pub fn new(tesselation: VoronoiTesselation) -> Self {
        VoronoiTransferEventProvider { tesselation }
    }
}

impl EventProvider for VoronoiTransferEventProvider {
    fn propose(&self, state: &mut SchedulerState, owner: usize, _trigger: &Event) {
        if self.tesselation.is_empty() {
            return;
        }
        let polytope = self.tesselation.polytope(owner);
        let particle = &state.particles[owner];
        let current_time = state.current_time;

        // Candidate 1: the earliest face of the polytope the particle's
        // center will cross under free flight.
        let mut candidate: Option<(f64, Event)> = None;
        for (index, plane) in polytope.planes.iter().enumerate() {
            let distance = plane.signed_distance(particle.coordinates);
            let closing_speed = -particle.velocity.dot(&plane.normal);
            if closing_speed <= 0.0 {
                continue;
            }
            let crossing_time = particle.last_event_time + distance / closing_speed;
            if candidate.map_or(true, |(best, _)| crossing_time < best) {
                candidate = Some((crossing_time, Event::VoronoiTransfer { time: crossing_time, particle: owner, plane: index }));
            }
        }

        // Candidate 2: the moment the particle's own growing radius fills
        // the cell's inscribed sphere, independent of position/velocity.
        let calculus = &state.collision_calculus;
        let target_ratio = 2.0 * polytope.inscribed_sphere_radius / particle.diameter;
        let current_ratio = calculus.inner_diameter_ratio(current_time);
        if calculus.ratio_growth_rate > 0.0 && target_ratio > current_ratio {
            let sphere_time = (target_ratio - calculus.initial_inner_diameter_ratio) / calculus.ratio_growth_rate;
            if candidate.map_or(true, |(best, _)| sphere_time < best) {
                candidate = Some((sphere_time, Event::VoronoiInscribedSphereTransfer { time: sphere_time, particle: owner }));
            }
        }

        if let Some((time, event)) = candidate {
            if time >= current_time {
                state.propose(owner, event);
            }
        }
    }
}
