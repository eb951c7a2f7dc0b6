/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The mutable state event providers and processors operate on.
//!
//! The original implementation wires providers and processors together
//! through raw/shared pointers to a common `vector<MovingParticle>` plus a
//! handful of sibling services (`ParticleCollisionService`,
//! `INeighborProvider`, the event queue). Rust expresses that same
//! "everybody touches the same simulation state" shape with a single
//! `&mut SchedulerState` borrowed for the duration of one event's
//! processing, instead of shared ownership (see REDESIGN FLAGS).

use crate::collision::CollisionCalculus;
use crate::events::Event;
use crate::geometry::PeriodicBox;
use crate::neighbors::NeighborProvider;
use crate::particle::MovingParticle;

/// Everything a provider or processor needs to propose or apply an event.
pub struct SchedulerState {
    pub particles: Vec<MovingParticle>,
    pub box_: PeriodicBox,
    pub collision_calculus: CollisionCalculus,
    pub neighbor_provider: Box<dyn NeighborProvider>,
    pub current_time: f64,
    /// Signed accumulator for the pairwise momentum exchange of the current
    /// cycle; `.abs()` is taken only when the pressure estimator reads it
    /// (§4.7, Open Question (c)).
    pub exchanged_momentum: f64,
    pub collisions_count: u64,
}

impl SchedulerState {
    /// Advances `particle_index` to `self.current_time` under free flight,
    /// so its `coordinates`/`last_event_time` are valid before anything
    /// reads or rewrites its velocity or event.
    pub fn synchronize(&mut self, particle_index: usize) {
        let time = self.current_time;
        let particle = &mut self.particles[particle_index];
        particle.coordinates = particle.position_at(time);
        particle.last_event_time = time;
    }

    /// Overwrites `particle_index`'s proposed next event with `candidate`
    /// only if `candidate` is strictly earlier than what is already there.
    pub fn propose(&mut self, particle_index: usize, candidate: Event) {
        let current = self.particles[particle_index].next_event;
        if candidate.time() < current.time() {
            self.particles[particle_index].next_event = candidate;
        }
    }

    /// Synchronizes every particle to `self.current_time`, then rebuilds
    /// the neighbor provider's lists from the resulting centers. Called in
    /// response to a `NeighborTransfer` event: without spatial cell
    /// decomposition, refreshing one particle's Verlet list is no cheaper
    /// than refreshing all of them.
    pub fn rebuild_neighbor_lists(&mut self) {
        let time = self.current_time;
        for particle in self.particles.iter_mut() {
            particle.coordinates = particle.position_at(time);
            particle.last_event_time = time;
        }
        let centers: Vec<_> = self.particles.iter().map(|p| p.coordinates).collect();
        let diameters: Vec<_> = self.particles.iter().map(|p| p.diameter).collect();
        self.neighbor_provider.rebuild(&centers, &diameters, &self.box_);
    }
}
