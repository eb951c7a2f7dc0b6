/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The scheduler (C8): owns the indexed heap, the particle state, and the
composite provider/processor pair, and drives the event loop.

Grounded on
`Generation/PackingGenerators/LubachevsckyStillinger/Source/LubachevsckyStillingerStep.cpp`'s
main cycle (`RunEventsStepsPack`/`DoStep` machinery): pop the heap's top
event, dispatch it through the composite processor (which both applies the
state change and recomputes whatever it invalidated), repeat. The original
threads providers and processors together through shared-pointer services;
here both receive only the single `&mut SchedulerState` borrow for the
duration of one `run_cycle` call (see REDESIGN FLAGS / [`crate::state`]).

*/

use crate::collision::CollisionCalculus;
use crate::events::{compare_events, Event};
use crate::geometry::PeriodicBox;
use crate::heap::{IndexedHeap, Keys};
use crate::neighbors::NeighborProvider;
use crate::particle::{copy_packing_to_moving, Packing};
use crate::processors::{CompositeEventProcessor, EventProcessor};
use crate::providers::{CompositeEventProvider, EventProvider};
use crate::state::SchedulerState;
use crate::velocity::VelocityService;

/// Statistics accumulated over one [`Scheduler::run_cycle`] call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleStats {
    pub events_processed: u64,
    pub collisions: u64,
    /// `sum |exchanged momentum|` accumulated since the last reset,
    /// consumed by the pressure estimator (§4.7, Open Question (c)).
    pub exchanged_momentum_abs: f64,
    pub final_time: f64,
}

pub struct Scheduler {
    state: SchedulerState,
    heap: IndexedHeap,
    provider: CompositeEventProvider,
    processor: CompositeEventProcessor,
    velocity_service: VelocityService,
}

struct StateKeys<'a> {
    state: &'a SchedulerState,
}

impl Keys for StateKeys<'_> {
    fn compare(&self, a: usize, b: usize) -> std::cmp::Ordering {
        compare_events(&self.state.particles[a].next_event, a, &self.state.particles[b].next_event, b)
    }
}

impl Scheduler {
    pub fn new(
        packing: &Packing,
        box_: PeriodicBox,
        collision_calculus: CollisionCalculus,
        neighbor_provider: Box<dyn NeighborProvider>,
        providers: Vec<Box<dyn EventProvider>>,
        processors: Vec<Box<dyn EventProcessor>>,
        velocity_service: VelocityService,
    ) -> Self {
        let particles = copy_packing_to_moving(packing);
        let n = particles.len();

        let mut state = SchedulerState {
            particles,
            box_,
            collision_calculus,
            neighbor_provider,
            current_time: 0.0,
            exchanged_momentum: 0.0,
            collisions_count: 0,
        };
        state.rebuild_neighbor_lists();

        let heap = IndexedHeap::init(n, &StateKeys { state: &state });
        let provider = CompositeEventProvider::new(providers);
        let processor = CompositeEventProcessor::new(processors);

        let mut scheduler = Scheduler { state, heap, provider, processor, velocity_service };
        scheduler.seed_initial_events();
        scheduler
    }

    fn seed_initial_events(&mut self) {
        let n = self.state.particles.len();
        for particle_index in 0..n {
            let trigger = Event::Move { time: 0.0, particle: particle_index };
            self.provider.set_next_events(&mut self.state, &mut self.heap, particle_index, trigger);
        }
    }

    pub fn velocity_service(&self) -> &VelocityService {
        &self.velocity_service
    }

    pub fn particles(&self) -> &[crate::particle::MovingParticle] {
        &self.state.particles
    }

    pub fn particles_mut(&mut self) -> &mut [crate::particle::MovingParticle] {
        &mut self.state.particles
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time
    }

    pub fn box_(&self) -> &PeriodicBox {
        &self.state.box_
    }

    /// Replaces the collision calculus (used when a compression-rate
    /// strategy changes `ratio_growth_rate` between cycles, §4.6).
    pub fn set_collision_calculus(&mut self, calculus: CollisionCalculus) {
        self.state.collision_calculus = calculus;
    }

    pub fn collision_calculus(&self) -> CollisionCalculus {
        self.state.collision_calculus
    }

    /// Rescales every particle's velocity to the target temperature,
    /// synchronizing them to `self.current_time()` first.
    pub fn rescale_velocities(&mut self) {
        let current_time = self.state.current_time;
        let kinetic_energy = self.velocity_service.actual_kinetic_energy(&self.state.particles);
        self.velocity_service.rescale_velocities(current_time, kinetic_energy, &mut self.state.particles);
    }

    pub fn exchanged_momentum(&self) -> f64 {
        self.state.exchanged_momentum
    }

    pub fn reset_exchanged_momentum(&mut self) {
        self.state.exchanged_momentum = 0.0;
    }

    /// Subtracts the current global time from every particle's
    /// `last_event_time`/`next_event` and from the clock itself, returning
    /// the amount subtracted. Called once per cycle (§4.4, "Rescaling") so
    /// long runs do not lose precision to a growing time origin; safe only
    /// once every particle has been synchronized to `current_time` (e.g. by
    /// [`Scheduler::rescale_velocities`]), since it assumes `last_event_time
    /// == current_time` for all of them.
    pub fn reset_time(&mut self) -> f64 {
        let origin = self.state.current_time;
        if origin == 0.0 {
            return 0.0;
        }
        for particle in self.state.particles.iter_mut() {
            particle.last_event_time -= origin;
            particle.next_event = shift_event_time(particle.next_event, origin);
        }
        self.state.current_time = 0.0;
        origin
    }

    /// Invalidates every particle's scheduled event and reseeds it from
    /// scratch, as if the scheduler had just been constructed. Required
    /// whenever every particle's velocity or the growth rate changed in a
    /// way that makes the previously scheduled events' comparisons with
    /// their neighbors stale (§4.7: rescaling, and §4.6: a compression
    /// strategy changing `ratio_growth_rate`).
    pub fn recompute_all_events(&mut self) {
        for particle in self.state.particles.iter_mut() {
            particle.next_event = Event::Invalid;
        }
        self.heap = IndexedHeap::init(self.state.particles.len(), &StateKeys { state: &self.state });
        self.seed_initial_events();
    }

    /// Naive `O(N^2)` closest-pair scan over the current, already
    /// synchronized positions — the independent oracle Testable Property 1
    /// checks the engine against. Returns `(i, j, distance)` for the closest
    /// pair, or `None` for fewer than two particles.
    pub fn closest_pair(&self) -> Option<(usize, usize, f64)> {
        let particles = &self.state.particles;
        let n = particles.len();
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..n {
            for j in (i + 1)..n {
                let distance = self.state.box_.minimum_image(particles[i].coordinates, particles[j].coordinates).norm();
                if best.map(|(_, _, d)| distance < d).unwrap_or(true) {
                    best = Some((i, j, distance));
                }
            }
        }
        best
    }

    /// Copies the mobile-particle state back into the externally visible
    /// [`crate::particle::Packing`] representation (§4.7, cycle step (d));
    /// every particle must already be synchronized to `self.current_time()`.
    pub fn to_packing(&self) -> crate::particle::Packing {
        self.state.particles.iter().map(|p| p.to_external()).collect()
    }

    /// Processes up to `max_events` events, stopping early if the heap's
    /// top event is `Invalid` (nothing left to do, which should not
    /// happen in a live system but guards against an empty packing).
    pub fn run_cycle(&mut self, max_events: u64) -> CycleStats {
        let collisions_before = self.state.collisions_count;
        let momentum_before = self.state.exchanged_momentum;
        self.processor.reset_statistics();

        let mut events_processed = 0;
        for _ in 0..max_events {
            let top = self.heap.top();
            let event = self.state.particles[top].next_event;
            if event.is_invalid() {
                break;
            }

            self.state.current_time = event.time();
            self.processor.process_event(&mut self.state, &mut self.heap, &self.provider, &self.velocity_service, event);
            events_processed += 1;
        }

        CycleStats {
            events_processed,
            collisions: self.state.collisions_count - collisions_before,
            exchanged_momentum_abs: (self.state.exchanged_momentum - momentum_before).abs(),
            final_time: self.state.current_time,
        }
    }
}

/// Shifts an event's `time` field by `-origin`, preserving its kind and
/// payload. `Invalid` is returned unchanged since its time is a sentinel,
/// not a real instant.
fn shift_event_time(event: Event, origin: f64) -> Event {
    match event {
        Event::Invalid => Event::Invalid,
        Event::Move { time, particle } => Event::Move { time: time - origin, particle },
        Event::Collision { time, particle, neighbor } => Event::Collision { time: time - origin, particle, neighbor },
        Event::WallTransfer { time, particle, wall } => Event::WallTransfer { time: time - origin, particle, wall },
        Event::NeighborTransfer { time, particle } => Event::NeighborTransfer { time: time - origin, particle },
        Event::VoronoiTransfer { time, particle, plane } => Event::VoronoiTransfer { time: time - origin, particle, plane },
        Event::VoronoiInscribedSphereTransfer { time, particle } => {
            Event::VoronoiInscribedSphereTransfer { time: time - origin, particle }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionCalculus;
    use crate::geometry::{PeriodicBox, Vec3};
    use crate::neighbors::verlet::VerletListNeighborProvider;
    use crate::particle::Particle;
    use crate::processors::{CollisionEventProcessor, MoveEventProcessor, NeighborTransferEventProcessor, WallTransferEventProcessor};
    use crate::providers::{CollisionEventProvider, NeighborTransferEventProvider, WallTransferEventProvider};

    fn pair_scheduler(gap: f64, approach_speed: f64) -> Scheduler {
        let packing: Packing = vec![
            Particle { coordinates: Vec3::new(0.0, 5.0, 5.0), diameter: 1.0 },
            Particle { coordinates: Vec3::new(1.0 + gap, 5.0, 5.0), diameter: 1.0 },
        ];
        let box_ = PeriodicBox::cubic(10.0);
        let calculus = CollisionCalculus::new(1.0, 0.0);
        let neighbor_provider = Box::new(VerletListNeighborProvider::new(2.0));
        let providers: Vec<Box<dyn EventProvider>> = vec![
            Box::new(CollisionEventProvider),
            Box::new(WallTransferEventProvider),
            Box::new(NeighborTransferEventProvider),
        ];
        let processors: Vec<Box<dyn EventProcessor>> = vec![
            Box::new(CollisionEventProcessor),
            Box::new(WallTransferEventProcessor),
            Box::new(NeighborTransferEventProcessor),
            Box::new(MoveEventProcessor),
        ];
        let velocity_service = VelocityService::new(0.2);
        let mut scheduler = Scheduler::new(&packing, box_, calculus, neighbor_provider, providers, processors, velocity_service);
        scheduler.particles_mut()[0].velocity = Vec3::new(approach_speed, 0.0, 0.0);
        scheduler.particles_mut()[1].velocity = Vec3::new(-approach_speed, 0.0, 0.0);
        scheduler.recompute_all_events();
        scheduler
    }

    #[test]
    fn heap_monotonicity_holds_across_a_cycle() {
        let mut scheduler = pair_scheduler(0.5, 0.3);
        let mut last_time = 0.0;
        for _ in 0..20 {
            let top = scheduler.heap.top();
            let event = scheduler.state.particles[top].next_event;
            if event.is_invalid() {
                break;
            }
            assert!(event.time() >= last_time - 1e-12);
            last_time = event.time();
            scheduler.state.current_time = event.time();
            scheduler.processor.process_event(&mut scheduler.state, &mut scheduler.heap, &scheduler.provider, &scheduler.velocity_service, event);
        }
    }

    #[test]
    fn reset_time_zeroes_clock_and_preserves_ordering() {
        let mut scheduler = pair_scheduler(0.5, 0.3);
        scheduler.run_cycle(5);
        scheduler.rescale_velocities();
        let origin = scheduler.reset_time();
        assert!(origin > 0.0);
        assert_eq!(scheduler.current_time(), 0.0);
        for particle in scheduler.particles() {
            assert!(particle.last_event_time.abs() < 1e-9);
        }
    }

    #[test]
    fn closest_pair_matches_two_particle_distance() {
        let scheduler = pair_scheduler(0.5, 0.0);
        let (i, j, distance) = scheduler.closest_pair().unwrap();
        assert_eq!((i, j), (0, 1));
        assert!((distance - 1.5).abs() < 1e-9);
    }
}
