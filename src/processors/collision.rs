/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Grounded on `Source/CollisionEventProcessor.cpp`: applies the elastic
//! exchange from [`crate::collision::CollisionCalculus::resolve_collision`]
//! to both particles, accumulates the momentum term for the pressure
//! estimator, then recomputes events for both `event.particle` and
//! `event.neighbor` (the collision changed both their trajectories).

use super::EventProcessor;
use crate::collision::CollisionCalculus;
use crate::events::Event;
use crate::heap::IndexedHeap;
use crate::providers::CompositeEventProvider;
use crate::state::SchedulerState;

#[derive(Debug, Default)]
pub struct CollisionEventProcessor;

impl EventProcessor for CollisionEventProcessor {
    fn should_process(&self, event: &Event) -> bool {
        matches!(event, Event::Collision { .. })
    }

    fn process(&mut self, state: &mut SchedulerState, heap: &mut IndexedHeap, provider: &CompositeEventProvider, event: Event) {
        let Event::Collision { time, particle, neighbor } = event else {
            unreachable!("CollisionEventProcessor only handles Collision events")
        };

        let calculus: CollisionCalculus = state.collision_calculus;
        let (first_velocity, second_velocity, exchanged_momentum) = {
            let (first, second) = borrow_pair(&state.particles, particle, neighbor);
            calculus.resolve_collision(time, first, second, &state.box_)
        };

        state.particles[particle].velocity = first_velocity;
        state.particles[neighbor].velocity = second_velocity;
        state.exchanged_momentum += exchanged_momentum;
        state.collisions_count += 1;

        provider.set_next_events(state, heap, particle, event);

        let symmetric_event = Event::Collision { time, particle: neighbor, neighbor: particle };
        provider.set_next_events(state, heap, neighbor, symmetric_event);
    }
}

fn borrow_pair<T>(particles: &[T], i: usize, j: usize) -> (&T, &T) {
    assert_ne!(i, j);
    if i < j {
        let (left, right) = particles.split_at(j);
        (&left[i], &right[0])
    } else {
        let (left, right) = particles.split_at(i);
        (&right[0], &left[j])
    }
}
