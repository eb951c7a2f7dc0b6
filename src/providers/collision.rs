/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Grounded on
//! `Source/CollisionEventProvider.cpp`: scans `owner`'s neighbor list for
//! the earliest valid collision, where "valid" means the candidate time is
//! not before the neighbor's own currently scheduled event (a neighbor
//! that is about to do something else first cannot be collided with using
//! stale state).

use super::EventProvider;
use crate::events::Event;
use crate::state::SchedulerState;

#[derive(Debug, Default)]
pub struct CollisionEventProvider;

impl EventProvider for CollisionEventProvider {
    fn propose(&self, state: &mut SchedulerState, owner: usize, trigger: &Event) {
        let skip_neighbor = trigger.neighbor();
        let current_time = state.current_time;

        let neighbors = state.neighbor_provider.neighbor_indexes(owner).to_vec();

        let mut best_time = f64::INFINITY;
        let mut best_neighbor = None;

        for neighbor_index in neighbors {
            if Some(neighbor_index) == skip_neighbor {
                continue;
            }

            let (particle, neighbor) = borrow_pair(&state.particles, owner, neighbor_index);
            let candidate_time = match state.collision_calculus.collision_time(current_time, particle, neighbor, &state.box_) {
                Some(t) => t,
                None => continue,
            };

            let collision_is_valid = candidate_time >= current_time;
            let neighbor_is_available = candidate_time <= neighbor.next_event.time();
            let is_earlier = candidate_time < best_time;

            if collision_is_valid && neighbor_is_available && is_earlier {
                best_time = candidate_time;
                best_neighbor = Some(neighbor_index);
            }
        }

        if let Some(neighbor_index) = best_neighbor {
            state.propose(
                owner,
                Event::Collision { time: best_time, particle: owner, neighbor: neighbor_index },
            );
        }
    }
}

/// Borrows two distinct elements of `particles` immutably at once.
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
