/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Grounded on `Source/CompositeEventProvider.cpp`: recomputes the
//! triggering particle's event from scratch by asking every sub-provider,
//! then maintains the invariant that a scheduled `Collision` is always
//! mirrored in both participants' `next_event` (so firing the heap's top
//! event and looking up its owner's `next_event` is always enough to know
//! the pairing, without a second heap lookup).

use super::EventProvider;
use crate::events::Event;
use crate::heap::IndexedHeap;
use crate::state::SchedulerState;

pub struct CompositeEventProvider {
    providers: Vec<Box<dyn EventProvider>>,
}

impl CompositeEventProvider {
    pub fn new(providers: Vec<Box<dyn EventProvider>>) -> Self {
        CompositeEventProvider { providers }
    }

    /// Recomputes `owner`'s next event in response to `trigger`, updates
    /// the heap, and propagates the change to a newly-paired collision
    /// partner if one was found.
    pub fn set_next_events(&self, state: &mut SchedulerState, heap: &mut IndexedHeap, owner: usize, trigger: Event) {
        state.particles[owner].next_event = Event::Invalid;

        for provider in &self.providers {
            provider.propose(state, owner, &trigger);
        }

        heap.update(owner, &ParticleKeys { state });

        let Some(neighbor) = state.particles[owner].next_event.neighbor() else { return };

        // The neighbor's previously scheduled partner (if any, and if not
        // `owner` itself) is about to be overwritten out from under it;
        // demote that stale pairing to a harmless placeholder so nothing
        // later reads a one-sided collision.
        if let Some(neighbors_neighbor) = state.particles[neighbor].next_event.neighbor() {
            if neighbors_neighbor != owner {
                let time = state.particles[neighbors_neighbor].next_event.time();
                state.particles[neighbors_neighbor].next_event = Event::Move { time, particle: neighbors_neighbor };
            }
        }

        let time = state.particles[owner].next_event.time();
        state.particles[neighbor].next_event = Event::Collision { time, particle: neighbor, neighbor: owner };
        heap.update(neighbor, &ParticleKeys { state });
    }
}

/// Adapts [`SchedulerState`]'s particle array to [`crate::heap::Keys`].
struct ParticleKeys<'a> {
    state: &'a SchedulerState,
}

impl crate::heap::Keys for ParticleKeys<'_> {
    fn compare(&self, a: usize, b: usize) -> std::cmp::Ordering {
        crate::events::compare_events(&self.state.particles[a].next_event, a, &self.state.particles[b].next_event, b)
    }
}
