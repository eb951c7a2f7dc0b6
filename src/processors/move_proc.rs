/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Grounded on `Source/MoveEventProcessor.cpp`: the event that fires for a
//! particle with no better candidate does nothing but trigger the next
//! recomputation — the particle was already synchronized to the current
//! time by the scheduler before dispatch.

use super::EventProcessor;
use crate::events::Event;
use crate::heap::IndexedHeap;
use crate::providers::CompositeEventProvider;
use crate::state::SchedulerState;

#[derive(Debug, Default)]
pub struct MoveEventProcessor;

impl EventProcessor for MoveEventProcessor {
    fn should_process(&self, event: &Event) -> bool {
        matches!(event, Event::Move { .. })
    }

    fn process(&mut self, state: &mut SchedulerState, heap: &mut IndexedHeap, provider: &CompositeEventProvider, event: Event) {
        let owner = event.owner().expect("Move events always have an owner");
        provider.set_next_events(state, heap, owner, event);
    }
}
