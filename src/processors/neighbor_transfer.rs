/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Grounded on `Source/NeighborTransferEventProcessor.cpp`: the original
//! calls `StartMove`/`EndMove` to refresh a single particle's cell-indexed
//! Verlet entry. Our neighbor providers have no cell decomposition (§4.2),
//! so the equivalent refresh is a full [`SchedulerState::rebuild_neighbor_lists`]
//! — correctness-equivalent, just without the original's locality
//! optimization.

use super::EventProcessor;
use crate::events::Event;
use crate::heap::IndexedHeap;
use crate::providers::CompositeEventProvider;
use crate::state::SchedulerState;

#[derive(Debug, Default)]
pub struct NeighborTransferEventProcessor;

impl EventProcessor for NeighborTransferEventProcessor {
    fn should_process(&self, event: &Event) -> bool {
        matches!(event, Event::NeighborTransfer { .. })
    }

    fn process(&mut self, state: &mut SchedulerState, heap: &mut IndexedHeap, provider: &CompositeEventProvider, event: Event) {
        let owner = event.owner().expect("NeighborTransfer events always have an owner");
        state.rebuild_neighbor_lists();
        provider.set_next_events(state, heap, owner, event);
    }
}
