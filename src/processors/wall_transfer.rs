/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Grounded on `Source/WallTransferEventProcessor.cpp`: shifts the
//! crossing particle by one box length along the wall's axis.
//!
//! Per §4.7 (Open Question (b)): this only changes the particle's
//! instantaneous `coordinates`; it must *not* move any Verlet list's
//! frozen reference center, since the Verlet list's correctness proof
//! (`VerletListNeighborProvider.h`, notes 1-5) relies on centers moving
//! only at an explicit rebuild.

use super::EventProcessor;
use crate::events::Event;
use crate::heap::IndexedHeap;
use crate::providers::CompositeEventProvider;
use crate::providers::WallTransferEventProvider;
use crate::state::SchedulerState;

#[derive(Debug, Default)]
pub struct WallTransferEventProcessor;

impl EventProcessor for WallTransferEventProcessor {
    fn should_process(&self, event: &Event) -> bool {
        matches!(event, Event::WallTransfer { .. })
    }

    fn process(&mut self, state: &mut SchedulerState, heap: &mut IndexedHeap, provider: &CompositeEventProvider, event: Event) {
        let Event::WallTransfer { particle, wall, .. } = event else {
            unreachable!("WallTransferEventProcessor only handles WallTransfer events")
        };

        let axis = WallTransferEventProvider::wall_axis(wall);
        let sign = WallTransferEventProvider::outer_normal_sign(wall);
        let size = state.box_.sizes[axis];

        state.particles[particle].coordinates[axis] -= sign * size;

        provider.set_next_events(state, heap, particle, event);
    }
}
