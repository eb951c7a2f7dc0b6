/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Grounded on `Source/NeighborTransferEventProvider.cpp`: schedules the
//! moment a particle drifts far enough from its Verlet list's frozen
//! centers that the list may miss a neighbor, so the scheduler knows when
//! to rebuild. A no-op when the active neighbor provider has no such
//! boundary (the brute-force provider, which has nothing to rebuild
//! against).

use super::EventProvider;
use crate::events::{Event, NUDGE_EPSILON};
use crate::state::SchedulerState;

#[derive(Debug, Default)]
pub struct NeighborTransferEventProvider;

impl EventProvider for NeighborTransferEventProvider {
    fn propose(&self, state: &mut SchedulerState, owner: usize, trigger: &Event) {
        // If we were triggered by our own NeighborTransfer, nudge time
        // forward first so the boundary search does not immediately find
        // the same crossing again (mirrors the original's `currentTime +=
        // NUDGE_EPSILON` special case).
        let search_time = if matches!(trigger, Event::NeighborTransfer { particle, .. } if *particle == owner) {
            state.current_time + NUDGE_EPSILON
        } else {
            state.current_time
        };

        let boundary_time = {
            let particle = &state.particles[owner];
            state.neighbor_provider.time_to_leave_sphere(particle)
        };

        let Some(boundary_time) = boundary_time else { return };
        if boundary_time >= search_time {
            state.propose(owner, Event::NeighborTransfer { time: boundary_time, particle: owner });
        }
    }
}
