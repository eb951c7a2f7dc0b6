/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Wall-crossing events for the periodic cubic box.
//!
//! The retrieval pack's copy of `WallTransferEventProvider.cpp` is missing
//! (only its header survives); the crossing calculus below follows the same
//! free-flight/linear-crossing style as `NeighborTransferEventProvider.cpp`
//! and the wall layout of `WallTransferEventProcessor.cpp` (2 walls per
//! axis, at coordinate `0` and `packingSize[axis]`).

use super::EventProvider;
use crate::events::Event;
use crate::geometry::DIMENSIONS;
use crate::state::SchedulerState;

/// Wall index `2*axis` is the wall at coordinate `0` on `axis`; `2*axis+1`
/// is the wall at `box_.sizes[axis]`.
#[derive(Debug, Default)]
pub struct WallTransferEventProvider;

impl WallTransferEventProvider {
    /// The axis a given wall index belongs to.
    pub fn wall_axis(wall: usize) -> usize {
        wall / 2
    }

    /// `+1.0` for the wall at the box's far edge, `-1.0` for the wall at
    /// the origin — the sign the coordinate shifts by on crossing.
    pub fn outer_normal_sign(wall: usize) -> f64 {
        if wall % 2 == 1 {
            1.0
        } else {
            -1.0
        }
    }
}

impl EventProvider for WallTransferEventProvider {
    fn propose(&self, state: &mut SchedulerState, owner: usize, _trigger: &Event) {
        let current_time = state.current_time;
        let particle = &state.particles[owner];

        let mut best_time = f64::INFINITY;
        let mut best_wall = None;

        for axis in 0..DIMENSIONS {
            let velocity = particle.velocity[axis];
            if velocity == 0.0 {
                continue;
            }
            let position = particle.coordinates[axis];
            let size = state.box_.sizes[axis];

            let target = if velocity > 0.0 { size } else { 0.0 };
            let wall = if velocity > 0.0 { 2 * axis + 1 } else { 2 * axis };

            let crossing_time = particle.last_event_time + (target - position) / velocity;
            if crossing_time < best_time {
                best_time = crossing_time;
                best_wall = Some(wall);
            }
        }

        if let Some(wall) = best_wall {
            if best_time >= current_time {
                state.propose(owner, Event::WallTransfer { time: best_time, particle: owner, wall });
            }
        }
    }
}
