/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Event providers (C5): each proposes a candidate next-event for one
//! particle; [`composite::CompositeEventProvider`] asks every provider,
//! keeps the earliest candidate, and maintains the collision-symmetry
//! invariant (§4.5).
//!
//! Grounded on `IEventProvider.h` / `BaseEventProvider.h`: the original's
//! `SetNextEvents` takes a trigger event and recomputes the triggering
//! particle's candidate; we split that into "propose a candidate" (this
//! trait) from "own the particle's current best and the heap" (the
//! composite), matching the original's own provider/composite split.

pub mod collision;
pub mod composite;
pub mod neighbor_transfer;
pub mod voronoi_transfer;
pub mod wall_transfer;

use crate::events::Event;
use crate::state::SchedulerState;

/// Proposes a next-event candidate for `owner`, writing it into
/// `state.particles[owner].next_event` via [`SchedulerState::propose`] only
/// if it improves on what is already proposed there.
///
/// `trigger` is the event that just fired and caused this recomputation;
/// providers that need to avoid immediately re-proposing the same pairing
/// (e.g. collision, to dodge a zero-distance edge case right after contact)
/// inspect it via [`Event::neighbor`].
pub trait EventProvider {
    fn propose(&self, state: &mut SchedulerState, owner: usize, trigger: &Event);
}

pub use collision::CollisionEventProvider;
pub use composite::CompositeEventProvider;
pub use neighbor_transfer::NeighborTransferEventProvider;
pub use voronoi_transfer::VoronoiTransferEventProvider;
pub use wall_transfer::WallTransferEventProvider;
