/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Event processors (C6): apply the state transition a fired event implies,
//! then hand off to [`crate::providers::CompositeEventProvider`] to
//! recompute whatever events that transition invalidated.
//!
//! Grounded on `BaseEventProcessor.h` / `CompositeEventProcessor.cpp`:
//! the original's `BaseEventProcessor::ProcessEvent` synchronizes the
//! owning particle to `currentTime` before dispatching to the concrete
//! subclass; we do that synchronization once in
//! [`crate::scheduler::Scheduler::run_cycle`] rather than per-processor,
//! since every processor needs it and Rust has no free virtual base-class
//! hook to hang it from.

pub mod collision;
pub mod composite;
pub mod move_proc;
pub mod neighbor_transfer;
pub mod voronoi_transfer;
pub mod wall_transfer;

use crate::events::Event;
use crate::heap::IndexedHeap;
use crate::providers::CompositeEventProvider;
use crate::state::SchedulerState;

pub trait EventProcessor {
    fn should_process(&self, event: &Event) -> bool;

    fn process(&mut self, state: &mut SchedulerState, heap: &mut IndexedHeap, provider: &CompositeEventProvider, event: Event);
}

pub use collision::CollisionEventProcessor;
pub use composite::CompositeEventProcessor;
pub use move_proc::MoveEventProcessor;
pub use neighbor_transfer::NeighborTransferEventProcessor;
pub use voronoi_transfer::VoronoiTransferEventProcessor;
pub use wall_transfer::WallTransferEventProcessor;
