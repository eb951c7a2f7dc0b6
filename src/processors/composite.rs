/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Grounded on `Source/CompositeEventProcessor.cpp`: synchronizes the
//! firing event's owner (and, for a collision, its partner) to the event's
//! time once, then dispatches to the first processor whose
//! `should_process` matches — mirroring the original's decision to hoist
//! synchronization out of each concrete processor "to avoid being called
//! for each processor" and to keep dispatch a flat scan rather than an
//! indexed jump table, since both measured the same in the original's own
//! benchmark.

use super::EventProcessor;
use crate::events::Event;
use crate::heap::IndexedHeap;
use crate::providers::CompositeEventProvider;
use crate::state::SchedulerState;
use crate::velocity::VelocityService;
use std::collections::HashMap;

pub struct CompositeEventProcessor {
    processors: Vec<Box<dyn EventProcessor>>,
    event_counts: HashMap<&'static str, u64>,
}

impl CompositeEventProcessor {
    pub fn new(processors: Vec<Box<dyn EventProcessor>>) -> Self {
        CompositeEventProcessor { processors, event_counts: HashMap::new() }
    }

    pub fn reset_statistics(&mut self) {
        self.event_counts.clear();
    }

    pub fn event_count(&self, label: &str) -> u64 {
        self.event_counts.get(label).copied().unwrap_or(0)
    }

    fn label(event: &Event) -> &'static str {
        match event {
            Event::Invalid => "invalid",
            Event::Move { .. } => "move",
            Event::Collision { .. } => "collision",
            Event::WallTransfer { .. } => "wall_transfer",
            Event::NeighborTransfer { .. } => "neighbor_transfer",
            Event::VoronoiTransfer { .. } => "voronoi_transfer",
            Event::VoronoiInscribedSphereTransfer { .. } => "voronoi_inscribed_sphere_transfer",
        }
    }

    pub fn process_event(
        &mut self,
        state: &mut SchedulerState,
        heap: &mut IndexedHeap,
        provider: &CompositeEventProvider,
        velocity_service: &VelocityService,
        event: Event,
    ) {
        *self.event_counts.entry(Self::label(&event)).or_insert(0) += 1;

        let time = event.time();
        if let Some(owner) = event.owner() {
            velocity_service.synchronize_with_current_time(time, &mut state.particles[owner]);
        }
        if let Some(neighbor) = event.neighbor() {
            velocity_service.synchronize_with_current_time(time, &mut state.particles[neighbor]);
        }

        for processor in self.processors.iter_mut() {
            if processor.should_process(&event) {
                processor.process(state, heap, provider, event);
                return;
            }
        }
    }
}
