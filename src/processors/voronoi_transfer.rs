/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Grounded on `Source/VoronoiTransferEventProcessor.cpp`: specular
//! reflection of the particle's velocity across the crossed Voronoi
//! plane, or a bounce-back if `reflect_from_spheres` is set (in which case
//! `VoronoiInscribedSphereTransfer` is the reflecting event instead of the
//! polytope face).

use super::EventProcessor;
use crate::events::Event;
use crate::heap::IndexedHeap;
use crate::providers::CompositeEventProvider;
use crate::state::SchedulerState;
use crate::voronoi::VoronoiTesselation;

#[derive(Debug)]
pub struct VoronoiTransferEventProcessor {
    tesselation: VoronoiTesselation,
    pub reflect_from_spheres: bool,
}

impl VoronoiTransferEventProcessor {
    pub fn new(tesselation: VoronoiTesselation) -> Self {
        VoronoiTransferEventProcessor { tesselation, reflect_from_spheres: false }
    }
}

impl EventProcessor for VoronoiTransferEventProcessor {
    fn should_process(&self, event: &Event) -> bool {
        matches!(event, Event::VoronoiTransfer { .. } | Event::VoronoiInscribedSphereTransfer { .. })
    }

    fn process(&mut self, state: &mut SchedulerState, heap: &mut IndexedHeap, provider: &CompositeEventProvider, event: Event) {
        if self.reflect_from_spheres {
            let particle = event.owner().expect("Voronoi events always own a particle");
            state.particles[particle].velocity = state.particles[particle].velocity * -1.0;
            provider.set_next_events(state, heap, particle, event);
            return;
        }

        match event {
            Event::VoronoiInscribedSphereTransfer { particle, .. } => {
                // Nothing crossed the particle's own surface; just reschedule.
                provider.set_next_events(state, heap, particle, event);
            }
            Event::VoronoiTransfer { particle, plane, .. } => {
                let polytope = self.tesselation.polytope(particle);
                let normal = polytope.planes[plane].normal;

                let velocity = state.particles[particle].velocity;
                let dot_product = velocity.dot(&normal);
                state.particles[particle].velocity = velocity - normal * (2.0 * dot_product);

                provider.set_next_events(state, heap, particle, event);
            }
            _ => unreachable!("VoronoiTransferEventProcessor only handles Voronoi events"),
        }
    }
}
