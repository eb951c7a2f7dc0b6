/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Particle state: the externally-visible [`Packing`] and the internal,
//! velocity-carrying [`MovingParticle`] the scheduler advances.

use crate::events::Event;
use crate::geometry::Vec3;

/// A particle as seen from outside the engine: position and nominal
/// diameter only, no dynamics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub coordinates: Vec3,
    pub diameter: f64,
}

/// The externally-visible packing: one [`Particle`] per index. Populated
/// from, and written back to, the [`Particle`] array at cycle boundaries
/// (§4.7); never touched mid-cycle.
pub type Packing = Vec<Particle>;

/// A particle as tracked by the EDMD core: free-flight position valid at
/// `last_event_time`, current velocity, and the single event currently
/// scheduled for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingParticle {
    pub index: usize,
    pub coordinates: Vec3,
    pub diameter: f64,
    pub velocity: Vec3,
    pub last_event_time: f64,
    pub next_event: Event,
}

impl MovingParticle {
    pub fn new(index: usize, coordinates: Vec3, diameter: f64) -> Self {
        MovingParticle {
            index,
            coordinates,
            diameter,
            velocity: Vec3::ZERO,
            last_event_time: 0.0,
            next_event: Event::Invalid,
        }
    }

    /// Position at `time`, under free flight since `last_event_time`.
    pub fn position_at(&self, time: f64) -> Vec3 {
        self.coordinates + self.velocity * (time - self.last_event_time)
    }

    pub fn to_external(&self) -> Particle {
        Particle { coordinates: self.coordinates, diameter: self.diameter }
    }
}

pub fn copy_packing_to_moving(packing: &Packing) -> Vec<MovingParticle> {
    packing
        .iter()
        .enumerate()
        .map(|(i, p)| MovingParticle::new(i, p.coordinates, p.diameter))
        .collect()
}
