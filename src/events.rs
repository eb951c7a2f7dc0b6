/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The tagged event record each particle owns at most one of at a time.
//!
//! The original C++ uses a flat `struct Event { type, time, particleIndex,
//! neighborIndex, wallIndex }` where only some fields are meaningful for a
//! given `type`. A Rust enum expresses "only `Collision` carries a neighbor
//! index, only the transfer events carry a wall index" directly, so we keep
//! the per-variant payload instead of the flat struct (see REDESIGN FLAGS).

use std::cmp::Ordering;

pub const NUDGE_EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Sentinel: never fires. Compares as larger than every other event.
    Invalid,
    /// No-op tick, used to seed the event stream for a particle that has no
    /// better candidate yet.
    Move { time: f64, particle: usize },
    Collision { time: f64, particle: usize, neighbor: usize },
    WallTransfer { time: f64, particle: usize, wall: usize },
    NeighborTransfer { time: f64, particle: usize },
    VoronoiTransfer { time: f64, particle: usize, plane: usize },
    VoronoiInscribedSphereTransfer { time: f64, particle: usize },
}

impl Default for Event {
    fn default() -> Self {
        Event::Invalid
    }
}

impl Event {
    pub fn time(&self) -> f64 {
        match *self {
            Event::Invalid => f64::INFINITY,
            Event::Move { time, .. }
            | Event::Collision { time, .. }
            | Event::WallTransfer { time, .. }
            | Event::NeighborTransfer { time, .. }
            | Event::VoronoiTransfer { time, .. }
            | Event::VoronoiInscribedSphereTransfer { time, .. } => time,
        }
    }

    pub fn owner(&self) -> Option<usize> {
        match *self {
            Event::Invalid => None,
            Event::Move { particle, .. }
            | Event::Collision { particle, .. }
            | Event::WallTransfer { particle, .. }
            | Event::NeighborTransfer { particle, .. }
            | Event::VoronoiTransfer { particle, .. }
            | Event::VoronoiInscribedSphereTransfer { particle, .. } => Some(particle),
        }
    }

    /// The collision partner, if this event is a `Collision`.
    pub fn neighbor(&self) -> Option<usize> {
        match *self {
            Event::Collision { neighbor, .. } => Some(neighbor),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Event::Invalid)
    }

    /// Total order used by the indexed heap: `Invalid` sorts last; otherwise
    /// ascending by time, ties broken by `tie_break` (the owning particle
    /// index) so that replays with the same seed are bit-for-bit
    /// reproducible (Testable Property 6).
    pub fn order_key(&self, tie_break: usize) -> (bool, f64, usize) {
        (self.is_invalid(), self.time(), tie_break)
    }
}

/// Compares two events the way the indexed heap wants them compared: by
/// `(is_invalid, time)`, ties broken by the given particle indices.
pub fn compare_events(a: &Event, a_index: usize, b: &Event, b_index: usize) -> Ordering {
    a.order_key(a_index)
        .partial_cmp(&b.order_key(b_index))
        .expect("event times are never NaN")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_sorts_last() {
        let valid = Event::Move { time: 1e9, particle: 0 };
        let invalid = Event::Invalid;
        assert_eq!(compare_events(&valid, 0, &invalid, 1), Ordering::Less);
    }

    #[test]
    fn ties_break_by_particle_index() {
        let a = Event::Move { time: 1.0, particle: 3 };
        let b = Event::Move { time: 1.0, particle: 7 };
        assert_eq!(compare_events(&a, 3, &b, 7), Ordering::Less);
        assert_eq!(compare_events(&b, 7, &a, 3), Ordering::Greater);
    }
}
