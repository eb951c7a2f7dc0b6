/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Neighbor finding (C2): who each particle can possibly collide with next.
//!
//! Grounded on
//! `Generation/PackingServices/DistanceServices/Headers/VerletListNeighborProvider.h`
//! and its `INeighborProvider` base interface. [`naive`] is the brute-force
//! provider the original decorates; [`verlet`] is the decorator that makes
//! rebuilds infrequent.

pub mod naive;
pub mod verlet;

use crate::geometry::{PeriodicBox, Vec3};

/// Anything that can answer "who is within colliding range of particle
/// `i`", given a snapshot of centers and diameters.
pub trait NeighborProvider {
    /// Rebuilds the provider's internal lists from the given centers.
    /// `centers[i]` and `diameters[i]` describe particle `i`.
    fn rebuild(&mut self, centers: &[Vec3], diameters: &[f64], box_: &PeriodicBox);

    /// Neighbor indexes of particle `i`, valid until the next `rebuild`.
    fn neighbor_indexes(&self, particle_index: usize) -> &[usize];

    /// The next time `particle` drifts far enough from this provider's
    /// frozen reference centers that its list may need rebuilding. `None`
    /// if this provider never needs a mid-cycle rebuild (the brute-force
    /// provider recomputes everything up front and has no notion of this).
    fn time_to_leave_sphere(&self, _particle: &crate::particle::MovingParticle) -> Option<f64> {
        None
    }
}

/// All-pairs overlap test under the minimum-image convention: particles `i`
/// and `j` are neighbors if their inflated radii (`(d_i + d_j) / 2 + padding`)
/// overlap. Shared by [`naive::NaiveNeighborProvider`] and as the base
/// provider a [`verlet::VerletListNeighborProvider`] rebuilds against.
pub(crate) fn brute_force_lists(centers: &[Vec3], diameters: &[f64], padding: f64, box_: &PeriodicBox) -> Vec<Vec<usize>> {
    let n = centers.len();
    let mut lists = vec![Vec::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            let cutoff = (diameters[i] + diameters[j]) * 0.5 + padding;
            let distance = box_.minimum_image(centers[i], centers[j]).norm();
            if distance < cutoff {
                lists[i].push(j);
                lists[j].push(i);
            }
        }
    }
    lists
}
