/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The brute-force neighbor provider: no padding beyond direct contact,
//! recomputed in full on every `rebuild`. Used directly for small packings
//! and as the base provider `VerletListNeighborProvider` wraps.

use super::{brute_force_lists, NeighborProvider};
use crate::geometry::{PeriodicBox, Vec3};

#[derive(Debug, Clone, Default)]
pub struct NaiveNeighborProvider {
    lists: Vec<Vec<usize>>,
}

impl NaiveNeighborProvider {
    pub fn new() -> Self {
        NaiveNeighborProvider { lists: Vec::new() }
    }
}

impl NeighborProvider for NaiveNeighborProvider {
    fn rebuild(&mut self, centers: &[Vec3], diameters: &[f64], box_: &PeriodicBox) {
        self.lists = brute_force_lists(centers, diameters, 0.0, box_);
    }

    fn neighbor_indexes(&self, particle_index: usize) -> &[usize] {
        &self.lists[particle_index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_touching_pair_only() {
        let box_ = PeriodicBox::cubic(100.0);
        let centers = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.9, 0.0, 0.0), Vec3::new(50.0, 0.0, 0.0)];
        let diameters = vec![1.0, 1.0, 1.0];
        let mut provider = NaiveNeighborProvider::new();
        provider.rebuild(&centers, &diameters, &box_);

        assert_eq!(provider.neighbor_indexes(0), &[1]);
        assert_eq!(provider.neighbor_indexes(1), &[0]);
        assert!(provider.neighbor_indexes(2).is_empty());
    }
}
