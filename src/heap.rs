/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

An indexed binary min-heap over particle "next event" times (C1).

Two auxiliary arrays keep the heap indexable by the *particle's identity*
rather than by heap position: `heap[pos]` is the particle index at that
heap position, and `position[particle]` is the inverse. This lets a single
particle's key change arbitrarily and be repaired in `O(log N)` with
[`IndexedHeap::update`], without knowing in advance whether the key grew or
shrank.

Grounded on `Core/Headers/HeapUtilities.h` and
`Core/Headers/BaseOrderedPriorityQueue.h` of the original implementation:
`update` first tries to sift the element towards the root (mirroring
`SwapWithParents`) and only sifts down (`EnsureHeapProperty`) if no swap
towards the root occurred. Ties are broken by particle index so that runs
are reproducible for a fixed seed (Testable Property 6 and 10).

*/

use std::cmp::Ordering;

/// Anything that can be compared by the heap, keyed by particle index.
///
/// `Keys` abstracts over "the array of particle events" so the heap itself
/// stays free of any dependency on [`crate::events::Event`].
pub trait Keys {
    fn compare(&self, a: usize, b: usize) -> Ordering;
}

/// An indexed min-heap over `0..len` particle indices, ordered by
/// `Keys::compare`.
#[derive(Debug, Clone)]
pub struct IndexedHeap {
    /// `heap[pos]` = particle index currently at heap position `pos`.
    heap: Vec<usize>,
    /// `position[particle]` = heap position currently holding `particle`.
    position: Vec<usize>,
}

impl IndexedHeap {
    /// Builds a heap over `0..len`, assuming `keys` already holds valid
    /// entries for every index. `O(len)`.
    pub fn init(len: usize, keys: &impl Keys) -> Self {
        let mut heap: Vec<usize> = (0..len).collect();
        let mut position: Vec<usize> = (0..len).collect();

        if len > 1 {
            let last_non_leaf = len / 2 - 1;
            for node in (0..=last_non_leaf).rev() {
                Self::sift_down(&mut heap, &mut position, keys, node);
            }
        }

        IndexedHeap { heap, position }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// The particle index whose key is currently smallest.
    pub fn top(&self) -> usize {
        self.heap[0]
    }

    /// Repairs the heap after `keys`'s entry for `particle` changed
    /// arbitrarily. `O(log N)`.
    ///
    /// # Panics
    /// Panics (via bounds-checked indexing) if `particle` is out of range —
    /// calling `update` for an index the heap was not built over is a
    /// programming fault, not a recoverable error.
    pub fn update(&mut self, particle: usize, keys: &impl Keys) {
        let pos = self.position[particle];
        let swapped = Self::sift_up(&mut self.heap, &mut self.position, keys, pos);
        if !swapped {
            Self::sift_down(&mut self.heap, &mut self.position, keys, pos);
        }
    }

    fn swap(heap: &mut [usize], position: &mut [usize], a: usize, b: usize) {
        heap.swap(a, b);
        position[heap[a]] = a;
        position[heap[b]] = b;
    }

    fn parent(node: usize) -> Option<usize> {
        if node == 0 {
            None
        } else {
            Some((node - 1) / 2)
        }
    }

    /// Sifts the element at `node` towards the root while it is smaller
    /// than its parent. Returns whether any swap occurred.
    fn sift_up(heap: &mut [usize], position: &mut [usize], keys: &impl Keys, mut node: usize) -> bool {
        let mut swapped = false;
        while let Some(parent) = Self::parent(node) {
            if keys.compare(heap[node], heap[parent]) != Ordering::Less {
                break;
            }
            Self::swap(heap, position, node, parent);
            node = parent;
            swapped = true;
        }
        swapped
    }

    /// Restores the heap property at `node` by sifting it down.
    fn sift_down(heap: &mut [usize], position: &mut [usize], keys: &impl Keys, mut node: usize) {
        let len = heap.len();
        loop {
            let left = 2 * node + 1;
            let right = 2 * node + 2;
            let mut smallest = node;

            if left < len && keys.compare(heap[left], heap[smallest]) == Ordering::Less {
                smallest = left;
            }
            if right < len && keys.compare(heap[right], heap[smallest]) == Ordering::Less {
                smallest = right;
            }
            if smallest == node {
                return;
            }
            Self::swap(heap, position, node, smallest);
            node = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    struct VecKeys(Vec<f64>);
    impl Keys for VecKeys {
        fn compare(&self, a: usize, b: usize) -> Ordering {
            self.0[a].partial_cmp(&self.0[b]).unwrap()
        }
    }

    fn brute_force_min(keys: &[f64]) -> usize {
        keys.iter()
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn top_matches_brute_force_after_random_updates() {
        let mut rng = StdRng::seed_from_u64(42);
        let n = 64;
        let mut values: Vec<f64> = (0..n).map(|_| rng.random_range(0.0..1e6)).collect();
        let mut keys = VecKeys(values.clone());
        let mut heap = IndexedHeap::init(n, &keys);

        assert_eq!(heap.top(), brute_force_min(&values));

        for _ in 0..10_000 {
            let i = rng.random_range(0..n);
            values[i] = rng.random_range(0.0..1e6);
            keys.0[i] = values[i];
            heap.update(i, &keys);
            assert_eq!(heap.top(), brute_force_min(&values));
        }
    }

    #[test]
    fn single_element_heap() {
        let keys = VecKeys(vec![1.0]);
        let heap = IndexedHeap::init(1, &keys);
        assert_eq!(heap.top(), 0);
    }
}
