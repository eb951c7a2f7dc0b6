/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Voronoi cell data used to lock particles into their own cell during growth
(§4.6, "Voronoi transfer providers").

Grounded on `Headers/Types.h`'s `VoronoiPlane`/`VoronoiPolytope` and
`VoronoiTesselationProvider.h`. The original reads a tesselation computed
by an external tool from a pair of text files (`periodicIndexesMap`,
`voronoiPlanes`); this port keeps the in-memory shape that tesselation
deserializes into ([`VoronoiPlane`], [`VoronoiPolytope`]) but leaves
constructing a [`VoronoiTesselation`] to the caller (loading it from disk
is an I/O concern, out of scope per §1) rather than porting the file
reader.

*/

use crate::geometry::Vec3;

/// One face of a particle's Voronoi cell: the plane `dot(x, normal) =
/// displacement`, shared with `neighbor`. `normal` points away from
/// `particle`, towards `neighbor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoronoiPlane {
    pub normal: Vec3,
    pub displacement: f64,
    pub particle: usize,
    pub neighbor: usize,
}

impl VoronoiPlane {
    /// Signed distance from `point` to this plane, positive on `particle`'s side.
    pub fn signed_distance(&self, point: Vec3) -> f64 {
        self.displacement - point.dot(&self.normal)
    }
}

/// A particle's Voronoi cell: its bounding faces plus the largest sphere
/// that fits inside it, used by the "reflect from spheres" mode
/// (`VoronoiTransferEventProcessor::reflectFromSpheres`).
#[derive(Debug, Clone)]
pub struct VoronoiPolytope {
    pub planes: Vec<VoronoiPlane>,
    pub inscribed_sphere_center: Vec3,
    pub inscribed_sphere_radius: f64,
}

/// One polytope per particle, indexed by particle index. Built once,
/// ahead of a run, from an externally computed tesselation (§9, "Resource
/// lifetime").
#[derive(Debug, Clone)]
pub struct VoronoiTesselation {
    polytopes: Vec<VoronoiPolytope>,
}

impl VoronoiTesselation {
    pub fn new(polytopes: Vec<VoronoiPolytope>) -> Self {
        VoronoiTesselation { polytopes }
    }

    pub fn polytope(&self, particle: usize) -> &VoronoiPolytope {
        &self.polytopes[particle]
    }

    pub fn len(&self) -> usize {
        self.polytopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polytopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_distance_is_zero_on_the_plane() {
        let plane = VoronoiPlane { normal: Vec3::new(1.0, 0.0, 0.0), displacement: 2.0, particle: 0, neighbor: 1 };
        assert_eq!(plane.signed_distance(Vec3::new(2.0, 5.0, -1.0)), 0.0);
    }

    #[test]
    fn signed_distance_is_positive_on_the_particle_side() {
        let plane = VoronoiPlane { normal: Vec3::new(1.0, 0.0, 0.0), displacement: 2.0, particle: 0, neighbor: 1 };
        assert!(plane.signed_distance(Vec3::new(1.0, 0.0, 0.0)) > 0.0);
    }
}
