//! Crossing vertices already created per lattice edge
//!
//! Neighbouring cells (and cells of different sizes) that see the same
//! crossing must reference one vertex. Every crossing is keyed by the
//! lattice edge it lies on: the lower lattice point plus the axis.

use glam::IVec3;

use crate::grid::{GridEdge, GridIndex};
use crate::vertex::VertexId;

/// Dense per-lattice-point table of crossing vertices, one slot per axis
#[derive(Debug, Clone)]
pub struct EdgeVertexCache {
    dims: IVec3,
    slots: Vec<[Option<VertexId>; 3]>,
    len: usize,
}

impl EdgeVertexCache {
    pub fn new(dims: IVec3) -> Self {
        let count = (dims.x.max(0) * dims.y.max(0) * dims.z.max(0)) as usize;
        Self {
            dims,
            slots: vec![[None; 3]; count],
            len: 0,
        }
    }

    fn offset(&self, index: GridIndex) -> Option<usize> {
        let inside = index.cmpge(IVec3::ZERO).all() && index.cmplt(self.dims).all();
        inside.then(|| ((index.x * self.dims.y + index.y) * self.dims.z + index.z) as usize)
    }

    /// Vertex already created for `edge`
    pub fn get(&self, edge: &GridEdge) -> Option<VertexId> {
        let offset = self.offset(edge.index)?;
        self.slots[offset][edge.axis.index()]
    }

    /// Record the vertex for `edge`; the first vertex stored wins
    ///
    /// Returns the vertex now associated with the edge.
    pub fn insert(&mut self, edge: &GridEdge, vertex: VertexId) -> VertexId {
        let Some(offset) = self.offset(edge.index) else {
            return vertex;
        };
        let slot = &mut self.slots[offset][edge.axis.index()];
        if let Some(existing) = *slot {
            return existing;
        }
        *slot = Some(vertex);
        self.len += 1;
        vertex
    }

    /// Number of edges with a vertex
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Axis;

    #[test]
    fn test_edges_are_keyed_by_axis() {
        let mut cache = EdgeVertexCache::new(IVec3::splat(9));
        let x = GridEdge::new(IVec3::new(1, 2, 3), Axis::X);
        let y = GridEdge::new(IVec3::new(1, 2, 3), Axis::Y);

        assert!(cache.is_empty());
        assert_eq!(cache.insert(&x, 5), 5);
        assert_eq!(cache.get(&x), Some(5));
        assert_eq!(cache.get(&y), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_first_vertex_wins() {
        let mut cache = EdgeVertexCache::new(IVec3::splat(9));
        let edge = GridEdge::new(IVec3::new(8, 0, 4), Axis::Z);
        cache.insert(&edge, 3);
        assert_eq!(cache.insert(&edge, 11), 3);
        assert_eq!(cache.get(&edge), Some(3));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_out_of_range_edges_are_not_cached() {
        let mut cache = EdgeVertexCache::new(IVec3::splat(9));
        let edge = GridEdge::new(IVec3::new(9, 0, 0), Axis::X);
        cache.insert(&edge, 1);
        assert_eq!(cache.get(&edge), None);
        assert!(cache.is_empty());
    }
}
