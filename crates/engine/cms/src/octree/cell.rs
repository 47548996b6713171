//! Octree cells

use glam::DVec3;

use crate::grid::GridIndex;
use crate::vertex::VertexId;

use super::address::{Address, Octant};
use super::face::{FaceId, Side};

/// Index into the octree's cell arena
pub type CellId = usize;

/// Closed loop of vertex ids bounding one leaf cell's surface patch
pub type Component = Vec<VertexId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    /// Subdivided, or empty and skipped when it has no children
    Branch,
    /// Terminal cell straddling the surface
    Leaf,
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub id: CellId,
    pub level: u32,
    pub state: CellState,
    pub parent: Option<CellId>,
    /// Position within the parent, `None` for the root
    pub octant: Option<Octant>,
    pub children: Option<[CellId; 8]>,
    pub address: Address,
    /// Lattice corner with the smallest coordinates
    pub origin: GridIndex,
    /// Edge length in lattice steps
    pub size: i32,
    /// Lattice indices of the 8 corners, by octant bits
    pub corners: [GridIndex; 8],
    pub faces: [FaceId; 6],
    /// Closed loops found by tracing (leaf cells only)
    pub components: Vec<Component>,
    min: DVec3,
    max: DVec3,
}

impl Cell {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: CellId,
        level: u32,
        parent: Option<CellId>,
        octant: Option<Octant>,
        address: Address,
        origin: GridIndex,
        size: i32,
        bounds: (DVec3, DVec3),
    ) -> Self {
        let corners = Octant::ALL.map(|o| origin + o.offset() * size);
        let faces = Side::ALL.map(|side| id * 6 + side.index());
        Self {
            id,
            level,
            state: CellState::Branch,
            parent,
            octant,
            children: None,
            address,
            origin,
            size,
            corners,
            faces,
            components: Vec::new(),
            min: bounds.0,
            max: bounds.1,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.state == CellState::Leaf
    }

    pub fn has_children(&self) -> bool {
        self.children.is_some()
    }

    pub fn face(&self, side: Side) -> FaceId {
        self.faces[side.index()]
    }

    pub fn corner(&self, octant: Octant) -> GridIndex {
        self.corners[octant.index()]
    }

    /// World-space min and max corners
    pub fn bounds(&self) -> (DVec3, DVec3) {
        (self.min, self.max)
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> DVec3 {
        (self.max - self.min) * 0.5
    }
}
