//! Half-faces and the strips they carry

use crate::grid::{Axis, GridEdge};
use crate::vertex::VertexId;

use super::cell::CellId;

/// Index into the octree's face arena (`cell * 6 + side`)
pub type FaceId = usize;

/// Which of a cell's six faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Back = 0,   // -z
    Front = 1,  // +z
    Bottom = 2, // -y
    Top = 3,    // +y
    Left = 4,   // -x
    Right = 5,  // +x
}

impl Side {
    pub const ALL: [Side; 6] = [
        Side::Back,
        Side::Front,
        Side::Bottom,
        Side::Top,
        Side::Left,
        Side::Right,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Axis the face is perpendicular to
    pub fn axis(self) -> Axis {
        match self {
            Side::Back | Side::Front => Axis::Z,
            Side::Bottom | Side::Top => Axis::Y,
            Side::Left | Side::Right => Axis::X,
        }
    }

    /// Octant bit selecting this side's half of a cell
    pub fn axis_bit(self) -> usize {
        match self.axis() {
            Axis::X => 0b100,
            Axis::Y => 0b010,
            Axis::Z => 0b001,
        }
    }

    /// Whether the face looks along the positive axis
    pub fn is_positive(self) -> bool {
        self.index() % 2 == 1
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::Back => Side::Front,
            Side::Front => Side::Back,
            Side::Bottom => Side::Top,
            Side::Top => Side::Bottom,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Face state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceState {
    /// Face of a subdivided or empty cell
    Branch,
    /// Face of a leaf cell, meshed from its own strips
    Leaf,
    /// Leaf face whose twin is subdivided further
    Transitional,
}

/// One end of a strip: the crossing vertex and the lattice edge it lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripEnd {
    pub vertex: VertexId,
    pub edge: GridEdge,
}

/// Open two-vertex segment across a face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strip {
    pub ends: [StripEnd; 2],
}

impl Strip {
    pub fn new(start: StripEnd, end: StripEnd) -> Self {
        Self { ends: [start, end] }
    }

    pub fn vertices(&self) -> [VertexId; 2] {
        [self.ends[0].vertex, self.ends[1].vertex]
    }

    /// Smaller of the two vertex ids
    pub fn min_vertex(&self) -> VertexId {
        self.ends[0].vertex.min(self.ends[1].vertex)
    }

    /// Whether either end lies on `edge`
    pub fn touches(&self, edge: &GridEdge) -> bool {
        self.ends.iter().any(|end| end.edge == *edge)
    }
}

/// One cell's view of a face shared with a neighbour
#[derive(Debug, Clone)]
pub struct Face {
    pub id: FaceId,
    pub cell: CellId,
    pub side: Side,
    pub state: FaceState,
    /// Same-level neighbour's face across the boundary
    pub twin: Option<FaceId>,
    /// Enclosing face one level up
    pub parent: Option<FaceId>,
    /// Quarter faces one level down
    pub children: [Option<FaceId>; 4],
    /// Owned and replaced wholesale by transition resolution
    pub strips: Vec<Strip>,
}

impl Face {
    pub fn new(cell: CellId, side: Side) -> Self {
        Self {
            id: cell * 6 + side.index(),
            cell,
            side,
            state: FaceState::Branch,
            twin: None,
            parent: None,
            children: [None; 4],
            strips: Vec::new(),
        }
    }

    pub fn has_children(&self) -> bool {
        self.children.iter().any(Option::is_some)
    }

    /// Ordered vertex pairs of the strip list
    pub fn segments(&self) -> Vec<[VertexId; 2]> {
        self.strips.iter().map(Strip::vertices).collect()
    }

    /// Whether any strip ends on `edge`
    pub fn has_crossing(&self, edge: &GridEdge) -> bool {
        self.strips.iter().any(|strip| strip.touches(edge))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;

    fn end(vertex: VertexId, x: i32, axis: Axis) -> StripEnd {
        StripEnd {
            vertex,
            edge: GridEdge::new(IVec3::new(x, 0, 0), axis),
        }
    }

    #[test]
    fn test_side_opposites() {
        for side in Side::ALL {
            assert_ne!(side, side.opposite());
            assert_eq!(side.opposite().opposite(), side);
            assert_eq!(side.axis(), side.opposite().axis());
            assert_ne!(side.is_positive(), side.opposite().is_positive());
            assert_eq!(Side::from_index(side.index()), Some(side));
        }
        assert_eq!(Side::from_index(6), None);
    }

    #[test]
    fn test_face_ids_follow_cells() {
        let face = Face::new(3, Side::Top);
        assert_eq!(face.id, 21);
        assert_eq!(face.state, FaceState::Branch);
        assert!(!face.has_children());
    }

    #[test]
    fn test_segments_follow_strip_order() {
        let mut face = Face::new(0, Side::Back);
        face.strips.push(Strip::new(end(4, 0, Axis::X), end(2, 1, Axis::Y)));
        face.strips.push(Strip::new(end(7, 2, Axis::X), end(9, 3, Axis::Y)));

        assert_eq!(face.segments(), vec![[4, 2], [7, 9]]);
        assert_eq!(face.strips[0].min_vertex(), 2);
        assert!(face.has_crossing(&GridEdge::new(IVec3::new(3, 0, 0), Axis::Y)));
        assert!(!face.has_crossing(&GridEdge::new(IVec3::new(3, 0, 0), Axis::X)));
    }
}
