//! Output vertices and small vector helpers

use glam::DVec3;

use crate::octree::CellId;

/// Tolerance for near-zero lengths, values and denominators
pub const EPSILON: f64 = 1e-5;

/// Index into the run's vertex list
pub type VertexId = u32;

/// Surface vertex: world position plus unit normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: DVec3,
    pub normal: DVec3,
    /// Owning leaf cell for tessellation centroids
    pub cell: Option<CellId>,
}

impl Vertex {
    pub fn new(position: DVec3, normal: DVec3) -> Self {
        Self {
            position,
            normal,
            cell: None,
        }
    }

    /// Centroid vertex created while fanning a component of `cell`
    pub fn centroid(position: DVec3, normal: DVec3, cell: CellId) -> Self {
        Self {
            position,
            normal,
            cell: Some(cell),
        }
    }
}

/// Normalize `v`, leaving it untouched when its length is below [`EPSILON`]
#[inline]
pub fn normalize_guarded(v: DVec3) -> DVec3 {
    let len = v.length();
    if len > EPSILON {
        v / len
    } else {
        v
    }
}
