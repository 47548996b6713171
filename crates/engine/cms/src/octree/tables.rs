//! Fixed lookup tables for cell corners, faces and edges
//!
//! Corners are numbered by octant bits: x = 4, y = 2, z = 1.

use super::face::Side;

/// Cell corners of each face, in sign-code bit order
pub const FACE_VERTEX: [[usize; 4]; 6] = [
    [2, 0, 6, 4], // back   (-z)
    [1, 3, 5, 7], // front  (+z)
    [0, 1, 4, 5], // bottom (-y)
    [6, 7, 2, 3], // top    (+y)
    [2, 3, 0, 1], // left   (-x)
    [4, 5, 6, 7], // right  (+x)
];

/// Face corners (indices into a `FACE_VERTEX` row) bounding each face edge
pub const VERTEX_MAP: [[usize; 2]; 4] = [[0, 2], [3, 1], [0, 1], [2, 3]];

/// Cell corners at the ends of each cell edge
pub const EDGE_VERTICES: [[usize; 2]; 12] = [
    [2, 6],
    [0, 4],
    [0, 2],
    [4, 6],
    [1, 5],
    [3, 7],
    [1, 3],
    [5, 7],
    [0, 1],
    [4, 5],
    [2, 3],
    [6, 7],
];

/// For each child octant, the three parent faces it touches and the
/// sub-face slot it occupies on each
pub const FACE_RELATIONSHIP: [[(Side, usize); 3]; 8] = [
    [(Side::Back, 0), (Side::Bottom, 0), (Side::Left, 0)],
    [(Side::Front, 0), (Side::Bottom, 1), (Side::Left, 1)],
    [(Side::Back, 1), (Side::Top, 0), (Side::Left, 2)],
    [(Side::Front, 1), (Side::Top, 1), (Side::Left, 3)],
    [(Side::Back, 2), (Side::Bottom, 2), (Side::Right, 0)],
    [(Side::Front, 2), (Side::Bottom, 3), (Side::Right, 1)],
    [(Side::Back, 3), (Side::Top, 2), (Side::Right, 2)],
    [(Side::Front, 3), (Side::Top, 3), (Side::Right, 3)],
];
