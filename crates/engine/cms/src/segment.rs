//! Face segmentation
//!
//! Each face of a leaf cell is classified by a 4-bit code (bit `i` set when
//! face corner `i` is inside). The code selects zero, one or two strips,
//! each joining two face edges. A strip end sits on the exact lattice edge
//! where the sign flips, which may be one of several fine lattice edges
//! along a coarse face edge.

use glam::DVec3;

use crate::edge_cache::EdgeVertexCache;
use crate::error::{CmsError, Result};
use crate::field::{ScalarField, NORMAL_STEP};
use crate::grid::{Axis, GridEdge, GridIndex, SampleGrid};
use crate::octree::{Octree, Side, Strip, StripEnd, FACE_VERTEX, VERTEX_MAP};
use crate::vertex::{Vertex, VertexId, EPSILON};

/// Face-edge pairs joined by strips, per sign code
///
/// Codes 6 and 9 are the saddles; they always get both diagonal strips.
pub const EDGE_MAP: [[Option<[usize; 2]>; 2]; 16] = [
    [None, None],
    [Some([0, 2]), None],
    [Some([2, 1]), None],
    [Some([0, 1]), None],
    [Some([3, 0]), None],
    [Some([3, 2]), None],
    [Some([3, 0]), Some([2, 1])],
    [Some([3, 1]), None],
    [Some([1, 3]), None],
    [Some([1, 3]), Some([0, 2])],
    [Some([2, 3]), None],
    [Some([0, 3]), None],
    [Some([1, 0]), None],
    [Some([1, 2]), None],
    [Some([2, 0]), None],
    [None, None],
];

/// Lattice edge along `a..b` where the inside flag flips
///
/// `a` and `b` must differ along exactly one axis. The first flip found
/// scanning from the lower end wins.
pub fn sign_change_edge(grid: &SampleGrid, a: GridIndex, b: GridIndex) -> Result<GridEdge> {
    let missing = || CmsError::MissingSignChange { from: a, to: b };
    let axis = Axis::between(a, b).ok_or_else(missing)?;
    let (start, end) = if a[axis.index()] <= b[axis.index()] {
        (a, b)
    } else {
        (b, a)
    };

    let step = axis.unit();
    let mut previous = grid.is_inside(start);
    for i in 0..(end - start)[axis.index()] {
        let index = start + step * i;
        let inside = grid.is_inside(index + step);
        if inside != previous {
            return Ok(GridEdge::new(index, axis));
        }
        previous = inside;
    }
    Err(missing())
}

/// Creates strips for every leaf face and owns the crossing vertices
pub struct SegmentGenerator<'a, F: ?Sized> {
    grid: &'a SampleGrid,
    field: &'a F,
    root_finding_budget: u32,
    cache: EdgeVertexCache,
    vertices: Vec<Vertex>,
}

impl<'a, F> SegmentGenerator<'a, F>
where
    F: ScalarField + ?Sized,
{
    pub fn new(grid: &'a SampleGrid, field: &'a F, root_finding_budget: u32) -> Self {
        Self {
            grid,
            field,
            root_finding_budget,
            cache: EdgeVertexCache::new(grid.dims()),
            vertices: Vec::new(),
        }
    }

    /// Fill the strip lists of all leaf faces, returning the strip count
    pub fn generate(&mut self, octree: &mut Octree) -> Result<usize> {
        let mut total = 0;
        for cell in octree.leaves_below(Octree::ROOT) {
            let corners = octree.cells[cell].corners;
            for side in Side::ALL {
                let face_corners = FACE_VERTEX[side.index()].map(|corner| corners[corner]);
                let strips = self.face_strips(&face_corners)?;
                total += strips.len();
                let face = octree.cells[cell].face(side);
                octree.faces[face].strips = strips;
            }
        }

        tracing::debug!(
            "[SegmentGenerator] {} strips, {} crossing vertices",
            total,
            self.vertices.len()
        );
        Ok(total)
    }

    /// Sign code of four face corners
    pub fn sign_code(&self, corners: &[GridIndex; 4]) -> u8 {
        corners
            .iter()
            .enumerate()
            .filter(|(_, corner)| self.grid.is_inside(**corner))
            .fold(0, |code, (bit, _)| code | (1 << bit))
    }

    /// Strips across one face, given its corners in `FACE_VERTEX` order
    pub fn face_strips(&mut self, corners: &[GridIndex; 4]) -> Result<Vec<Strip>> {
        let code = self.sign_code(corners);
        let pairs = EDGE_MAP
            .get(code as usize)
            .ok_or(CmsError::UnmappedSignCode(code))?;

        let mut strips = Vec::with_capacity(2);
        for &[first, second] in pairs.iter().flatten() {
            let start = self.strip_end(corners, first)?;
            let end = self.strip_end(corners, second)?;
            strips.push(Strip::new(start, end));
        }
        Ok(strips)
    }

    fn strip_end(&mut self, corners: &[GridIndex; 4], face_edge: usize) -> Result<StripEnd> {
        let [a, b] = VERTEX_MAP[face_edge];
        let edge = sign_change_edge(self.grid, corners[a], corners[b])?;
        Ok(StripEnd {
            vertex: self.crossing_vertex(edge),
            edge,
        })
    }

    /// Vertex on a sign-changing lattice edge, created on first request
    pub fn crossing_vertex(&mut self, edge: GridEdge) -> VertexId {
        if let Some(vertex) = self.cache.get(&edge) {
            return vertex;
        }

        let (start, end) = (edge.index, edge.end());
        let position = self.refine_crossing(
            self.grid.position(start),
            self.grid.value(start),
            self.grid.position(end),
            self.grid.value(end),
        );
        let normal = self.field.gradient_normal(position, NORMAL_STEP);

        let id = self.vertices.len() as VertexId;
        self.vertices.push(Vertex::new(position, normal));
        self.cache.insert(&edge, id)
    }

    /// Linear root estimate, re-bracketed while the budget lasts
    fn refine_crossing(&self, mut p0: DVec3, mut v0: f64, mut p1: DVec3, mut v1: f64) -> DVec3 {
        let mut budget = self.root_finding_budget;
        loop {
            let denom = v1 - v0;
            let alpha = if denom.abs() > f64::EPSILON {
                -v0 / denom
            } else {
                0.5
            };
            let position = p0.lerp(p1, alpha);
            let value = self.field.evaluate_at(position);
            if value.abs() < EPSILON || budget == 0 {
                return position;
            }
            budget -= 1;

            if (value < 0.0) == (v0 < 0.0) {
                p0 = position;
                v0 = value;
            } else {
                p1 = position;
                v1 = value;
            }
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn cache(&self) -> &EdgeVertexCache {
        &self.cache
    }

    /// Hand over the crossing vertices; tessellation appends to them
    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }
}
