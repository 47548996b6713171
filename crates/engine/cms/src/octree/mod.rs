//! Adaptive octree over the sample grid
//!
//! Cells and faces live in flat arenas and refer to each other by index.
//! Every cell owns six half-faces (`face id = cell id * 6 + side`). After
//! the recursive split the builder links:
//!
//! - twins: the two half-faces of same-level neighbours across a boundary
//! - face hierarchy: each face of a subdivided cell has four quarter faces
//! - transitional faces: leaf faces whose twin cell is subdivided further

mod address;
mod cell;
mod face;
mod tables;

pub use address::{Address, Octant};
pub use cell::{Cell, CellId, CellState, Component};
pub use face::{Face, FaceId, FaceState, Side, Strip, StripEnd};
pub(crate) use tables::{FACE_VERTEX, VERTEX_MAP};

use std::collections::HashMap;

use glam::{DVec3, IVec3};

use crate::config::CmsConfig;
use crate::field::ScalarField;
use crate::grid::{Axis, SampleGrid};
use crate::vertex::normalize_guarded;
use tables::{EDGE_VERTICES, FACE_RELATIONSHIP};

/// Frozen cell/face graph of one extraction run
#[derive(Debug, Clone)]
pub struct Octree {
    pub(crate) cells: Vec<Cell>,
    pub(crate) faces: Vec<Face>,
    leaves: Vec<CellId>,
    min_level: u32,
    max_level: u32,
}

impl Octree {
    pub const ROOT: CellId = 0;

    /// Build the octree for a sampled field
    ///
    /// `field` is only evaluated for the corner gradients of the
    /// complex-surface test; everything else reads `grid`.
    pub fn build<F>(grid: &SampleGrid, field: &F, config: &CmsConfig) -> Self
    where
        F: ScalarField + ?Sized,
    {
        OctreeBuilder::new(grid, field, config).build()
    }

    pub fn root(&self) -> &Cell {
        &self.cells[Self::ROOT]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id)
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id)
    }

    /// Face of `cell` on `side`
    pub fn face_of(&self, cell: CellId, side: Side) -> Option<&Face> {
        self.faces.get(cell * 6 + side.index())
    }

    /// Leaf cells in creation order
    pub fn leaf_cells(&self) -> &[CellId] {
        &self.leaves
    }

    pub fn transitional_faces(&self) -> impl Iterator<Item = &Face> + '_ {
        self.faces
            .iter()
            .filter(|face| face.state == FaceState::Transitional)
    }

    /// Same-level neighbour across `side`, if any
    pub fn neighbour(&self, cell: CellId, side: Side) -> Option<CellId> {
        let twin = self.face_of(cell, side)?.twin?;
        self.faces.get(twin).map(|face| face.cell)
    }

    pub fn min_level(&self) -> u32 {
        self.min_level
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Leaf cells at or below `cell`, depth first
    pub fn leaves_below(&self, cell: CellId) -> Vec<CellId> {
        let mut leaves = Vec::new();
        let mut stack = vec![cell];
        while let Some(id) = stack.pop() {
            let Some(cell) = self.cells.get(id) else {
                continue;
            };
            if cell.is_leaf() {
                leaves.push(id);
            } else if let Some(children) = cell.children {
                stack.extend(children.iter().rev());
            }
        }
        leaves
    }
}

/// Top-down builder for [`Octree`]
struct OctreeBuilder<'a, F: ?Sized> {
    grid: &'a SampleGrid,
    field: &'a F,
    min_level: u32,
    max_level: u32,
    complex_surface_threshold: f64,
    gradient_step: DVec3,
    cells: Vec<Cell>,
    faces: Vec<Face>,
    leaves: Vec<CellId>,
    addresses: HashMap<Address, CellId>,
}

impl<'a, F> OctreeBuilder<'a, F>
where
    F: ScalarField + ?Sized,
{
    fn new(grid: &'a SampleGrid, field: &'a F, config: &CmsConfig) -> Self {
        Self {
            grid,
            field,
            min_level: config.min_octree_level,
            max_level: config.max_octree_level,
            complex_surface_threshold: config.complex_surface_threshold,
            gradient_step: grid.spacing() / 2.0,
            cells: Vec::new(),
            faces: Vec::new(),
            leaves: Vec::new(),
            addresses: HashMap::new(),
        }
    }

    fn build(mut self) -> Octree {
        let size = self.grid.dims().x - 1;
        let root = self.push_cell(0, None, None, Address::ROOT, IVec3::ZERO, size);
        self.subdivide(root);

        self.link_twins();
        self.link_face_hierarchy();
        let transitional = self.mark_transitional_faces();

        tracing::debug!(
            "[Octree] Built {} cells, {} leaves, {} transitional faces",
            self.cells.len(),
            self.leaves.len(),
            transitional
        );

        Octree {
            cells: self.cells,
            faces: self.faces,
            leaves: self.leaves,
            min_level: self.min_level,
            max_level: self.max_level,
        }
    }

    fn push_cell(
        &mut self,
        level: u32,
        parent: Option<CellId>,
        octant: Option<Octant>,
        address: Address,
        origin: IVec3,
        size: i32,
    ) -> CellId {
        let id = self.cells.len();
        let bounds = (
            self.grid.position(origin),
            self.grid.position(origin + IVec3::splat(size)),
        );
        self.cells.push(Cell::new(
            id, level, parent, octant, address, origin, size, bounds,
        ));
        self.faces.extend(Side::ALL.map(|side| Face::new(id, side)));
        if parent.is_some() {
            self.addresses.insert(address, id);
        }
        id
    }

    fn subdivide(&mut self, parent: CellId) {
        let (level, origin, size, address) = {
            let cell = &self.cells[parent];
            (cell.level + 1, cell.origin, cell.size / 2, cell.address)
        };

        let mut children = [0; 8];
        for octant in Octant::ALL {
            let id = self.push_cell(
                level,
                Some(parent),
                Some(octant),
                address.child(octant),
                origin + octant.offset() * size,
                size,
            );
            children[octant.index()] = id;

            if level < self.min_level {
                self.subdivide(id);
            } else if level < self.max_level && self.needs_subdivision(id) {
                self.subdivide(id);
            } else if self.straddles_surface(id) {
                self.cells[id].state = CellState::Leaf;
                self.leaves.push(id);
            }
        }
        self.cells[parent].children = Some(children);
    }

    fn needs_subdivision(&self, id: CellId) -> bool {
        self.has_edge_ambiguity(id) || self.has_complex_surface(id)
    }

    /// Mixed corner signs
    fn straddles_surface(&self, id: CellId) -> bool {
        let inside = self.cells[id]
            .corners
            .iter()
            .filter(|&&corner| self.grid.is_inside(corner))
            .count();
        inside != 0 && inside != 8
    }

    /// Any cell edge crossing the surface more than once at full resolution
    fn has_edge_ambiguity(&self, id: CellId) -> bool {
        let corners = &self.cells[id].corners;
        EDGE_VERTICES.iter().any(|&[a, b]| {
            let (start, end) = (corners[a], corners[b]);
            let Some(axis) = Axis::between(start, end) else {
                return false;
            };
            let steps = (end - start)[axis.index()];
            let mut crossings = 0;
            let mut previous = self.grid.is_inside(start);
            for i in 1..=steps {
                let inside = self.grid.is_inside(start + axis.unit() * i);
                if inside != previous {
                    crossings += 1;
                    if crossings > 1 {
                        return true;
                    }
                }
                previous = inside;
            }
            false
        })
    }

    /// Any two corner gradient directions diverging past the threshold
    fn has_complex_surface(&self, id: CellId) -> bool {
        let normals = self.cells[id].corners.map(|corner| {
            let position = self.grid.position(corner);
            let value = self.grid.value(corner);
            normalize_guarded(
                self.field
                    .forward_difference(position, self.gradient_step, value),
            )
        });

        for i in 0..7 {
            for j in (i + 1)..8 {
                if normals[i].dot(normals[j]) < self.complex_surface_threshold {
                    return true;
                }
            }
        }
        false
    }

    fn link_twins(&mut self) {
        for id in 0..self.cells.len() {
            let address = self.cells[id].address;
            for side in Side::ALL {
                let Some(other) = address
                    .neighbour(side)
                    .and_then(|n| self.addresses.get(&n).copied())
                else {
                    continue;
                };
                let here = self.cells[id].face(side);
                let there = self.cells[other].face(side.opposite());
                self.faces[here].twin = Some(there);
                self.faces[there].twin = Some(here);
            }
        }
    }

    fn link_face_hierarchy(&mut self) {
        for id in 0..self.cells.len() {
            let cell = &self.cells[id];
            if let (Some(parent), Some(octant)) = (cell.parent, cell.octant) {
                for &(side, slot) in &FACE_RELATIONSHIP[octant.index()] {
                    let child_face = cell.face(side);
                    let parent_face = self.cells[parent].face(side);
                    self.faces[child_face].parent = Some(parent_face);
                    self.faces[parent_face].children[slot] = Some(child_face);
                }
            }
            if cell.is_leaf() {
                for face in cell.faces {
                    self.faces[face].state = FaceState::Leaf;
                }
            }
        }
    }

    fn mark_transitional_faces(&mut self) -> usize {
        let mut count = 0;
        for &leaf in &self.leaves {
            for face in self.cells[leaf].faces {
                let Some(twin) = self.faces[face].twin else {
                    continue;
                };
                if self.cells[self.faces[twin].cell].has_children() {
                    self.faces[face].state = FaceState::Transitional;
                    count += 1;
                }
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoundingBox;

    fn sphere(x: f64, y: f64, z: f64) -> f64 {
        x * x + y * y + z * z - 0.5
    }

    fn build(field: &dyn Fn(f64, f64, f64) -> f64, min: u32, max: u32) -> Octree {
        let config = CmsConfig::new(min, max);
        let grid =
            SampleGrid::sample(field, BoundingBox::default(), config.samples_per_axis()).unwrap();
        Octree::build(&grid, field, &config)
    }

    #[test]
    fn test_min_level_is_always_reached() {
        let outside = |x: f64, _y: f64, _z: f64| x + 5.0;
        let octree = build(&outside, 2, 4);

        // Root, 8 children, 64 grandchildren; nothing straddles so no leaves
        assert_eq!(octree.cells().len(), 1 + 8 + 64);
        assert!(octree.leaf_cells().is_empty());
        assert!(octree
            .cells()
            .iter()
            .filter(|c| c.level == 2)
            .all(|c| !c.has_children() && !c.is_leaf()));
    }

    #[test]
    fn test_leaves_straddle_and_respect_levels() {
        let octree = build(&sphere, 2, 5);
        assert!(!octree.leaf_cells().is_empty());
        for &id in octree.leaf_cells() {
            let cell = &octree.cells()[id];
            assert!(cell.level >= 2 && cell.level <= 5);
            assert!(!cell.has_children());
            assert_eq!(cell.size, 1 << (5 - cell.level));
        }
    }

    #[test]
    fn test_terminal_cells_partition_the_volume() {
        let octree = build(&sphere, 2, 4);
        let volume: i64 = octree
            .cells()
            .iter()
            .filter(|c| !c.has_children())
            .map(|c| (c.size as i64).pow(3))
            .sum();
        assert_eq!(volume, 16i64.pow(3));
    }

    #[test]
    fn test_children_cover_parent() {
        let octree = build(&sphere, 2, 4);
        for cell in octree.cells() {
            let Some(children) = cell.children else {
                continue;
            };
            for (i, &child) in children.iter().enumerate() {
                let child = &octree.cells()[child];
                assert_eq!(child.parent, Some(cell.id));
                assert_eq!(child.level, cell.level + 1);
                assert_eq!(child.size * 2, cell.size);
                assert_eq!(child.corners[i], cell.corners[i], "corner {i} is shared");
            }
        }
    }

    #[test]
    fn test_twins_are_symmetric_and_touching() {
        let octree = build(&sphere, 2, 5);
        for face in octree.faces() {
            let Some(twin) = face.twin else {
                continue;
            };
            let twin = &octree.faces()[twin];
            assert_eq!(twin.twin, Some(face.id));
            assert_eq!(twin.side, face.side.opposite());

            let a = &octree.cells()[face.cell];
            let b = &octree.cells()[twin.cell];
            assert_eq!(a.level, b.level);

            let axis = face.side.axis().index();
            let step = if face.side.is_positive() { a.size } else { -a.size };
            let mut expected = a.origin;
            expected[axis] += step;
            assert_eq!(b.origin, expected);
        }
    }

    #[test]
    fn test_boundary_faces_have_no_twin() {
        let octree = build(&sphere, 2, 4);
        assert!(octree.root().faces.iter().all(|&f| octree.faces()[f].twin.is_none()));
        for cell in octree.cells() {
            if cell.origin.x == 0 {
                assert_eq!(octree.neighbour(cell.id, Side::Left), None);
            }
        }
    }

    #[test]
    fn test_face_hierarchy() {
        let octree = build(&sphere, 2, 4);
        for cell in octree.cells().iter().filter(|c| c.has_children()) {
            for &face in &cell.faces {
                let face = &octree.faces()[face];
                for child in face.children {
                    let child = &octree.faces()[child.unwrap()];
                    assert_eq!(child.parent, Some(face.id));
                    assert_eq!(child.side, face.side);
                }
            }
        }
    }

    #[test]
    fn test_transitional_faces_border_finer_cells() {
        let octree = build(&sphere, 2, 5);
        for face in octree.transitional_faces() {
            assert!(octree.cells()[face.cell].is_leaf());
            let twin = &octree.faces()[face.twin.unwrap()];
            assert!(octree.cells()[twin.cell].has_children());
        }
        for &leaf in octree.leaf_cells() {
            for &face in &octree.cells()[leaf].faces {
                assert_ne!(octree.faces()[face].state, FaceState::Branch);
            }
        }
    }

    #[test]
    fn test_leaves_below() {
        let octree = build(&sphere, 2, 4);
        let all = octree.leaves_below(Octree::ROOT);
        let mut expected = octree.leaf_cells().to_vec();
        let mut found = all.clone();
        expected.sort();
        found.sort();
        assert_eq!(found, expected);

        let leaf = octree.leaf_cells()[0];
        assert_eq!(octree.leaves_below(leaf), vec![leaf]);
    }

    #[test]
    fn test_blob_between_coarse_corners_is_found() {
        // Every level-2 corner is outside; only the gradients see the blob
        let blob = |x: f64, y: f64, z: f64| {
            let d = DVec3::new(x, y, z) - DVec3::splat(-0.75);
            d.length_squared() - 0.2 * 0.2
        };
        let octree = build(&blob, 2, 4);
        assert!(!octree.leaf_cells().is_empty());
        for &leaf in octree.leaf_cells() {
            assert_eq!(octree.cells()[leaf].level, 4);
        }
    }
}
