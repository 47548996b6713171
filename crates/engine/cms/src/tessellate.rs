//! Triangulation of traced components
//!
//! Three-vertex components become one triangle oriented to agree with
//! their vertex normals. Larger components are fanned around a new
//! centroid vertex, after orienting the ring counter-clockwise about the
//! centroid normal.

use std::collections::HashSet;

use glam::DVec3;

use crate::field::ScalarField;
use crate::octree::{CellId, Octree};
use crate::vertex::{normalize_guarded, Vertex, VertexId};

pub struct Tessellator<'a, F: ?Sized> {
    field: &'a F,
    snap_centroid: bool,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl<'a, F> Tessellator<'a, F>
where
    F: ScalarField + ?Sized,
{
    /// Start from the crossing vertices of the run
    pub fn new(field: &'a F, vertices: Vec<Vertex>, snap_centroid: bool) -> Self {
        Self {
            field,
            snap_centroid,
            vertices,
            indices: Vec::new(),
        }
    }

    /// Tessellate leaf cells depth first, optionally only those in `filter`
    pub fn tessellate(&mut self, octree: &Octree, filter: Option<&HashSet<CellId>>) {
        for id in octree.leaves_below(Octree::ROOT) {
            if filter.is_some_and(|cells| !cells.contains(&id)) {
                continue;
            }
            let Some(cell) = octree.cell(id) else {
                continue;
            };
            for component in &cell.components {
                self.tessellate_component(component, id);
            }
        }

        tracing::debug!(
            "[Tessellator] {} vertices, {} triangles",
            self.vertices.len(),
            self.indices.len() / 3
        );
    }

    pub fn tessellate_component(&mut self, component: &[VertexId], cell: CellId) {
        match component.len() {
            0..=2 => {}
            3 => self.emit_triangle(component),
            _ => self.emit_fan(component, cell),
        }
    }

    fn position(&self, id: VertexId) -> DVec3 {
        self.vertices[id as usize].position
    }

    fn normal(&self, id: VertexId) -> DVec3 {
        self.vertices[id as usize].normal
    }

    fn emit_triangle(&mut self, component: &[VertexId]) {
        let [a, b, c] = [component[0], component[1], component[2]];
        let (pa, pb, pc) = (self.position(a), self.position(b), self.position(c));

        let geometric = normalize_guarded((pb - pa).cross(pc - pa));
        let average = normalize_guarded(self.normal(a) + self.normal(b) + self.normal(c));

        if geometric.dot(average) < 0.0 {
            self.indices.extend([a, c, b]);
        } else {
            self.indices.extend([a, b, c]);
        }
    }

    fn emit_fan(&mut self, component: &[VertexId], cell: CellId) {
        let count = component.len() as f64;
        let (position_sum, normal_sum) = component.iter().fold(
            (DVec3::ZERO, DVec3::ZERO),
            |(p, n), &id| (p + self.position(id), n + self.normal(id)),
        );
        let mut centre = position_sum / count;
        let normal = normalize_guarded(normal_sum);

        // One correction step only
        if self.snap_centroid {
            centre -= normal * self.field.evaluate_at(centre);
        }

        let centroid = self.vertices.len() as VertexId;
        self.vertices.push(Vertex::centroid(centre, normal, cell));

        let mut ring = component.to_vec();
        if let Some(start) = ring
            .iter()
            .enumerate()
            .min_by_key(|(_, id)| **id)
            .map(|(i, _)| i)
        {
            ring.rotate_left(start);
        }
        if !self.is_counter_clockwise(&ring, centre, normal) {
            ring.reverse();
        }

        for i in 0..ring.len() {
            let next = ring[(i + 1) % ring.len()];
            self.indices.extend([centroid, ring[i], next]);
        }
    }

    /// Newell area vector of the ring around `centre`, tested against `normal`
    fn is_counter_clockwise(&self, ring: &[VertexId], centre: DVec3, normal: DVec3) -> bool {
        newell_normal(ring.iter().map(|&id| self.position(id) - centre)).dot(normal) > 0.0
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn into_parts(self) -> (Vec<Vertex>, Vec<u32>) {
        (self.vertices, self.indices)
    }
}

/// Area-weighted normal of a closed polygon
pub fn newell_normal(points: impl IntoIterator<Item = DVec3>) -> DVec3 {
    let points: Vec<DVec3> = points.into_iter().collect();
    let mut sum = DVec3::ZERO;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        sum.x += (a.y - b.y) * (a.z + b.z);
        sum.y += (a.z - b.z) * (a.x + b.x);
        sum.z += (a.x - b.x) * (a.y + b.y);
    }
    sum
}
