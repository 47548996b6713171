//! Flat output buffers
//!
//! Positions and normals are stored as `[x, y, z, x, y, z, ...]`, aligned
//! by vertex index; triangles as index triples.

use glam::{DVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::vertex::Vertex;

/// Triangle mesh produced by one extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten run vertices and indices into buffers
    pub fn from_vertices(vertices: &[Vertex], indices: Vec<u32>) -> Self {
        let mut mesh = Self {
            vertices: Vec::with_capacity(vertices.len() * 3),
            normals: Vec::with_capacity(vertices.len() * 3),
            indices,
        };
        for vertex in vertices {
            mesh.push_vertex(vertex.position, vertex.normal);
        }
        mesh
    }

    pub fn push_vertex(&mut self, position: DVec3, normal: DVec3) {
        self.vertices.extend(position.as_vec3().to_array());
        self.normals.extend(normal.as_vec3().to_array());
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend([a, b, c]);
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        self.indices.clear();
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn position(&self, index: usize) -> Option<Vec3> {
        self.vertices
            .get(index * 3..index * 3 + 3)
            .map(Vec3::from_slice)
    }

    pub fn normal(&self, index: usize) -> Option<Vec3> {
        self.normals
            .get(index * 3..index * 3 + 3)
            .map(Vec3::from_slice)
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Min and max corner of all positions, zero for an empty mesh
    pub fn bounding_box(&self) -> (Vec3, Vec3) {
        let mut positions = self.vertices.chunks_exact(3).map(Vec3::from_slice);
        let Some(first) = positions.next() else {
            return (Vec3::ZERO, Vec3::ZERO);
        };
        positions.fold((first, first), |(min, max), p| (min.min(p), max.max(p)))
    }

    /// Buffers aligned, whole triangles, every index in range
    pub fn is_valid(&self) -> bool {
        let count = self.vertex_count() as u32;
        self.vertices.len() % 3 == 0
            && self.normals.len() == self.vertices.len()
            && self.indices.len() % 3 == 0
            && self.indices.iter().all(|&i| i < count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.push_vertex(DVec3::new(0.0, 0.0, 0.0), DVec3::Z);
        mesh.push_vertex(DVec3::new(2.0, 0.0, 0.0), DVec3::Z);
        mesh.push_vertex(DVec3::new(2.0, 1.0, -1.0), DVec3::Z);
        mesh.push_vertex(DVec3::new(0.0, 1.0, 0.0), DVec3::Z);
        mesh.push_triangle(0, 1, 2);
        mesh.push_triangle(0, 2, 3);
        mesh
    }

    #[test]
    fn test_counts() {
        let mesh = quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.position(1), Some(Vec3::new(2.0, 0.0, 0.0)));
        assert_eq!(mesh.normal(3), Some(Vec3::Z));
        assert_eq!(mesh.position(4), None);
        assert_eq!(mesh.triangles().collect::<Vec<_>>(), vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_bounding_box() {
        let (min, max) = quad().bounding_box();
        assert_eq!(min, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(max, Vec3::new(2.0, 1.0, 0.0));
        assert_eq!(Mesh::new().bounding_box(), (Vec3::ZERO, Vec3::ZERO));
    }

    #[test]
    fn test_validity() {
        let mut mesh = quad();
        assert!(mesh.is_valid());
        mesh.indices.push(1);
        assert!(!mesh.is_valid());
        mesh.indices.extend([2, 9]);
        assert!(!mesh.is_valid());
        mesh.clear();
        assert!(mesh.is_valid());
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(quad()).unwrap();
        assert_eq!(json["vertices"].as_array().unwrap().len(), 12);
        assert_eq!(json["indices"].as_array().unwrap().len(), 6);
    }
}
