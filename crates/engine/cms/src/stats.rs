//! Read-only reports derived after a run

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::CmsConfig;
use crate::mesh::Mesh;
use crate::octree::{Cell, Octree};

/// Leaf cell box for wireframe overlays
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeafBox {
    pub center: [f64; 3],
    pub half_extents: [f64; 3],
}

impl LeafBox {
    pub fn from_cell(cell: &Cell) -> Self {
        Self {
            center: cell.center().to_array(),
            half_extents: cell.half_extents().to_array(),
        }
    }

    /// One box per leaf cell, in leaf creation order
    pub fn collect(octree: &Octree) -> Vec<Self> {
        octree
            .leaf_cells()
            .iter()
            .filter_map(|&id| octree.cell(id))
            .map(Self::from_cell)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OctreeStatistics {
    pub min_level: u32,
    pub max_level: u32,
    pub total_cells: usize,
    pub leaf_cells: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshStatistics {
    pub vertices: usize,
    pub triangles: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterStatistics {
    pub root_finding_budget: u32,
    pub complex_surface_threshold: f64,
    pub snap_centroid: bool,
}

/// Snapshot of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Samples per axis
    pub samples: [usize; 3],
    pub octree: OctreeStatistics,
    pub mesh: MeshStatistics,
    pub parameters: ParameterStatistics,
}

impl Statistics {
    pub fn new(config: &CmsConfig, octree: &Octree, mesh: &Mesh) -> Self {
        let samples = config.samples_per_axis();
        Self {
            samples: [samples; 3],
            octree: OctreeStatistics {
                min_level: octree.min_level(),
                max_level: octree.max_level(),
                total_cells: octree.cells().len(),
                leaf_cells: octree.leaf_cells().len(),
            },
            mesh: MeshStatistics {
                vertices: mesh.vertex_count(),
                triangles: mesh.triangle_count(),
            },
            parameters: ParameterStatistics {
                root_finding_budget: config.root_finding_budget,
                complex_surface_threshold: config.complex_surface_threshold,
                snap_centroid: config.snap_centroid,
            },
        }
    }
}

/// Wall-clock time per pipeline stage, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
    pub sampling: f64,
    pub octree: f64,
    /// Segments, transitions and tracing
    pub segments: f64,
    /// Tessellation and mesh assembly
    pub surface: f64,
    pub total: f64,
}

/// Duration in fractional milliseconds
pub fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
