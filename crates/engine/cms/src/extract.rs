//! Extraction pipeline driver
//!
//! One run is strictly sequential: sample, build the octree, generate
//! segments, resolve transitional faces, trace components, tessellate.
//! Every stage consumes the complete output of the previous one.

use std::collections::HashSet;
use std::time::Instant;

use crate::config::CmsConfig;
use crate::error::Result;
use crate::field::ScalarField;
use crate::grid::SampleGrid;
use crate::mesh::Mesh;
use crate::octree::{CellId, Octree};
use crate::segment::SegmentGenerator;
use crate::stats::{millis, LeafBox, StageTimings, Statistics};
use crate::tessellate::Tessellator;
use crate::tracer::trace_components;
use crate::transition::{resolve_transitional_faces, TransitionReport};
use crate::vertex::Vertex;

/// Everything one run produces
#[derive(Debug, Clone)]
pub struct Extraction {
    pub mesh: Mesh,
    /// Run vertices in double precision, including tagged centroids
    pub vertices: Vec<Vertex>,
    pub leaf_boxes: Vec<LeafBox>,
    pub statistics: Statistics,
    pub timings: StageTimings,
    pub transitions: TransitionReport,
    /// Frozen octree, kept for inspection
    pub octree: Octree,
}

/// Cubical Marching Squares over one scalar field
pub struct CubicalMarchingSquares<'f, F: ?Sized> {
    field: &'f F,
    config: CmsConfig,
    cell_filter: Vec<CellId>,
}

impl<'f, F> CubicalMarchingSquares<'f, F>
where
    F: ScalarField + ?Sized,
{
    /// Validate `config` before any work is done
    pub fn new(field: &'f F, config: CmsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            field,
            config,
            cell_filter: Vec::new(),
        })
    }

    /// Only tessellate the given cells; branch ids stand for every leaf
    /// below them
    ///
    /// Unknown ids are skipped with a warning. A filter made only of unknown
    /// ids still restricts the run, which then yields an empty mesh.
    pub fn with_cell_filter(mut self, cells: impl IntoIterator<Item = CellId>) -> Self {
        self.cell_filter = cells.into_iter().collect();
        self
    }

    pub fn config(&self) -> &CmsConfig {
        &self.config
    }

    /// Run the whole pipeline
    pub fn extract(self) -> Result<Extraction> {
        let config = &self.config;
        let started = Instant::now();
        let mut timings = StageTimings::default();

        let stage = Instant::now();
        let grid = SampleGrid::sample(self.field, config.bounding_box, config.samples_per_axis())?;
        timings.sampling = millis(stage.elapsed());

        let stage = Instant::now();
        let mut octree = Octree::build(&grid, self.field, config);
        timings.octree = millis(stage.elapsed());

        let stage = Instant::now();
        let mut generator = SegmentGenerator::new(&grid, self.field, config.root_finding_budget);
        generator.generate(&mut octree)?;
        let vertices = generator.into_vertices();
        let transitions = resolve_transitional_faces(&mut octree);
        trace_components(&mut octree);
        timings.segments = millis(stage.elapsed());

        let stage = Instant::now();
        let filter = self.expand_cell_filter(&octree);
        let mut tessellator = Tessellator::new(self.field, vertices, config.snap_centroid);
        tessellator.tessellate(&octree, filter.as_ref());
        let (vertices, indices) = tessellator.into_parts();
        let mesh = Mesh::from_vertices(&vertices, indices);
        timings.surface = millis(stage.elapsed());

        timings.total = millis(started.elapsed());

        let statistics = Statistics::new(config, &octree, &mesh);
        tracing::info!(
            "[CubicalMarchingSquares] {} cells ({} leaves), {} vertices, {} triangles in {:.2}ms",
            statistics.octree.total_cells,
            statistics.octree.leaf_cells,
            statistics.mesh.vertices,
            statistics.mesh.triangles,
            timings.total
        );

        Ok(Extraction {
            mesh,
            vertices,
            leaf_boxes: LeafBox::collect(&octree),
            statistics,
            timings,
            transitions,
            octree,
        })
    }

    fn expand_cell_filter(&self, octree: &Octree) -> Option<HashSet<CellId>> {
        if self.cell_filter.is_empty() {
            return None;
        }

        let mut cells = HashSet::new();
        for &id in &self.cell_filter {
            match octree.cell(id) {
                Some(cell) if cell.is_leaf() => {
                    cells.insert(id);
                }
                Some(_) => cells.extend(octree.leaves_below(id)),
                None => tracing::warn!("[CubicalMarchingSquares] Filter cell {} does not exist", id),
            }
        }
        Some(cells)
    }
}

/// Extract the zero set of `field` with `config`
pub fn extract<F>(field: &F, config: CmsConfig) -> Result<Extraction>
where
    F: ScalarField + ?Sized,
{
    CubicalMarchingSquares::new(field, config)?.extract()
}
