//! Regular lattice of scalar samples
//!
//! The grid has `2^max_level + 1` samples per axis so that every octree
//! cell corner at every level lands exactly on a sample. Samples are stored
//! x-major: `index = (x * ny + y) * nz + z`.

use glam::{DVec3, IVec3};
use serde::{Deserialize, Serialize};

use crate::config::{BoundingBox, MIN_SAMPLES_PER_AXIS};
use crate::error::{CmsError, Result};
use crate::field::ScalarField;

/// Integer lattice coordinate, used both as array index and as lookup key
pub type GridIndex = IVec3;

/// Lattice axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Unit step along this axis
    pub fn unit(self) -> IVec3 {
        match self {
            Axis::X => IVec3::X,
            Axis::Y => IVec3::Y,
            Axis::Z => IVec3::Z,
        }
    }

    /// Axis along which two lattice points differ, if they differ in exactly one
    pub fn between(a: GridIndex, b: GridIndex) -> Option<Self> {
        let diff = (a - b).abs();
        match (diff.x > 0, diff.y > 0, diff.z > 0) {
            (true, false, false) => Some(Axis::X),
            (false, true, false) => Some(Axis::Y),
            (false, false, true) => Some(Axis::Z),
            _ => None,
        }
    }
}

/// Unit-length lattice edge starting at `index` and pointing along `axis`
///
/// Every surface crossing lives on exactly one such edge, which makes it
/// the deduplication key for crossing vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridEdge {
    pub index: GridIndex,
    pub axis: Axis,
}

impl GridEdge {
    pub fn new(index: GridIndex, axis: Axis) -> Self {
        Self { index, axis }
    }

    /// Lattice point at the far end of the edge
    pub fn end(&self) -> GridIndex {
        self.index + self.axis.unit()
    }

    /// Edge midpoint in lattice coordinates
    pub fn midpoint(&self) -> DVec3 {
        self.index.as_dvec3() + self.axis.unit().as_dvec3() * 0.5
    }
}

/// Dense sample lattice over a bounding box
///
/// Immutable once sampled.
#[derive(Debug, Clone)]
pub struct SampleGrid {
    dims: IVec3,
    bounding_box: BoundingBox,
    spacing: DVec3,
    values: Vec<f64>,
}

impl SampleGrid {
    /// Sample `field` on a `samples`³ lattice spanning `bounding_box`
    ///
    /// Fails before sampling when `samples` is below [`MIN_SAMPLES_PER_AXIS`],
    /// and on the first non-finite field value.
    pub fn sample<F>(field: &F, bounding_box: BoundingBox, samples: usize) -> Result<Self>
    where
        F: ScalarField + ?Sized,
    {
        if samples < MIN_SAMPLES_PER_AXIS {
            return Err(CmsError::InsufficientResolution {
                samples,
                minimum: MIN_SAMPLES_PER_AXIS,
            });
        }

        let n = samples as i32;
        let dims = IVec3::splat(n);
        let spacing = Self::spacing_for(&bounding_box, dims);
        let mut values = Vec::with_capacity(samples * samples * samples);

        let denom = (samples - 1) as f64;
        for i in 0..samples {
            let x = bounding_box.x.lerp(i as f64 / denom);
            for j in 0..samples {
                let y = bounding_box.y.lerp(j as f64 / denom);
                for k in 0..samples {
                    let z = bounding_box.z.lerp(k as f64 / denom);
                    let value = field.evaluate(x, y, z);
                    if !value.is_finite() {
                        return Err(CmsError::NonFiniteSample {
                            position: [x, y, z],
                            value,
                        });
                    }
                    values.push(value);
                }
            }
        }

        tracing::debug!(
            "[SampleGrid] Sampled {}x{}x{} values over {:?}",
            samples,
            samples,
            samples,
            bounding_box
        );

        Ok(Self {
            dims,
            bounding_box,
            spacing,
            values,
        })
    }

    fn spacing_for(bounding_box: &BoundingBox, dims: IVec3) -> DVec3 {
        DVec3::new(
            bounding_box.x.size().abs() / (dims.x - 1) as f64,
            bounding_box.y.size().abs() / (dims.y - 1) as f64,
            bounding_box.z.size().abs() / (dims.z - 1) as f64,
        )
    }

    /// Samples per axis
    pub fn dims(&self) -> IVec3 {
        self.dims
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    /// World distance between neighbouring samples per axis
    pub fn spacing(&self) -> DVec3 {
        self.spacing
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, index: GridIndex) -> bool {
        index.cmpge(IVec3::ZERO).all() && index.cmplt(self.dims).all()
    }

    /// Linear array offset of a lattice point
    #[inline]
    pub fn linear_index(&self, index: GridIndex) -> usize {
        ((index.x * self.dims.y + index.y) * self.dims.z + index.z) as usize
    }

    /// Sample value, `None` outside the lattice
    #[inline]
    pub fn get(&self, index: GridIndex) -> Option<f64> {
        if self.contains(index) {
            Some(self.values[self.linear_index(index)])
        } else {
            None
        }
    }

    /// Sample value; the index must lie on the lattice
    #[inline]
    pub fn value(&self, index: GridIndex) -> f64 {
        self.values[self.linear_index(index)]
    }

    /// Whether the sample counts as inside (negative)
    #[inline]
    pub fn is_inside(&self, index: GridIndex) -> bool {
        self.value(index) < 0.0
    }

    /// World position of a lattice point
    pub fn position(&self, index: GridIndex) -> DVec3 {
        let t = index.as_dvec3() / (self.dims - IVec3::ONE).as_dvec3();
        DVec3::new(
            self.bounding_box.x.lerp(t.x),
            self.bounding_box.y.lerp(t.y),
            self.bounding_box.z.lerp(t.z),
        )
    }
}
