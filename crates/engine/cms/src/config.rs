//! Extraction parameters
//!
//! A [`CmsConfig`] fully determines an extraction run together with the
//! scalar field: two runs with equal configs and fields produce identical
//! meshes.

use serde::{Deserialize, Serialize};

use crate::error::{CmsError, Result};

/// Smallest allowed minimum octree level
pub const MIN_OCTREE_LEVEL: u32 = 2;

/// Largest allowed maximum octree level (2^10 + 1 samples per axis)
pub const MAX_OCTREE_LEVEL: u32 = 10;

/// Fewest samples per axis the extractor accepts
pub const MIN_SAMPLES_PER_AXIS: usize = 9;

/// Closed interval along one axis
///
/// Deserialized ranges go through [`Range::new`], so run files may list the
/// bounds in either order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRange")]
pub struct Range {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Deserialize)]
struct RawRange {
    lower: f64,
    upper: f64,
}

impl From<RawRange> for Range {
    fn from(raw: RawRange) -> Self {
        Range::new(raw.lower, raw.upper)
    }
}

impl Range {
    /// Create a range, swapping the bounds if given in reverse order
    pub fn new(lower: f64, upper: f64) -> Self {
        if lower > upper {
            Self {
                lower: upper,
                upper: lower,
            }
        } else {
            Self { lower, upper }
        }
    }

    pub fn size(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Linear interpolation from `lower` (t = 0) to `upper` (t = 1)
    pub fn lerp(&self, t: f64) -> f64 {
        self.lower + (self.upper - self.lower) * t
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::new(-1.0, 1.0)
    }
}

/// Axis-aligned region that is sampled
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: Range,
    pub y: Range,
    pub z: Range,
}

impl BoundingBox {
    pub fn new(x: Range, y: Range, z: Range) -> Self {
        Self { x, y, z }
    }

    /// Cube spanning `[-half, half]` on every axis
    pub fn centered(half: f64) -> Self {
        let range = Range::new(-half, half);
        Self::new(range, range, range)
    }

    pub fn axes(&self) -> [Range; 3] {
        [self.x, self.y, self.z]
    }
}

/// Configuration for one Cubical Marching Squares run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    /// Every cell above this level is subdivided unconditionally
    pub min_octree_level: u32,
    /// Deepest level; the sample grid has 2^max + 1 points per axis
    pub max_octree_level: u32,
    /// Cosine below which two corner normals force subdivision
    pub complex_surface_threshold: f64,
    /// Number of refinement steps allowed when locating an edge crossing
    pub root_finding_budget: u32,
    /// Move fan centroids once along their normal onto the surface
    pub snap_centroid: bool,
    /// Sampled region
    pub bounding_box: BoundingBox,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            min_octree_level: 2,
            max_octree_level: 5,
            complex_surface_threshold: 0.6,
            root_finding_budget: 2,
            snap_centroid: false,
            bounding_box: BoundingBox::default(),
        }
    }
}

impl CmsConfig {
    /// Create a configuration with the given octree levels
    pub fn new(min_octree_level: u32, max_octree_level: u32) -> Self {
        Self {
            min_octree_level,
            max_octree_level,
            ..Default::default()
        }
    }

    pub fn with_complex_surface_threshold(mut self, threshold: f64) -> Self {
        self.complex_surface_threshold = threshold;
        self
    }

    pub fn with_root_finding_budget(mut self, budget: u32) -> Self {
        self.root_finding_budget = budget;
        self
    }

    pub fn with_snap_centroid(mut self, snap: bool) -> Self {
        self.snap_centroid = snap;
        self
    }

    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = bounding_box;
        self
    }

    /// Number of samples along each axis (2^max + 1)
    pub fn samples_per_axis(&self) -> usize {
        (1usize << self.max_octree_level.min(MAX_OCTREE_LEVEL)) + 1
    }

    /// Check the configuration before any work is done
    pub fn validate(&self) -> Result<()> {
        if self.min_octree_level < MIN_OCTREE_LEVEL {
            return Err(CmsError::InvalidConfig(format!(
                "min_octree_level {} is below {}",
                self.min_octree_level, MIN_OCTREE_LEVEL
            )));
        }
        if self.max_octree_level < self.min_octree_level {
            return Err(CmsError::InvalidConfig(format!(
                "max_octree_level {} is below min_octree_level {}",
                self.max_octree_level, self.min_octree_level
            )));
        }
        if self.max_octree_level > MAX_OCTREE_LEVEL {
            return Err(CmsError::InvalidConfig(format!(
                "max_octree_level {} exceeds {}",
                self.max_octree_level, MAX_OCTREE_LEVEL
            )));
        }

        let samples = self.samples_per_axis();
        if samples < MIN_SAMPLES_PER_AXIS {
            return Err(CmsError::InsufficientResolution {
                samples,
                minimum: MIN_SAMPLES_PER_AXIS,
            });
        }

        if !self.complex_surface_threshold.is_finite() {
            return Err(CmsError::InvalidConfig(
                "complex_surface_threshold must be finite".to_string(),
            ));
        }

        for (name, range) in ["x", "y", "z"].iter().zip(self.bounding_box.axes()) {
            if !range.lower.is_finite() || !range.upper.is_finite() {
                return Err(CmsError::InvalidConfig(format!(
                    "bounding box {} range is not finite",
                    name
                )));
            }
            if range.size() <= 0.0 {
                return Err(CmsError::InvalidConfig(format!(
                    "bounding box {} range [{}, {}] is empty",
                    name, range.lower, range.upper
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_swaps_bounds() {
        let range = Range::new(2.0, -3.0);
        assert_eq!(range.lower, -3.0);
        assert_eq!(range.upper, 2.0);
        assert_eq!(range.size(), 5.0);
        assert!(range.contains(0.0));
        assert!(!range.contains(2.5));
    }

    #[test]
    fn test_deserialized_range_swaps_bounds() {
        let config: CmsConfig = serde_json::from_str(
            r#"{ "bounding_box": {
                "x": { "lower": 1.0, "upper": -1.0 },
                "y": { "lower": -2.0, "upper": 2.0 },
                "z": { "lower": 0.5, "upper": -0.5 }
            } }"#,
        )
        .unwrap();

        assert_eq!(config.bounding_box.x, Range::new(-1.0, 1.0));
        assert_eq!(config.bounding_box.y, Range::new(-2.0, 2.0));
        assert_eq!(config.bounding_box.z, Range::new(-0.5, 0.5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_is_valid() {
        let config = CmsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.samples_per_axis(), 33);
    }

    #[test]
    fn test_rejects_low_min_level() {
        let config = CmsConfig::new(1, 5);
        assert!(matches!(
            config.validate(),
            Err(CmsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_levels() {
        let config = CmsConfig::new(4, 3);
        assert!(matches!(
            config.validate(),
            Err(CmsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_coarse_grid() {
        // 2^2 + 1 = 5 samples per axis
        let config = CmsConfig::new(2, 2);
        assert_eq!(
            config.validate(),
            Err(CmsError::InsufficientResolution {
                samples: 5,
                minimum: MIN_SAMPLES_PER_AXIS
            })
        );
    }

    #[test]
    fn test_rejects_flat_bounding_box() {
        let bbox = BoundingBox::new(Range::new(0.0, 0.0), Range::default(), Range::default());
        let config = CmsConfig::default().with_bounding_box(bbox);
        assert!(matches!(
            config.validate(),
            Err(CmsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: CmsConfig =
            serde_json::from_str(r#"{ "max_octree_level": 4, "snap_centroid": true }"#).unwrap();
        assert_eq!(config.min_octree_level, 2);
        assert_eq!(config.max_octree_level, 4);
        assert!(config.snap_centroid);
        assert_eq!(config.root_finding_budget, 2);
    }
}
