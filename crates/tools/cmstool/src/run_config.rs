//! Run files and command-line overrides

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cms::{CmsConfig, ExpressionField, Isosurface, ScalarField};
use serde::{Deserialize, Serialize};

/// Field selection in a run file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    /// One of the built-in isosurfaces, e.g. `builtin(torus)`
    Builtin(Isosurface),
    /// Expression in `x`, `y`, `z`, e.g. `expression("x*x + y*y + z*z - 1")`
    Expression(String),
}

impl Default for FieldSource {
    fn default() -> Self {
        FieldSource::Builtin(Isosurface::Sphere)
    }
}

impl FieldSource {
    /// Instantiate the field
    pub fn build(&self) -> Result<Box<dyn ScalarField>> {
        match self {
            FieldSource::Builtin(surface) => Ok(Box::new(*surface)),
            FieldSource::Expression(source) => {
                let field = ExpressionField::compile(source)
                    .with_context(|| format!("Failed to compile field expression '{}'", source))?;
                Ok(Box::new(field))
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            FieldSource::Builtin(surface) => surface.to_string(),
            FieldSource::Expression(source) => format!("expression \"{}\"", source),
        }
    }
}

/// Contents of a `.ron` run file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub field: FieldSource,
    pub cms: CmsConfig,
}

/// Values given on the command line, applied on top of a run file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub field: Option<Isosurface>,
    pub expression: Option<String>,
    pub min_level: Option<u32>,
    pub max_level: Option<u32>,
    pub threshold: Option<f64>,
    pub budget: Option<u32>,
    pub snap: bool,
}

impl RunConfig {
    /// Load a run configuration from a RON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read run file {}", path.display()))?;
        Self::from_ron(&content).with_context(|| format!("Failed to parse run file {}", path.display()))
    }

    pub fn from_ron(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    /// Apply command-line overrides; an expression wins over a builtin name
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(surface) = overrides.field {
            self.field = FieldSource::Builtin(surface);
        }
        if let Some(source) = overrides.expression {
            self.field = FieldSource::Expression(source);
        }
        if let Some(level) = overrides.min_level {
            self.cms.min_octree_level = level;
        }
        if let Some(level) = overrides.max_level {
            self.cms.max_octree_level = level;
        }
        if let Some(threshold) = overrides.threshold {
            self.cms.complex_surface_threshold = threshold;
        }
        if let Some(budget) = overrides.budget {
            self.cms.root_finding_budget = budget;
        }
        if overrides.snap {
            self.cms.snap_centroid = true;
        }
    }
}
