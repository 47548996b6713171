//! Cubical Marching Squares isosurface extraction
//!
//! Extracts a triangle mesh approximating the zero set of a scalar field
//! (negative inside) over a bounding box, using an adaptive octree whose
//! faces are segmented with marching squares.
//!
//! ```no_run
//! use cms::{extract, CmsConfig, Isosurface};
//!
//! let extraction = extract(&Isosurface::Sphere, CmsConfig::new(2, 5))?;
//! println!("{} triangles", extraction.mesh.triangle_count());
//! # Ok::<(), cms::CmsError>(())
//! ```
//!
//! Pipeline modules, in run order:
//!
//! - [`grid`]: sample lattice
//! - [`octree`]: adaptive cells, half-faces, twins
//! - [`segment`]: face strips and crossing vertices ([`edge_cache`])
//! - [`transition`]: stitching across level changes
//! - [`tracer`]: closed components per leaf cell
//! - [`tessellate`]: triangles

pub mod config;
pub mod edge_cache;
pub mod error;
pub mod extract;
pub mod field;
pub mod grid;
pub mod mesh;
pub mod octree;
pub mod segment;
pub mod stats;
pub mod tessellate;
pub mod tracer;
pub mod transition;
pub mod vertex;

pub use config::{BoundingBox, CmsConfig, Range};
pub use error::{CmsError, Result};
pub use extract::{extract, CubicalMarchingSquares, Extraction};
pub use field::{ExpressionField, Isosurface, ScalarField};
pub use grid::{Axis, GridEdge, GridIndex, SampleGrid};
pub use mesh::Mesh;
pub use octree::{Cell, CellId, Face, FaceId, FaceState, Octree, Side};
pub use stats::{LeafBox, StageTimings, Statistics};
pub use vertex::{Vertex, VertexId};

// Re-export glam for consumers
pub use glam;
