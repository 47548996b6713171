//! JSON dumps of a finished extraction

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cms::transition::TransitionReport;
use cms::{Extraction, StageTimings, Statistics};
use serde::Serialize;

pub const MESH_FILE: &str = "mesh.json";
pub const LEAF_BOXES_FILE: &str = "leaf_boxes.json";
pub const STATISTICS_FILE: &str = "statistics.json";

/// Everything about a run except the geometry
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub field: &'a str,
    pub statistics: &'a Statistics,
    pub timings: &'a StageTimings,
    pub transitions: &'a TransitionReport,
}

/// Write the mesh, leaf boxes and run report into `dir`, creating it if needed
pub fn write_extraction(dir: &Path, field: &str, extraction: &Extraction) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let report = RunReport {
        field,
        statistics: &extraction.statistics,
        timings: &extraction.timings,
        transitions: &extraction.transitions,
    };

    Ok(vec![
        write_json(&dir.join(MESH_FILE), &extraction.mesh)?,
        write_json(&dir.join(LEAF_BOXES_FILE), &extraction.leaf_boxes)?,
        write_json(&dir.join(STATISTICS_FILE), &report)?,
    ])
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cms::{extract, CmsConfig, Isosurface, LeafBox, Mesh};

    #[test]
    fn test_write_extraction() {
        let extraction = extract(&Isosurface::Sphere, CmsConfig::new(2, 3)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run");

        let written = write_extraction(&out, "sphere", &extraction).unwrap();
        assert_eq!(written.len(), 3);
        assert!(written.iter().all(|path| path.is_file()));

        let mesh: Mesh = serde_json::from_str(&fs::read_to_string(out.join(MESH_FILE)).unwrap()).unwrap();
        assert_eq!(mesh.indices, extraction.mesh.indices);
        assert_eq!(mesh.vertex_count(), extraction.mesh.vertex_count());

        let boxes: Vec<LeafBox> =
            serde_json::from_str(&fs::read_to_string(out.join(LEAF_BOXES_FILE)).unwrap()).unwrap();
        assert_eq!(boxes.len(), extraction.leaf_boxes.len());
        assert_eq!(boxes[0].half_extents, extraction.leaf_boxes[0].half_extents);

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(STATISTICS_FILE)).unwrap()).unwrap();
        assert_eq!(report["field"], "sphere");
        assert_eq!(
            report["statistics"]["mesh"]["triangles"],
            extraction.mesh.triangle_count()
        );
        assert!(report["timings"]["total"].is_number());
    }

    #[test]
    fn test_unwritable_directory_fails() {
        let extraction = extract(&Isosurface::Sphere, CmsConfig::new(2, 3)).unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = write_extraction(&file.path().join("nested"), "sphere", &extraction);
        assert!(result.is_err());
    }
}
