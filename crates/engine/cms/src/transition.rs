//! Stitching across octree level changes
//!
//! A transitional face is a leaf face whose twin belongs to a subdivided
//! cell. The finer cells behind the twin cut the shared face into smaller
//! faces with their own crossings. Resolution makes both sides agree:
//!
//! 1. collect the strips of every leaf face below the twin
//! 2. insert each fine crossing missing on the coarse side by splitting a
//!    coarse strip
//! 3. replace the twin's strip list with the fine strips, which the coarse
//!    cell traces instead of its own face

use std::collections::HashSet;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::octree::{FaceId, FaceState, Octree, Strip, StripEnd};

/// Counts from one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionReport {
    /// Faces whose twin carried fine strips
    pub resolved: usize,
    /// Faces demoted to plain leaf faces for lack of fine strips
    pub demoted: usize,
    /// Faces without own strips that took over the fine list
    pub adopted: usize,
    /// Crossings inserted by splitting coarse strips
    pub inserted: usize,
}

/// Strips of all leaf faces in the quad-tree below `face`
pub fn fine_strips(octree: &Octree, face: FaceId) -> Vec<Strip> {
    let mut strips = Vec::new();
    let mut stack = vec![face];
    while let Some(id) = stack.pop() {
        let Some(face) = octree.face(id) else {
            continue;
        };
        match face.state {
            FaceState::Branch => stack.extend(face.children.iter().rev().flatten()),
            FaceState::Leaf | FaceState::Transitional => strips.extend_from_slice(&face.strips),
        }
    }
    strips
}

/// Resolve every transitional face of the octree, in face order
pub fn resolve_transitional_faces(octree: &mut Octree) -> TransitionReport {
    let mut report = TransitionReport::default();

    for id in 0..octree.faces.len() {
        if octree.faces[id].state != FaceState::Transitional {
            continue;
        }
        let Some(twin) = octree.faces[id].twin else {
            continue;
        };

        let fine = fine_strips(octree, twin);
        if fine.is_empty() {
            octree.faces[id].state = FaceState::Leaf;
            report.demoted += 1;
            continue;
        }

        let mut coarse = std::mem::take(&mut octree.faces[id].strips);
        if coarse.is_empty() {
            coarse = fine.clone();
            report.adopted += 1;
        }

        let mut seen = HashSet::new();
        for crossing in fine.iter().flat_map(|strip| strip.ends) {
            if !seen.insert(crossing.edge) {
                continue;
            }
            if coarse.iter().any(|strip| strip.touches(&crossing.edge)) {
                continue;
            }
            if insert_crossing(&mut coarse, crossing) {
                report.inserted += 1;
            } else {
                tracing::warn!(
                    "[TransitionResolver] Face {} could not absorb crossing {:?}",
                    id,
                    crossing.edge
                );
            }
        }

        octree.faces[id].strips = coarse;
        octree.faces[twin].strips = fine;
        report.resolved += 1;
    }

    tracing::debug!(
        "[TransitionResolver] {} resolved, {} demoted, {} adopted, {} crossings inserted",
        report.resolved,
        report.demoted,
        report.adopted,
        report.inserted
    );
    report
}

/// Split the coarse strip that should carry `crossing` into two strips
/// meeting at it
///
/// Prefers a strip whose ends both lie on edges of the crossing's axis and
/// bracket it along that axis; otherwise the strip nearest to the crossing
/// in lattice space. Returns `false` only for an empty strip list.
fn insert_crossing(strips: &mut Vec<Strip>, crossing: StripEnd) -> bool {
    let Some(slot) = bracketing_strip(strips, &crossing).or_else(|| nearest_strip(strips, &crossing))
    else {
        return false;
    };

    let [start, end] = strips[slot].ends;
    strips.splice(
        slot..=slot,
        [Strip::new(start, crossing), Strip::new(crossing, end)],
    );
    true
}

fn bracketing_strip(strips: &[Strip], crossing: &StripEnd) -> Option<usize> {
    let axis = crossing.edge.axis;
    let t = crossing.edge.index[axis.index()];
    strips.iter().position(|strip| {
        let [a, b] = strip.ends;
        if a.edge.axis != axis || b.edge.axis != axis {
            return false;
        }
        let (a, b) = (a.edge.index[axis.index()], b.edge.index[axis.index()]);
        t > a.min(b) && t < a.max(b)
    })
}

fn nearest_strip(strips: &[Strip], crossing: &StripEnd) -> Option<usize> {
    let p = crossing.edge.midpoint();
    strips
        .iter()
        .map(|strip| {
            let [a, b] = strip.ends;
            distance_to_segment(p, a.edge.midpoint(), b.edge.midpoint())
        })
        .enumerate()
        .min_by(|(_, x), (_, y)| x.total_cmp(y))
        .map(|(slot, _)| slot)
}

fn distance_to_segment(p: DVec3, a: DVec3, b: DVec3) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoundingBox, CmsConfig};
    use crate::grid::{Axis, GridEdge, SampleGrid};
    use crate::segment::SegmentGenerator;
    use glam::IVec3;

    /// Flat on the left half, wavy on the right: forces mixed levels at x = 0
    fn kinked(x: f64, y: f64, _z: f64) -> f64 {
        let wave = if x > 0.0 { 0.3 * (8.0 * x).sin() } else { 0.0 };
        y - 0.05 - wave
    }

    fn end(vertex: u32, index: IVec3, axis: Axis) -> StripEnd {
        StripEnd {
            vertex,
            edge: GridEdge::new(index, axis),
        }
    }

    fn segmented(max: u32) -> Octree {
        let config = CmsConfig::new(2, max);
        let grid =
            SampleGrid::sample(&kinked, BoundingBox::default(), config.samples_per_axis()).unwrap();
        let mut octree = Octree::build(&grid, &kinked, &config);
        SegmentGenerator::new(&grid, &kinked, 2)
            .generate(&mut octree)
            .unwrap();
        octree
    }

    #[test]
    fn test_bracketing_split() {
        let mut strips = vec![Strip::new(
            end(1, IVec3::new(0, 2, 0), Axis::X),
            end(2, IVec3::new(8, 3, 8), Axis::X),
        )];
        let crossing = end(9, IVec3::new(4, 2, 4), Axis::X);

        assert!(insert_crossing(&mut strips, crossing));
        assert_eq!(strips.len(), 2);
        assert_eq!(strips[0].vertices(), [1, 9]);
        assert_eq!(strips[1].vertices(), [9, 2]);
    }

    #[test]
    fn test_nearest_split_when_nothing_brackets() {
        let mut strips = vec![
            Strip::new(
                end(1, IVec3::new(0, 0, 0), Axis::Y),
                end(2, IVec3::new(0, 0, 8), Axis::X),
            ),
            Strip::new(
                end(3, IVec3::new(8, 0, 0), Axis::Y),
                end(4, IVec3::new(8, 0, 8), Axis::Z),
            ),
        ];
        let crossing = end(7, IVec3::new(7, 0, 4), Axis::Y);

        assert!(insert_crossing(&mut strips, crossing));
        assert_eq!(strips.len(), 3);
        assert_eq!(strips[0].vertices(), [1, 2]);
        assert_eq!(strips[1].vertices(), [3, 7]);
        assert_eq!(strips[2].vertices(), [7, 4]);
    }

    #[test]
    fn test_insert_into_nothing_fails() {
        let mut strips = Vec::new();
        assert!(!insert_crossing(&mut strips, end(0, IVec3::ZERO, Axis::X)));
    }

    #[test]
    fn test_distance_to_segment() {
        let d = distance_to_segment(DVec3::new(1.0, 1.0, 0.0), DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0));
        assert!((d - 1.0).abs() < 1e-12);
        let d = distance_to_segment(DVec3::new(3.0, 0.0, 0.0), DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0));
        assert!((d - 1.0).abs() < 1e-12);
        assert_eq!(distance_to_segment(DVec3::X, DVec3::ZERO, DVec3::ZERO), 1.0);
    }

    #[test]
    fn test_kinked_field_has_transitional_faces() {
        let octree = segmented(4);
        assert!(octree.transitional_faces().count() > 0);
    }

    #[test]
    fn test_coarse_side_covers_fine_crossings() {
        let mut octree = segmented(4);
        let report = resolve_transitional_faces(&mut octree);
        assert!(report.resolved > 0);

        for face in octree.transitional_faces() {
            let twin = &octree.faces()[face.twin.unwrap()];
            assert!(!twin.strips.is_empty());

            let coarse: HashSet<(GridEdge, u32)> = face
                .strips
                .iter()
                .flat_map(|s| s.ends)
                .map(|e| (e.edge, e.vertex))
                .collect();
            for end in twin.strips.iter().flat_map(|s| s.ends) {
                assert!(
                    coarse.contains(&(end.edge, end.vertex)),
                    "face {} misses fine crossing {:?}",
                    face.id,
                    end.edge
                );
            }
        }
    }

    #[test]
    fn test_twin_takes_fine_strips() {
        let mut octree = segmented(4);
        let expected: Vec<(FaceId, Vec<Strip>)> = octree
            .transitional_faces()
            .filter_map(|face| {
                let twin = face.twin?;
                Some((twin, fine_strips(&octree, twin)))
            })
            .collect();

        resolve_transitional_faces(&mut octree);
        for (twin, strips) in expected {
            if !strips.is_empty() {
                assert_eq!(octree.faces()[twin].strips, strips);
            }
        }
    }
}
