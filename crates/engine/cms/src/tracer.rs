//! Linking each leaf cell's strips into closed components

use crate::octree::{CellId, Component, FaceState, Octree, Strip};
use crate::vertex::VertexId;

/// Fewest vertices a traced chain needs to be kept
pub const MIN_COMPONENT_LEN: usize = 3;

/// Strips a leaf cell meshes: own strips on leaf faces, the twin's fine
/// strips on transitional faces
pub fn cell_strips(octree: &Octree, cell: CellId) -> Vec<Strip> {
    let mut strips = Vec::new();
    let Some(cell) = octree.cell(cell) else {
        return strips;
    };

    for &face in &cell.faces {
        let face = &octree.faces[face];
        match face.state {
            FaceState::Leaf => strips.extend_from_slice(&face.strips),
            FaceState::Transitional => {
                if let Some(twin) = face.twin {
                    strips.extend_from_slice(&octree.faces[twin].strips);
                }
            }
            FaceState::Branch => {}
        }
    }
    strips
}

/// Split a strip set into vertex chains
///
/// Each chain starts from the strip holding the smallest vertex id, then
/// grows forward and backward through shared vertex ids. A chain that
/// returns to its start is closed and stored without the repeated id.
/// Chains shorter than [`MIN_COMPONENT_LEN`] are dropped.
pub fn link_strips(mut strips: Vec<Strip>) -> Vec<Component> {
    let mut components = Vec::new();

    while let Some(seed) = strips
        .iter()
        .enumerate()
        .min_by_key(|(_, strip)| strip.min_vertex())
        .map(|(i, _)| i)
    {
        let [first, second] = strips.remove(seed).vertices();
        let mut chain = vec![first, second];

        let mut current = second;
        while current != first {
            let Some(next) = take_neighbour(&mut strips, current) else {
                break;
            };
            chain.push(next);
            current = next;
        }

        if current != first {
            let mut current = first;
            let mut backward = Vec::new();
            while let Some(next) = take_neighbour(&mut strips, current) {
                backward.push(next);
                current = next;
            }
            backward.reverse();
            backward.extend(chain);
            chain = backward;
        }

        if chain.len() > 2 && chain.first() == chain.last() {
            chain.pop();
        }
        if chain.len() >= MIN_COMPONENT_LEN {
            components.push(chain);
        }
    }

    components
}

/// Remove the first strip touching `vertex`, returning its other end
fn take_neighbour(strips: &mut Vec<Strip>, vertex: VertexId) -> Option<VertexId> {
    let (index, other) = strips.iter().enumerate().find_map(|(i, strip)| {
        let [a, b] = strip.vertices();
        if a == vertex {
            Some((i, b))
        } else if b == vertex {
            Some((i, a))
        } else {
            None
        }
    })?;
    strips.remove(index);
    Some(other)
}

/// Trace components for every leaf cell, returning the component count
pub fn trace_components(octree: &mut Octree) -> usize {
    let mut total = 0;
    for index in 0..octree.leaf_cells().len() {
        let cell = octree.leaf_cells()[index];
        let components = link_strips(cell_strips(octree, cell));
        total += components.len();
        octree.cells[cell].components = components;
    }

    tracing::debug!("[ComponentTracer] {} components", total);
    total
}
