//! Splitting a surface along a closed loop drawn on it.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use rootgen_math::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::PolyMesh;
use crate::topology::{face_edges, vertex_neighbors, EdgeKey, EdgeMap};

/// Which side of the loop to keep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSelection {
    /// The region with the fewest faces.
    #[default]
    Smallest,
    /// The region with the most faces.
    Largest,
}

/// Keep the faces on one side of a closed loop.
///
/// Each loop point snaps to the nearest face vertex, consecutive snapped
/// vertices are joined by shortest edge paths and the path closes back to
/// the start. The faces then split into edge-connected regions that never
/// cross the path, and the smallest or largest region is returned as a
/// compacted mesh with faces in input order. A loop that does not separate
/// the surface is a [`MeshError::InvalidLoop`].
pub fn select_loop_region(
    mesh: &PolyMesh,
    loop_points: &[Point3],
    selection: RegionSelection,
) -> Result<PolyMesh> {
    if loop_points.len() < 3 {
        return Err(MeshError::InvalidSettings(format!(
            "selection loop needs at least 3 points, got {}",
            loop_points.len()
        )));
    }
    mesh.validate()?;
    if mesh.faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    let mut used = vec![false; mesh.points.len()];
    for &i in mesh.faces.iter().flatten() {
        used[i as usize] = true;
    }
    let mut anchors: Vec<u32> = Vec::with_capacity(loop_points.len());
    for p in loop_points {
        let nearest = nearest_vertex(mesh, &used, p).ok_or(MeshError::EmptyMesh)?;
        if anchors.last() != Some(&nearest) {
            anchors.push(nearest);
        }
    }
    if anchors.len() > 1 && anchors.first() == anchors.last() {
        anchors.pop();
    }
    if anchors.len() < 3 {
        return Err(MeshError::InvalidLoop(format!(
            "loop snaps to only {} distinct vertices",
            anchors.len()
        )));
    }

    let neighbors = vertex_neighbors(mesh);
    let mut fence = HashSet::new();
    for k in 0..anchors.len() {
        let (from, to) = (anchors[k], anchors[(k + 1) % anchors.len()]);
        let path = shortest_path(mesh, &neighbors, from, to).ok_or_else(|| {
            MeshError::InvalidLoop(format!("no edge path from point {from} to point {to}"))
        })?;
        fence.extend(path.windows(2).map(|w| EdgeKey::new(w[0], w[1])));
    }

    let regions = face_regions(mesh, &fence);
    if regions.len() < 2 {
        return Err(MeshError::InvalidLoop(
            "loop does not separate the surface".into(),
        ));
    }
    let chosen = match selection {
        RegionSelection::Smallest => regions.iter().min_by_key(|r| r.len()),
        RegionSelection::Largest => regions.iter().max_by_key(|r| r.len()),
    }
    .ok_or(MeshError::EmptyMesh)?;

    let mut keep = vec![false; mesh.faces.len()];
    for &f in chosen {
        keep[f] = true;
    }
    debug!(
        "loop region: kept {} of {} faces across {} regions ({} fence edges)",
        chosen.len(),
        mesh.num_faces(),
        regions.len(),
        fence.len()
    );

    let faces = mesh
        .faces
        .iter()
        .zip(&keep)
        .filter(|(_, k)| **k)
        .map(|(f, _)| f.clone())
        .collect();
    Ok(PolyMesh::from_faces(mesh.points.clone(), faces).compacted())
}

fn nearest_vertex(mesh: &PolyMesh, used: &[bool], p: &Point3) -> Option<u32> {
    mesh.points
        .iter()
        .enumerate()
        .filter(|(i, _)| used[*i])
        .map(|(i, q)| (i as u32, (q - p).norm_squared()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

#[derive(Debug, Clone, Copy)]
struct Visit {
    cost: f64,
    point: u32,
}

impl PartialEq for Visit {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Visit {}

impl PartialOrd for Visit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Visit {
    // reversed so the max-heap pops the cheapest visit
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.point.cmp(&self.point))
    }
}

/// Dijkstra over mesh edges weighted by length.
fn shortest_path(mesh: &PolyMesh, neighbors: &[Vec<u32>], from: u32, to: u32) -> Option<Vec<u32>> {
    let n = mesh.points.len();
    let mut cost = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<u32>> = vec![None; n];
    let mut heap = BinaryHeap::new();
    cost[from as usize] = 0.0;
    heap.push(Visit {
        cost: 0.0,
        point: from,
    });

    while let Some(Visit { cost: c, point }) = heap.pop() {
        if point == to {
            break;
        }
        if c > cost[point as usize] {
            continue;
        }
        for &next in &neighbors[point as usize] {
            let step = (mesh.points[next as usize] - mesh.points[point as usize]).norm();
            let candidate = c + step;
            if candidate < cost[next as usize] {
                cost[next as usize] = candidate;
                prev[next as usize] = Some(point);
                heap.push(Visit {
                    cost: candidate,
                    point: next,
                });
            }
        }
    }

    if !cost[to as usize].is_finite() {
        return None;
    }
    let mut path = vec![to];
    let mut at = to;
    while let Some(p) = prev[at as usize] {
        path.push(p);
        at = p;
    }
    path.reverse();
    Some(path)
}

/// Face ids grouped by connectivity across edges not in `fence`.
fn face_regions(mesh: &PolyMesh, fence: &HashSet<EdgeKey>) -> Vec<Vec<usize>> {
    let edges = EdgeMap::build(mesh);
    let mut seen = vec![false; mesh.faces.len()];
    let mut regions = Vec::new();

    for start in 0..mesh.faces.len() {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut region = Vec::new();
        let mut stack = vec![start];
        while let Some(f) = stack.pop() {
            region.push(f);
            for (a, b) in face_edges(&mesh.faces[f]) {
                if a == b || fence.contains(&EdgeKey::new(a, b)) {
                    continue;
                }
                for &g in edges.faces_of(a, b) {
                    if !seen[g] {
                        seen[g] = true;
                        stack.push(g);
                    }
                }
            }
        }
        regions.push(region);
    }
    regions
}
