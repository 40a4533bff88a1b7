//! Open-boundary extraction and boundary-ring ordering.

use log::debug;
use serde::{Deserialize, Serialize};

use rootgen_math::{Point3, Vec3};

use crate::error::{MeshError, Result};
use crate::mesh::PolyMesh;
use crate::spline::resample_closed_spline;
use crate::topology::{face_edges, EdgeMap};

/// How the extracted boundary is conditioned before use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BoundaryMode {
    /// Boundary points in extraction order, without walking the ring.
    Unordered,
    /// Points in traversal order around a single closed ring.
    #[default]
    Ordered,
    /// The ordered ring resampled through a closed spline.
    Spline {
        /// Number of points sampled along the spline.
        samples: usize,
    },
}

impl BoundaryMode {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        match self {
            BoundaryMode::Spline { samples } if *samples < 3 => Err(MeshError::InvalidSettings(
                "spline boundary needs at least 3 samples".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// Points of one boundary polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLoop {
    /// Boundary points; in traversal order when `closed` is set.
    pub points: Vec<Point3>,
    /// True when the points form an ordered closed ring.
    pub closed: bool,
}

impl BoundaryLoop {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the loop has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A copy moved by `offset`.
    pub fn translated(&self, offset: &Vec3) -> Self {
        Self {
            points: self.points.iter().map(|p| p + offset).collect(),
            closed: self.closed,
        }
    }

    /// Lines-only mesh joining consecutive points, wrapping around when closed.
    pub fn to_mesh(&self) -> PolyMesh {
        let n = self.points.len() as u32;
        let count = if self.closed { n } else { n.saturating_sub(1) };
        let lines = (0..count).map(|i| [i, (i + 1) % n]).collect();
        PolyMesh::from_lines(self.points.clone(), lines)
    }
}

/// Edges used by exactly one face, as a lines-only mesh.
///
/// Each line follows the winding of the face it belongs to. Only points on
/// the boundary are kept, renumbered in order of first appearance.
pub fn boundary_edges(mesh: &PolyMesh) -> PolyMesh {
    let edges = EdgeMap::build(mesh);
    let mut remap: Vec<Option<u32>> = vec![None; mesh.points.len()];
    let mut points = Vec::new();
    let mut lines = Vec::new();

    let mut id = |i: u32, points: &mut Vec<Point3>| -> u32 {
        *remap[i as usize].get_or_insert_with(|| {
            points.push(mesh.points[i as usize]);
            (points.len() - 1) as u32
        })
    };

    for face in &mesh.faces {
        for (a, b) in face_edges(face) {
            if a != b && edges.is_boundary(a, b) {
                let la = id(a, &mut points);
                let lb = id(b, &mut points);
                lines.push([la, lb]);
            }
        }
    }

    PolyMesh::from_lines(points, lines)
}

/// Walk a lines-only boundary mesh into a single ordered ring.
///
/// Every point must start exactly one line. Starting from point 0 the walk
/// follows `next[current]` and must come back to the start after visiting
/// every point once. A point with no outgoing line, a point starting two
/// lines, or an early return to the start (several separate loops) is a
/// [`MeshError::DisconnectedBoundary`].
pub fn order_boundary(lines: &PolyMesh) -> Result<BoundaryLoop> {
    let n = lines.points.len();
    if n == 0 || lines.lines.is_empty() {
        return Err(MeshError::DisconnectedBoundary(
            "mesh has no open boundary".into(),
        ));
    }

    let mut next: Vec<Option<u32>> = vec![None; n];
    for (item, &[a, b]) in lines.lines.iter().enumerate() {
        if let Some(index) = [a, b].into_iter().find(|&i| i as usize >= n) {
            return Err(MeshError::IndexOutOfRange {
                element: "line",
                item,
                index,
                count: n,
            });
        }
        if a == b {
            continue;
        }
        let slot = &mut next[a as usize];
        if slot.replace(b).is_some() {
            return Err(MeshError::DisconnectedBoundary(format!(
                "point {a} starts more than one boundary edge"
            )));
        }
    }

    let mut points = Vec::with_capacity(n);
    let mut current = 0u32;
    for step in 0..n {
        points.push(lines.points[current as usize]);
        current = next
            .get(current as usize)
            .copied()
            .flatten()
            .ok_or_else(|| {
                MeshError::DisconnectedBoundary(format!("boundary ends at point {current}"))
            })?;
        if current == 0 && step + 1 < n {
            return Err(MeshError::DisconnectedBoundary(format!(
                "loop closes after {} of {} boundary points",
                step + 1,
                n
            )));
        }
    }
    if current != 0 {
        return Err(MeshError::DisconnectedBoundary(
            "walk did not return to its start".into(),
        ));
    }

    Ok(BoundaryLoop {
        points,
        closed: true,
    })
}

/// Extract the open boundary of `mesh` and condition it according to `mode`.
pub fn extract_boundary(mesh: &PolyMesh, mode: &BoundaryMode) -> Result<BoundaryLoop> {
    mode.validate()?;
    let edges = boundary_edges(mesh);
    debug!(
        "boundary: {} edges over {} points",
        edges.num_lines(),
        edges.num_points()
    );

    match mode {
        BoundaryMode::Unordered => {
            if edges.is_empty() {
                return Err(MeshError::DisconnectedBoundary(
                    "mesh has no open boundary".into(),
                ));
            }
            Ok(BoundaryLoop {
                points: edges.points,
                closed: false,
            })
        }
        BoundaryMode::Ordered => order_boundary(&edges),
        BoundaryMode::Spline { samples } => {
            let ring = order_boundary(&edges)?;
            Ok(BoundaryLoop {
                points: resample_closed_spline(&ring.points, *samples),
                closed: true,
            })
        }
    }
}
