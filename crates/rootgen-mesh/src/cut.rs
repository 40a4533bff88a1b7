//! Plane sections of a surface.

use log::debug;

use rootgen_math::{Point3, Vec3};

use crate::error::{MeshError, Result};
use crate::mesh::PolyMesh;
use crate::spatial::PointSet;
use crate::topology::face_edges;

#[derive(Debug, Clone, Copy)]
struct Crossing {
    id: u32,
    /// The edge runs from the positive side of the plane to the negative.
    down: bool,
}

/// Intersect `mesh` with the plane through `origin` with normal `normal`.
///
/// Returns a lines-only mesh with one segment per convex face the plane
/// crosses. Segment ends on a shared edge are the same point, and each
/// segment runs from where the face winding leaves the positive side to
/// where it re-enters, so the section of a consistently oriented surface
/// chains head to tail. Vertices on the plane count as positive: a face
/// touching the plane at one vertex adds nothing, and an edge lying in the
/// plane is emitted once, by the face on the negative side.
pub fn plane_cut(
    mesh: &PolyMesh,
    origin: &Point3,
    normal: &Vec3,
    tolerance: f64,
) -> Result<PolyMesh> {
    let normal = normal
        .try_normalize(0.0)
        .ok_or_else(|| MeshError::InvalidSettings("cut plane normal has zero length".into()))?;
    mesh.validate()?;

    let distance: Vec<f64> = mesh
        .points
        .iter()
        .map(|p| (p - origin).dot(&normal))
        .collect();
    let mut set = PointSet::new(tolerance);
    let mut lines = Vec::new();
    let mut crossings = Vec::new();

    for face in &mesh.faces {
        crossings.clear();
        for (a, b) in face_edges(face) {
            let (da, db) = (distance[a as usize], distance[b as usize]);
            let down = da >= 0.0;
            if down == (db >= 0.0) {
                continue;
            }
            // interpolate from the lower id so both faces of the edge agree
            let (lo, hi, dlo, dhi) = if a < b { (a, b, da, db) } else { (b, a, db, da) };
            let p = mesh.points[lo as usize];
            let q = mesh.points[hi as usize];
            let at = p + (q - p) * (dlo / (dlo - dhi));
            crossings.push(Crossing {
                id: set.insert_unique(at).0,
                down,
            });
        }

        let Some(start) = crossings.iter().position(|c| c.down) else {
            continue;
        };
        let mut from = None;
        for k in 0..crossings.len() {
            let c = crossings[(start + k) % crossings.len()];
            if c.down {
                from = Some(c.id);
            } else if let Some(f) = from.take() {
                if f != c.id {
                    lines.push([f, c.id]);
                }
            }
        }
    }

    debug!(
        "plane cut: {} segments over {} points from {} faces",
        lines.len(),
        set.len(),
        mesh.num_faces()
    );
    Ok(PolyMesh::from_lines(set.points().to_vec(), lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::order_boundary;

    /// Unit cube, two triangles per side, outward winding.
    fn make_cube() -> PolyMesh {
        let mut points = Vec::new();
        for z in [0.0, 1.0] {
            for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
                points.push(Point3::new(x, y, z));
            }
        }
        let quads = [
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [1, 2, 6, 5],
            [2, 3, 7, 6],
            [3, 0, 4, 7],
        ];
        let faces = quads
            .iter()
            .flat_map(|q| [vec![q[0], q[1], q[2]], vec![q[0], q[2], q[3]]])
            .collect();
        PolyMesh::from_faces(points, faces)
    }

    #[test]
    fn test_cube_section_is_one_loop() {
        let cut = plane_cut(
            &make_cube(),
            &Point3::new(0.0, 0.0, 0.5),
            &Vec3::new(0.0, 0.0, 2.0),
            1e-9,
        )
        .unwrap();
        // four vertical edges and four side diagonals
        assert_eq!(cut.num_points(), 8);
        assert_eq!(cut.num_lines(), 8);
        assert!(cut.points.iter().all(|p| (p.z - 0.5).abs() < 1e-12));

        let ring = order_boundary(&cut).unwrap();
        assert_eq!(ring.len(), 8);
    }

    #[test]
    fn test_plane_missing_the_mesh() {
        let cut = plane_cut(
            &make_cube(),
            &Point3::new(0.0, 0.0, 3.0),
            &Vec3::z(),
            1e-9,
        )
        .unwrap();
        assert!(cut.is_empty());
        assert_eq!(cut.num_lines(), 0);
    }

    #[test]
    fn test_touching_vertex_adds_nothing() {
        let tri = PolyMesh::from_faces(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, -1.0),
                Point3::new(0.0, 1.0, -1.0),
            ],
            vec![vec![0, 1, 2]],
        );
        let cut = plane_cut(&tri, &Point3::origin(), &Vec3::z(), 1e-9).unwrap();
        assert_eq!(cut.num_lines(), 0);
    }

    #[test]
    fn test_zero_normal_rejected() {
        assert!(matches!(
            plane_cut(&make_cube(), &Point3::origin(), &Vec3::zeros(), 1e-9),
            Err(MeshError::InvalidSettings(_))
        ));
    }
}
