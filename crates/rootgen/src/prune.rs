//! Removal of the flat cap the closer fabricates over the crown ring.

use log::debug;

use rootgen_math::Point3;
use rootgen_mesh::{PointSet, PolyMesh};

/// Drop every face whose vertices all lie, within `tolerance`, on a point of
/// `loop_points`. Surviving faces, points and lines are kept verbatim.
///
/// A face is matched by vertex position, not by id, so the loop may come
/// from a different mesh than `mesh`.
pub fn prune_faces_on_loop(mesh: &PolyMesh, loop_points: &[Point3], tolerance: f64) -> PolyMesh {
    let set = PointSet::from_points(loop_points, tolerance);
    let on_loop = |i: &u32| {
        mesh.points
            .get(*i as usize)
            .is_some_and(|p| set.contains(p))
    };

    let faces: Vec<Vec<u32>> = mesh
        .faces
        .iter()
        .filter(|face| !face.iter().all(on_loop))
        .cloned()
        .collect();

    debug!(
        "prune: removed {} of {} faces lying on a {}-point loop",
        mesh.num_faces() - faces.len(),
        mesh.num_faces(),
        loop_points.len()
    );

    PolyMesh {
        points: mesh.points.clone(),
        faces,
        lines: mesh.lines.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit cube, two triangles per side, top side at z = 1.
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

    fn top_loop() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ]
    }

    #[test]
    fn test_removes_only_faces_on_loop() {
        let cube = make_cube();
        let pruned = prune_faces_on_loop(&cube, &top_loop(), 1e-9);
        assert_eq!(pruned.num_faces(), cube.num_faces() - 2);

        // every kept face is an unchanged input face, in input order
        let expected: Vec<Vec<u32>> = cube
            .faces
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 2 && *i != 3)
            .map(|(_, f)| f.clone())
            .collect();
        assert_eq!(pruned.faces, expected);
        assert_eq!(pruned.points, cube.points);
    }

    #[test]
    fn test_tolerance_match() {
        let cube = make_cube();
        let jittered: Vec<Point3> = top_loop()
            .iter()
            .map(|p| Point3::new(p.x + 3e-7, p.y - 2e-7, p.z + 1e-7))
            .collect();
        assert_eq!(prune_faces_on_loop(&cube, &jittered, 1e-6).num_faces(), 10);
        assert_eq!(prune_faces_on_loop(&cube, &jittered, 1e-8).num_faces(), 12);
    }

    #[test]
    fn test_empty_loop_keeps_everything() {
        let cube = make_cube();
        assert_eq!(prune_faces_on_loop(&cube, &[], 1e-6), cube);
    }
}
