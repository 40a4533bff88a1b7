//! Mesh cleanup: point welding and sliver-face removal.

use log::debug;

use crate::mesh::PolyMesh;
use crate::spatial::PointSet;

/// Merge points closer than `tolerance`, then drop what collapsed.
///
/// Consecutive repeated ids inside a face are squeezed out; faces left with
/// fewer than three distinct ids and lines whose endpoints merged are
/// removed. Points no face or line references are dropped. Surviving
/// points keep the order of their first occurrence.
pub fn weld(mesh: &PolyMesh, tolerance: f64) -> PolyMesh {
    let mut set = PointSet::new(tolerance);
    let remap: Vec<u32> = mesh
        .points
        .iter()
        .map(|p| set.insert_unique(*p).0)
        .collect();

    let mut faces = Vec::with_capacity(mesh.faces.len());
    for face in &mesh.faces {
        let mut ids: Vec<u32> = face.iter().map(|&i| remap[i as usize]).collect();
        ids.dedup();
        while ids.len() > 1 && ids.first() == ids.last() {
            ids.pop();
        }
        let mut distinct = ids.clone();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() >= 3 {
            faces.push(ids);
        }
    }

    let lines = mesh
        .lines
        .iter()
        .map(|l| [remap[l[0] as usize], remap[l[1] as usize]])
        .filter(|l| l[0] != l[1])
        .collect();

    let welded = PolyMesh {
        points: set.points().to_vec(),
        faces,
        lines,
    }
    .compacted();

    debug!(
        "weld: {} -> {} points, {} -> {} faces",
        mesh.num_points(),
        welded.num_points(),
        mesh.num_faces(),
        welded.num_faces()
    );
    welded
}

/// Remove every face that contains a point used by exactly one face.
///
/// Such points sit on isolated slivers hanging off the surface; left in
/// place they produce tiny extra boundary loops. Points and lines are kept
/// as they are.
pub fn clean_single_point_faces(mesh: &PolyMesh) -> PolyMesh {
    let mut face_count = vec![0u32; mesh.points.len()];
    for face in &mesh.faces {
        for &i in face {
            face_count[i as usize] += 1;
        }
    }

    let faces: Vec<Vec<u32>> = mesh
        .faces
        .iter()
        .filter(|face| face.iter().all(|&i| face_count[i as usize] != 1))
        .cloned()
        .collect();

    debug!(
        "single-point face cleanup removed {} of {} faces",
        mesh.num_faces() - faces.len(),
        mesh.num_faces()
    );

    PolyMesh {
        points: mesh.points.clone(),
        faces,
        lines: mesh.lines.clone(),
    }
}
