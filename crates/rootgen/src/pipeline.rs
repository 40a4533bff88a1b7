//! The root synthesis pipeline, from crown mesh to root surface.

use log::{debug, info, warn};

use rootgen_mesh::{
    align_seam, boundary_edges, clean_single_point_faces, extract_boundary, smooth, weld,
    BoundaryLoop, PolyMesh,
};

use crate::cap::{create_circle, ensure_resolution};
use crate::closer::{close, ClosingStrategy};
use crate::error::{Result, RootError};
use crate::frame::{LandmarkPoints, RootFrame};
use crate::prune::prune_faces_on_loop;
use crate::settings::RootSettings;

/// Result of [`generate_root`].
#[derive(Debug, Clone)]
pub struct RootOutput {
    /// The root surface.
    pub mesh: PolyMesh,
    /// The frame the root was built in.
    pub frame: RootFrame,
    /// Number of points on the crown boundary ring (and on the cap).
    pub ring_len: usize,
    /// Faces removed from the closed shape by pruning.
    pub pruned_faces: usize,
}

/// Grow a root surface below `crown`.
pub fn generate_root(
    crown: &PolyMesh,
    landmarks: &LandmarkPoints,
    settings: &RootSettings,
) -> Result<RootOutput> {
    settings.validate()?;
    crown.validate()?;
    if crown.faces.is_empty() {
        return Err(RootError::InputParse("crown mesh has no faces".into()));
    }

    let mut crown = weld(crown, settings.weld_tolerance);
    if settings.smooth {
        crown = smooth(&crown, &settings.smoothing)?;
    }
    if settings.clean_single_point_faces {
        let cleaned = clean_single_point_faces(&crown);
        if cleaned.faces.is_empty() || boundary_edges(&cleaned).lines.is_empty() {
            warn!(
                "single-point face cleanup would leave no open crown boundary; keeping all {} faces",
                crown.num_faces()
            );
        } else {
            crown = cleaned;
        }
    }

    let ring = extract_boundary(&crown, &settings.boundary)?;
    if !ring.closed {
        warn!("boundary mode leaves the ring unordered; cap correspondence is not guaranteed");
    }
    let frame = RootFrame::build(landmarks, &settings.frame, &crown)?;

    let cap = create_circle(&frame, ring.len(), settings.cap_style)?;
    ensure_resolution(&cap, ring.len())?;

    let mut cap_mesh = cap.mesh.clone();
    if settings.align_seam {
        let aligned = align_seam(cap.ring(), &ring.points[0]);
        cap_mesh.points[..cap.resolution].copy_from_slice(&aligned);
    }

    let offset_ring = ring.translated(&(-frame.axis.into_inner() * settings.wall_offset));
    let crown_ring = ring_mesh(&ring);
    let offset_mesh = ring_mesh(&offset_ring);
    debug!(
        "closing crown ring, offset ring and cap, {} points each",
        ring.len()
    );

    let shape = close(&[&crown_ring, &offset_mesh, &cap_mesh], &settings.close)?;
    let (mesh, pruned_faces) = match settings.close.strategy {
        ClosingStrategy::Hull => {
            let on_crown = shape.input_points(0).unwrap_or_default();
            let pruned = prune_faces_on_loop(&shape.mesh, on_crown, settings.prune_tolerance);
            let removed = shape.mesh.num_faces() - pruned.num_faces();
            (pruned, removed)
        }
        ClosingStrategy::Loft => (shape.mesh, 0),
    };
    mesh.validate()?;
    if mesh.faces.is_empty() {
        return Err(RootError::DegenerateTriangulation(
            "no faces left after pruning".into(),
        ));
    }

    info!(
        "root: {} points, {} faces from a {}-point ring ({} faces pruned)",
        mesh.num_points(),
        mesh.num_faces(),
        ring.len(),
        pruned_faces
    );
    Ok(RootOutput {
        mesh,
        frame,
        ring_len: ring.len(),
        pruned_faces,
    })
}

/// The ring as a lines-only mesh; unordered rings get no lines.
fn ring_mesh(ring: &BoundaryLoop) -> PolyMesh {
    if ring.closed {
        ring.to_mesh()
    } else {
        PolyMesh::from_lines(ring.points.clone(), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{HeightMode, RadiusMeasure};
    use crate::ErrorKind;
    use rootgen_math::Point3;
    use rootgen_mesh::BoundaryMode;
    use std::f64::consts::TAU;

    fn unit_square() -> PolyMesh {
        PolyMesh::from_faces(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![vec![0, 1, 2], vec![0, 2, 3]],
        )
    }

    fn square_landmarks() -> LandmarkPoints {
        LandmarkPoints {
            bottom: Point3::new(0.0, 0.0, -10.0),
            top: Point3::origin(),
            radius_ref: Point3::new(1.0, 0.0, 0.0),
        }
    }

    /// The two-triangle square has no interior vertex, so smoothing and
    /// sliver cleanup would both eat it.
    fn square_settings() -> RootSettings {
        RootSettings {
            smooth: false,
            clean_single_point_faces: false,
            ..Default::default()
        }
    }

    /// Dome-shaped crown: a centre point and `rings` rings of `n` points,
    /// open at the bottom rim.
    fn make_dome(n: usize, rings: usize) -> PolyMesh {
        let mut points = vec![Point3::new(0.0, 0.0, 4.0)];
        for k in 1..=rings {
            let r = 3.0 * k as f64 / rings as f64;
            let z = 4.0 - 0.2 * (k * k) as f64;
            for i in 0..n {
                let a = TAU * i as f64 / n as f64;
                points.push(Point3::new(r * a.cos(), r * a.sin(), z));
            }
        }
        let n32 = n as u32;
        let mut faces = Vec::new();
        for i in 0..n32 {
            faces.push(vec![0, 1 + i, 1 + (i + 1) % n32]);
        }
        for k in 0..rings as u32 - 1 {
            let base = 1 + k * n32;
            for i in 0..n32 {
                let a = base + i;
                let b = base + (i + 1) % n32;
                faces.push(vec![a, a + n32, b]);
                faces.push(vec![b, a + n32, b + n32]);
            }
        }
        PolyMesh::from_faces(points, faces)
    }

    fn dome_landmarks() -> LandmarkPoints {
        LandmarkPoints {
            bottom: Point3::new(0.0, 0.0, -8.0),
            top: Point3::new(0.0, 0.0, 3.0),
            radius_ref: Point3::new(1.5, 0.0, -8.0),
        }
    }

    #[test]
    fn test_square_end_to_end() {
        let out = generate_root(&unit_square(), &square_landmarks(), &square_settings()).unwrap();
        assert_eq!(out.ring_len, 4);
        assert!(out.mesh.num_faces() > 0);
        assert!(out.mesh.validate().is_ok());
        assert!((out.frame.axis.z - 1.0).abs() < 1e-12);
        assert!((out.frame.cap_center.z + out.frame.height).abs() < 1e-12);
        assert!(out.pruned_faces > 0);
    }

    #[test]
    fn test_square_with_default_settings() {
        // cleanup would strip both triangles, so the crown is kept whole
        let settings = RootSettings::default();
        let out = generate_root(&unit_square(), &square_landmarks(), &settings).unwrap();
        assert_eq!(out.ring_len, 4);
        assert!((out.frame.radius - 101f64.sqrt()).abs() < 1e-12);
        assert!(out.mesh.num_faces() > 0);
        assert!(out.mesh.validate().is_ok());
    }

    #[test]
    fn test_cleanup_still_applies_to_slivers() {
        // a sliver hanging off the dome rim by one point is removed, so the
        // ring stays the 12-point rim
        let mut crown = make_dome(12, 3);
        let rim = crown.points.len() as u32 - 12;
        crown.points.push(Point3::new(4.0, 0.0, 2.2));
        let tip = crown.points.len() as u32 - 1;
        crown.faces.push(vec![rim, rim + 1, tip]);
        let out = generate_root(&crown, &dome_landmarks(), &RootSettings::default()).unwrap();
        assert_eq!(out.ring_len, 12);
    }

    #[test]
    fn test_square_perpendicular_radius() {
        let mut settings = square_settings();
        settings.frame.radius = RadiusMeasure::Perpendicular;
        let out = generate_root(&unit_square(), &square_landmarks(), &settings).unwrap();
        assert!((out.frame.radius - 1.0).abs() < 1e-12);
        assert!(out.mesh.num_faces() > 0);
        assert!(out.mesh.validate().is_ok());
    }

    #[test]
    fn test_no_face_left_on_crown_ring() {
        let crown = make_dome(16, 4);
        let out = generate_root(&crown, &dome_landmarks(), &RootSettings::default()).unwrap();
        assert_eq!(out.ring_len, 16);

        let rim: Vec<Point3> = crown.points[crown.points.len() - 16..].to_vec();
        let welded = rootgen_mesh::PointSet::from_points(&rim, 1e-3);
        for face in &out.mesh.faces {
            assert!(
                !face
                    .iter()
                    .all(|&i| welded.contains(&out.mesh.points[i as usize])),
                "face {face:?} lies on the crown ring"
            );
        }
    }

    #[test]
    fn test_spline_boundary_and_disc_cap() {
        let mut settings = RootSettings::default();
        settings.boundary = BoundaryMode::Spline { samples: 24 };
        settings.cap_style = crate::cap::CapStyle::Disc;
        let out = generate_root(&make_dome(12, 3), &dome_landmarks(), &settings).unwrap();
        assert_eq!(out.ring_len, 24);
        assert!(out.mesh.validate().is_ok());
    }

    #[test]
    fn test_loft_strategy() {
        let mut settings = RootSettings::default();
        settings.close.strategy = ClosingStrategy::Loft;
        settings.frame.height = HeightMode::Fixed { value: 9.0 };
        let out = generate_root(&make_dome(10, 3), &dome_landmarks(), &settings).unwrap();
        assert_eq!(out.pruned_faces, 0);
        // two strips of 2 * 10 faces, ring cap adds none
        assert_eq!(out.mesh.num_faces(), 40);
    }

    #[test]
    fn test_error_kinds() {
        let mut lm = square_landmarks();
        lm.top = lm.bottom;
        let err = generate_root(&unit_square(), &lm, &square_settings()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateLandmarks);

        let shifted = unit_square().translated(&rootgen_math::Vec3::new(5.0, 0.0, 0.0));
        let two = rootgen_mesh::append(&[&unit_square(), &shifted]);
        let err = generate_root(&two, &square_landmarks(), &square_settings()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisconnectedBoundary);

        let mut bad = unit_square();
        bad.faces.push(vec![0, 1, 9]);
        let err = generate_root(&bad, &square_landmarks(), &square_settings()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputParse);

        let err = generate_root(&PolyMesh::new(), &square_landmarks(), &square_settings())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputParse);
    }
}
