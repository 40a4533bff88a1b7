//! Closing the crown ring, its offset copy and the cap into one surface.
//!
//! The default strategy merges every input point into a single cloud,
//! welds it, and takes the boundary of its 3D triangulation. With no alpha
//! radius that boundary is the convex hull, which parry computes on a
//! worker thread under a time limit. The loft strategy instead stitches
//! consecutive rings together with triangle strips.

use std::ops::Range;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use log::debug;
use parry3d_f64::transformation::try_convex_hull;
use serde::{Deserialize, Serialize};

use rootgen_math::{Point3, Tolerance};
use rootgen_mesh::{append, weld, PointSet, PolyMesh};

use crate::error::{Result, RootError};

/// How the input rings are turned into a surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosingStrategy {
    /// Hull of the merged point cloud.
    #[default]
    Hull,
    /// Triangle strips between consecutive equal-size rings.
    Loft,
}

/// Shape closing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloseSettings {
    /// Closing strategy.
    pub strategy: ClosingStrategy,
    /// Points closer than this are merged before triangulating.
    pub weld_tolerance: f64,
    /// Upper bound on triangulation time, in seconds.
    ///
    /// The hull cannot be interrupted. On timeout the worker thread is
    /// detached and runs to completion, and its result is dropped.
    pub timeout_secs: f64,
}

impl Default for CloseSettings {
    fn default() -> Self {
        Self {
            strategy: ClosingStrategy::Hull,
            weld_tolerance: Tolerance::DEFAULT.linear,
            timeout_secs: 30.0,
        }
    }
}

impl CloseSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.weld_tolerance > 0.0 && self.weld_tolerance.is_finite()) {
            return Err(RootError::InvalidSettings(
                "weld_tolerance must be positive".into(),
            ));
        }
        if !(self.timeout_secs > 0.0 && self.timeout_secs.is_finite()) {
            return Err(RootError::InvalidSettings(
                "timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Output of [`close`].
#[derive(Debug, Clone)]
pub struct ClosedShape {
    /// The closing surface.
    pub mesh: PolyMesh,
    /// Every input point, in input order, before welding.
    pub cloud: Vec<Point3>,
    /// The range of `cloud` each input occupies.
    pub ranges: Vec<Range<usize>>,
}

impl ClosedShape {
    /// Points contributed by input `index`.
    pub fn input_points(&self, index: usize) -> Option<&[Point3]> {
        self.ranges.get(index).map(|r| &self.cloud[r.clone()])
    }
}

/// Close `loops` into one surface.
pub fn close(loops: &[&PolyMesh], settings: &CloseSettings) -> Result<ClosedShape> {
    settings.validate()?;
    if loops.is_empty() {
        return Err(RootError::DegenerateTriangulation("nothing to close".into()));
    }

    let mut cloud = Vec::new();
    let mut ranges = Vec::with_capacity(loops.len());
    for mesh in loops {
        let start = cloud.len();
        cloud.extend_from_slice(&mesh.points);
        ranges.push(start..cloud.len());
    }

    let mesh = match settings.strategy {
        ClosingStrategy::Hull => hull_surface(&cloud, settings)?,
        ClosingStrategy::Loft => loft_loops(loops, settings.weld_tolerance)?,
    };
    debug!(
        "close ({:?}): {} input points -> {} points, {} faces",
        settings.strategy,
        cloud.len(),
        mesh.num_points(),
        mesh.num_faces()
    );

    Ok(ClosedShape {
        mesh,
        cloud,
        ranges,
    })
}

fn hull_surface(cloud: &[Point3], settings: &CloseSettings) -> Result<PolyMesh> {
    let mut set = PointSet::new(settings.weld_tolerance);
    for p in cloud {
        set.insert_unique(*p);
    }
    let points = set.points().to_vec();
    check_spans_volume(&points, set.tolerance())?;

    let timeout = Duration::from_secs_f64(settings.timeout_secs);
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("rootgen-hull".into())
        .spawn(move || {
            // the receiver is gone after a timeout; the hull is discarded
            let _ = tx.send(try_convex_hull(&points));
        })
        .map_err(|e| {
            RootError::DegenerateTriangulation(format!("cannot start triangulation: {e}"))
        })?;

    let (vertices, triangles) = match rx.recv_timeout(timeout) {
        Ok(Ok(hull)) => hull,
        Ok(Err(e)) => {
            return Err(RootError::DegenerateTriangulation(format!(
                "hull construction failed: {e:?}"
            )))
        }
        Err(RecvTimeoutError::Timeout) => {
            return Err(RootError::DegenerateTriangulation(format!(
                "triangulation did not finish within {timeout:?}"
            )))
        }
        Err(RecvTimeoutError::Disconnected) => {
            return Err(RootError::DegenerateTriangulation(
                "triangulation worker stopped without a result".into(),
            ))
        }
    };
    if triangles.is_empty() {
        return Err(RootError::DegenerateTriangulation(
            "hull has no faces".into(),
        ));
    }

    // hull vertices come back rescaled; snap them onto the welded inputs
    let points = vertices
        .iter()
        .map(|v| set.find(v).map_or(*v, |id| set.points()[id as usize]))
        .collect();
    let faces = triangles.iter().map(|t| t.to_vec()).collect();
    Ok(PolyMesh::from_faces(points, faces))
}

/// Fail unless the points contain four that are not coplanar.
fn check_spans_volume(points: &[Point3], tolerance: Tolerance) -> Result<()> {
    if points.len() < 4 {
        return Err(RootError::DegenerateTriangulation(format!(
            "{} distinct points, at least 4 are required",
            points.len()
        )));
    }
    let origin = points[0];
    let farthest = |score: &dyn Fn(&Point3) -> f64| {
        points
            .iter()
            .map(|p| (p, score(p)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map_or((origin, 0.0), |(p, s)| (*p, s))
    };

    let (far, dist) = farthest(&|p| (p - origin).norm());
    if tolerance.is_zero(dist) {
        return Err(RootError::DegenerateTriangulation(
            "all points coincide".into(),
        ));
    }
    let dir = (far - origin) / dist;

    let (side, dist) = farthest(&|p| {
        let v = p - origin;
        (v - dir * v.dot(&dir)).norm()
    });
    if tolerance.is_zero(dist) {
        return Err(RootError::DegenerateTriangulation(
            "all points are collinear".into(),
        ));
    }
    let normal = dir.cross(&(side - origin)).normalize();

    let (_, dist) = farthest(&|p| (p - origin).dot(&normal).abs());
    if tolerance.is_zero(dist) {
        return Err(RootError::DegenerateTriangulation(
            "all points are coplanar".into(),
        ));
    }
    Ok(())
}

/// Stitch consecutive rings of equal size into triangle strips.
///
/// Ring `k` occupies point ids `k*n..(k+1)*n`. Each ring pair contributes
/// `2*n` faces: `(i, i+1, i+n)` and `(i+1, i+1+n, i+n)` with wrap-around.
pub fn loft(rings: &[&[Point3]]) -> Result<PolyMesh> {
    let Some(first) = rings.first() else {
        return Err(RootError::DegenerateTriangulation("no rings to loft".into()));
    };
    let n = first.len();
    if rings.len() < 2 || n < 3 {
        return Err(RootError::DegenerateTriangulation(
            "loft needs at least two rings of three points".into(),
        ));
    }
    if let Some(ring) = rings.iter().find(|r| r.len() != n) {
        return Err(RootError::ResolutionMismatch {
            cap: ring.len(),
            boundary: n,
        });
    }

    let points: Vec<Point3> = rings.iter().flat_map(|r| r.iter().copied()).collect();
    let n = n as u32;
    let mut faces = Vec::with_capacity(2 * n as usize * (rings.len() - 1));
    for k in 0..rings.len() as u32 - 1 {
        let base = k * n;
        for i in 0..n {
            let a = base + i;
            let b = base + (i + 1) % n;
            faces.push(vec![a, b, a + n]);
            faces.push(vec![b, b + n, a + n]);
        }
    }
    Ok(PolyMesh::from_faces(points, faces))
}

/// Loft the ring of each loop (the start point of each of its lines), keep
/// any faces the loops carry, and weld the seams.
fn loft_loops(loops: &[&PolyMesh], tolerance: f64) -> Result<PolyMesh> {
    let rings: Vec<Vec<Point3>> = loops
        .iter()
        .map(|mesh| {
            mesh.lines
                .iter()
                .map(|l| mesh.points.get(l[0] as usize).copied())
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| {
                    RootError::DegenerateTriangulation("loop line outside its points".into())
                })
        })
        .collect::<Result<_>>()?;
    let ring_refs: Vec<&[Point3]> = rings.iter().map(Vec::as_slice).collect();
    let strips = loft(&ring_refs)?;

    let mut parts = vec![&strips];
    parts.extend(loops.iter().copied().filter(|m| !m.faces.is_empty()));
    let mut mesh = weld(&append(&parts), tolerance);
    mesh.lines.clear();
    Ok(mesh)
}
