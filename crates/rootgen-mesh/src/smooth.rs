//! Non-shrinking surface smoothing.
//!
//! Taubin λ/μ smoothing: every iteration applies a Laplacian step with a
//! positive factor λ followed by one with a negative factor μ, which damps
//! high-frequency scan noise without the shrinkage of plain Laplacian
//! smoothing. Vertices on sharp feature edges only move along the feature,
//! boundary vertices either stay put or move along the boundary, and
//! corners where more than two such edges meet are pinned.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use rootgen_math::{Point3, Vec3};

use crate::error::{MeshError, Result};
use crate::mesh::PolyMesh;
use crate::topology::{face_normal, vertex_neighbors, EdgeMap};

/// Positive (shrinking) Laplacian factor.
const LAMBDA: f64 = 0.5;

/// Smoothing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothSettings {
    /// Number of λ/μ iteration pairs.
    pub iterations: u32,
    /// Pass-band frequency `k_pb`; μ is chosen so that `1/λ + 1/μ = k_pb`.
    pub pass_band: f64,
    /// Restrict vertices on sharp edges to move along those edges.
    pub feature_edge_smoothing: bool,
    /// Dihedral angle (degrees) above which an edge counts as a feature.
    pub feature_angle: f64,
    /// Let boundary vertices move along the boundary instead of pinning them.
    pub boundary_smoothing: bool,
}

impl Default for SmoothSettings {
    fn default() -> Self {
        Self {
            iterations: 200,
            pass_band: 0.1,
            feature_edge_smoothing: true,
            feature_angle: 45.0,
            boundary_smoothing: false,
        }
    }
}

impl SmoothSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.pass_band > 0.0 && self.pass_band < 1.0 / LAMBDA) {
            return Err(MeshError::InvalidSettings(format!(
                "pass_band must be between 0 and {}",
                1.0 / LAMBDA
            )));
        }
        if !(0.0..=180.0).contains(&self.feature_angle) {
            return Err(MeshError::InvalidSettings(
                "feature_angle must be between 0 and 180 degrees".into(),
            ));
        }
        Ok(())
    }

    /// The negative inflation factor derived from the pass band.
    pub fn mu(&self) -> f64 {
        1.0 / (self.pass_band - 1.0 / LAMBDA)
    }
}

/// Smooth `mesh`, returning a copy with moved points and identical topology.
pub fn smooth(mesh: &PolyMesh, settings: &SmoothSettings) -> Result<PolyMesh> {
    settings.validate()?;
    if mesh.faces.is_empty() || settings.iterations == 0 {
        return Ok(mesh.clone());
    }

    let stencils = build_stencils(mesh, settings);
    let mu = settings.mu();
    let mut points = mesh.points.clone();
    for _ in 0..settings.iterations {
        points = laplacian_step(&points, &stencils, LAMBDA);
        points = laplacian_step(&points, &stencils, mu);
    }

    let pinned = stencils.iter().filter(|s| s.is_empty()).count();
    debug!(
        "smoothed {} points ({} pinned) over {} iterations, mu = {:.4}",
        points.len(),
        pinned,
        settings.iterations,
        mu
    );

    Ok(PolyMesh {
        points,
        faces: mesh.faces.clone(),
        lines: mesh.lines.clone(),
    })
}

fn laplacian_step(points: &[Point3], stencils: &[Vec<u32>], factor: f64) -> Vec<Point3> {
    points
        .par_iter()
        .zip(stencils.par_iter())
        .map(|(p, stencil)| {
            if stencil.is_empty() {
                return *p;
            }
            let sum = stencil
                .iter()
                .fold(Vec3::zeros(), |acc, &j| acc + points[j as usize].coords);
            let average = sum / stencil.len() as f64;
            p + (average - p.coords) * factor
        })
        .collect()
}

/// Neighbours each point is averaged over; empty means pinned.
fn build_stencils(mesh: &PolyMesh, settings: &SmoothSettings) -> Vec<Vec<u32>> {
    let edges = EdgeMap::build(mesh);
    let normals: Vec<Vec3> = (0..mesh.faces.len())
        .map(|f| face_normal(mesh, f))
        .collect();
    let cos_feature = settings.feature_angle.to_radians().cos();

    let n = mesh.points.len();
    let mut boundary: Vec<Vec<u32>> = vec![Vec::new(); n];
    let mut feature: Vec<Vec<u32>> = vec![Vec::new(); n];
    for (edge, faces) in edges.iter() {
        let (a, b) = (edge.0, edge.1);
        let sharp = match faces.as_slice() {
            [_] => {
                boundary[a as usize].push(b);
                boundary[b as usize].push(a);
                continue;
            }
            [f, g] => {
                settings.feature_edge_smoothing && normals[*f].dot(&normals[*g]) < cos_feature
            }
            // non-manifold edges are always treated as features
            _ => true,
        };
        if sharp {
            feature[a as usize].push(b);
            feature[b as usize].push(a);
        }
    }

    let all = vertex_neighbors(mesh);
    (0..n)
        .map(|i| {
            if !boundary[i].is_empty() {
                if settings.boundary_smoothing && boundary[i].len() == 2 {
                    boundary[i].clone()
                } else {
                    Vec::new()
                }
            } else if !feature[i].is_empty() {
                if feature[i].len() == 2 {
                    feature[i].clone()
                } else {
                    Vec::new()
                }
            } else {
                all[i].clone()
            }
        })
        .collect()
}
