//! Circular cap at the root tip.

use std::f64::consts::TAU;

use log::debug;
use serde::{Deserialize, Serialize};

use rootgen_math::Point3;
use rootgen_mesh::PolyMesh;

use crate::error::{Result, RootError};
use crate::frame::RootFrame;

/// Geometry emitted for the cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapStyle {
    /// Ring points and ring lines only.
    #[default]
    Ring,
    /// Ring plus a triangle fan around an explicit apex at the cap centre.
    Disc,
}

/// A generated cap circle.
#[derive(Debug, Clone, PartialEq)]
pub struct Cap {
    /// Ring points occupy ids `0..resolution`; a disc apex follows them.
    pub mesh: PolyMesh,
    /// Cap centre in world space.
    pub center: Point3,
    /// Id of the fan apex, set for [`CapStyle::Disc`].
    pub apex_index: Option<u32>,
    /// Number of ring points.
    pub resolution: usize,
}

impl Cap {
    /// The ring points in order, without the apex.
    pub fn ring(&self) -> &[Point3] {
        &self.mesh.points[..self.resolution]
    }
}

/// Build a circle of `frame.radius` with `resolution` points, centred on
/// the cap centre and lying in the plane normal to the axis.
pub fn create_circle(frame: &RootFrame, resolution: usize, style: CapStyle) -> Result<Cap> {
    if resolution < 3 {
        return Err(RootError::ResolutionMismatch {
            cap: resolution,
            boundary: resolution,
        });
    }

    let r = frame.radius;
    let mut points: Vec<Point3> = (0..resolution)
        .map(|i| {
            let angle = TAU * i as f64 / resolution as f64;
            Point3::new(r * angle.cos(), r * angle.sin(), 0.0)
        })
        .collect();
    let n = resolution as u32;
    let lines = (0..n).map(|i| [i, (i + 1) % n]).collect();

    let (faces, apex_index) = match style {
        CapStyle::Ring => (Vec::new(), None),
        CapStyle::Disc => {
            points.push(Point3::origin());
            let apex = n;
            let fan = (0..n).map(|i| vec![apex, i, (i + 1) % n]).collect();
            (fan, Some(apex))
        }
    };

    let local = PolyMesh {
        points,
        faces,
        lines,
    };
    let mesh = local.transformed(&frame.cap_transform());
    debug!(
        "cap: {} points at ({:.3}, {:.3}, {:.3}), style {:?}",
        resolution, frame.cap_center.x, frame.cap_center.y, frame.cap_center.z, style
    );

    Ok(Cap {
        mesh,
        center: frame.cap_center,
        apex_index,
        resolution,
    })
}

/// Fail unless the cap has exactly one point per boundary ring point.
pub fn ensure_resolution(cap: &Cap, boundary_len: usize) -> Result<()> {
    if cap.resolution == boundary_len && cap.ring().len() == boundary_len {
        Ok(())
    } else {
        Err(RootError::ResolutionMismatch {
            cap: cap.resolution,
            boundary: boundary_len,
        })
    }
}
