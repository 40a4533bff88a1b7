//! The oriented root frame derived from the three landmarks.

use log::debug;
use serde::{Deserialize, Serialize};

use rootgen_math::{scalar_projection, Dir3, Point3, Transform, Vec3};
use rootgen_mesh::PolyMesh;

use crate::error::{Result, RootError};

/// The three landmark sphere centres placed on a tooth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkPoints {
    /// Gum-ward end of the tooth axis.
    pub bottom: Point3,
    /// Crown-ward end of the tooth axis.
    pub top: Point3,
    /// A point at root radius from `bottom`.
    pub radius_ref: Point3,
}

/// How far below the top landmark the cap is placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HeightMode {
    /// A constant distance along the axis.
    Fixed {
        /// Distance from the top landmark.
        value: f64,
    },
    /// The deepest crown vertex measured along `-axis` from the top
    /// landmark, plus a margin.
    ProjectedMax {
        /// Added to the deepest projection.
        margin: f64,
    },
}

impl Default for HeightMode {
    fn default() -> Self {
        HeightMode::ProjectedMax { margin: 0.5 }
    }
}

/// How the root radius is measured from the radius landmark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiusMeasure {
    /// `|radius_ref - bottom|`.
    #[default]
    Direct,
    /// `|radius_ref - bottom|` with the axial component removed.
    Perpendicular,
}

/// Frame construction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSettings {
    /// Lengths at or below this are treated as zero.
    pub tolerance: f64,
    /// Radius measurement.
    pub radius: RadiusMeasure,
    /// Cap depth strategy.
    pub height: HeightMode,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            radius: RadiusMeasure::default(),
            height: HeightMode::default(),
        }
    }
}

impl FrameSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance >= 0.0 && self.tolerance.is_finite()) {
            return Err(RootError::InvalidSettings(
                "frame tolerance must be a finite non-negative number".into(),
            ));
        }
        match self.height {
            HeightMode::Fixed { value } if !(value > 0.0 && value.is_finite()) => Err(
                RootError::InvalidSettings("fixed height must be positive".into()),
            ),
            HeightMode::ProjectedMax { margin } if !margin.is_finite() => Err(
                RootError::InvalidSettings("height margin must be finite".into()),
            ),
            _ => Ok(()),
        }
    }
}

/// Axis, radius and cap placement for one tooth.
#[derive(Debug, Clone, PartialEq)]
pub struct RootFrame {
    /// Bottom landmark.
    pub bottom_center: Point3,
    /// Top landmark.
    pub top_center: Point3,
    /// Radius landmark.
    pub radius_ref: Point3,
    /// Unit axis from bottom to top.
    pub axis: Dir3,
    /// Root radius.
    pub radius: f64,
    /// Distance from the top landmark down to the cap.
    pub height: f64,
    /// `top_center - height * axis`.
    pub cap_center: Point3,
}

impl RootFrame {
    /// Derive the frame from landmarks. `crown` is only read by
    /// [`HeightMode::ProjectedMax`].
    pub fn build(
        landmarks: &LandmarkPoints,
        settings: &FrameSettings,
        crown: &PolyMesh,
    ) -> Result<Self> {
        settings.validate()?;
        let tol = settings.tolerance;

        let span = landmarks.top - landmarks.bottom;
        if !span.iter().all(|c| c.is_finite()) {
            return Err(RootError::DegenerateLandmarks(
                "landmark coordinates must be finite".into(),
            ));
        }
        let axis = Dir3::try_new(span, tol).ok_or_else(|| {
            RootError::DegenerateLandmarks("top and bottom landmarks coincide".into())
        })?;

        let offset = landmarks.radius_ref - landmarks.bottom;
        let radius = match settings.radius {
            RadiusMeasure::Direct => offset.norm(),
            RadiusMeasure::Perpendicular => {
                let along = axis.into_inner();
                (offset - along * offset.dot(&along)).norm()
            }
        };
        if !(radius > tol) || !radius.is_finite() {
            return Err(RootError::DegenerateLandmarks(format!(
                "radius {radius} is too small"
            )));
        }

        let height = match settings.height {
            HeightMode::Fixed { value } => value,
            HeightMode::ProjectedMax { margin } => {
                projected_depth(crown, &landmarks.top, &axis)? + margin
            }
        };

        let cap_center = landmarks.top - axis.into_inner() * height;
        debug!(
            "frame: axis ({:.4}, {:.4}, {:.4}), radius {:.4}, height {:.4}",
            axis.x, axis.y, axis.z, radius, height
        );

        Ok(Self {
            bottom_center: landmarks.bottom,
            top_center: landmarks.top,
            radius_ref: landmarks.radius_ref,
            axis,
            radius,
            height,
            cap_center,
        })
    }

    /// Rigid placement taking the local XY plane onto the cap plane: rotate
    /// +Z onto the axis, then move the origin to the cap centre.
    pub fn cap_transform(&self) -> Transform {
        Transform::translation_by(&self.cap_center.coords)
            .then(&Transform::rotate_z_onto(&self.axis))
    }
}

/// Deepest crown vertex along `-axis`, measured from `top`.
fn projected_depth(crown: &PolyMesh, top: &Point3, axis: &Dir3) -> Result<f64> {
    let down: Vec3 = -axis.into_inner();
    crown
        .points
        .iter()
        .filter_map(|p| scalar_projection(&(p - top), &down))
        .max_by(|a, b| a.total_cmp(b))
        .ok_or_else(|| {
            RootError::InputParse("crown mesh has no points to measure height from".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_crown() -> PolyMesh {
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

    fn landmarks() -> LandmarkPoints {
        LandmarkPoints {
            bottom: Point3::new(0.0, 0.0, -10.0),
            top: Point3::origin(),
            radius_ref: Point3::new(1.0, 0.0, 0.0),
        }
    }

    #[test]
    fn test_axis_is_unit_bottom_to_top() {
        let lm = LandmarkPoints {
            bottom: Point3::new(1.0, -2.0, 0.5),
            top: Point3::new(4.0, 2.0, 12.0),
            radius_ref: Point3::new(3.0, 0.0, 0.0),
        };
        let frame = RootFrame::build(&lm, &FrameSettings::default(), &square_crown()).unwrap();
        assert_relative_eq!(frame.axis.norm(), 1.0, epsilon = 1e-6);
        assert!(frame.axis.dot(&(lm.top - lm.bottom)) > 0.0);
    }

    #[test]
    fn test_direct_radius() {
        let lm = LandmarkPoints {
            bottom: Point3::new(0.3, 1.0, -2.0),
            top: Point3::new(0.0, 0.0, 5.0),
            radius_ref: Point3::new(-1.7, 4.0, 9.0),
        };
        let frame = RootFrame::build(&lm, &FrameSettings::default(), &square_crown()).unwrap();
        assert_eq!(frame.radius, (lm.radius_ref - lm.bottom).norm());
    }

    #[test]
    fn test_square_frame() {
        let frame =
            RootFrame::build(&landmarks(), &FrameSettings::default(), &square_crown()).unwrap();
        assert_relative_eq!(frame.axis.into_inner(), Vec3::z(), epsilon = 1e-12);
        assert_relative_eq!(frame.radius, 101.0f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(frame.height, 0.5, epsilon = 1e-12);
        assert_relative_eq!(frame.cap_center, Point3::new(0.0, 0.0, -0.5), epsilon = 1e-12);

        let settings = FrameSettings {
            radius: RadiusMeasure::Perpendicular,
            ..Default::default()
        };
        let frame = RootFrame::build(&landmarks(), &settings, &square_crown()).unwrap();
        assert_relative_eq!(frame.radius, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fixed_height() {
        let settings = FrameSettings {
            height: HeightMode::Fixed { value: 6.0 },
            ..Default::default()
        };
        let frame = RootFrame::build(&landmarks(), &settings, &PolyMesh::new()).unwrap();
        assert_relative_eq!(frame.cap_center, Point3::new(0.0, 0.0, -6.0), epsilon = 1e-12);

        let bad = FrameSettings {
            height: HeightMode::Fixed { value: 0.0 },
            ..Default::default()
        };
        assert!(matches!(
            RootFrame::build(&landmarks(), &bad, &PolyMesh::new()),
            Err(RootError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_projected_height_uses_deepest_vertex() {
        let mut crown = square_crown();
        crown.points[2].z = -3.0;
        let frame = RootFrame::build(&landmarks(), &FrameSettings::default(), &crown).unwrap();
        assert_relative_eq!(frame.height, 3.5, epsilon = 1e-12);

        assert!(matches!(
            RootFrame::build(&landmarks(), &FrameSettings::default(), &PolyMesh::new()),
            Err(RootError::InputParse(_))
        ));
    }

    #[test]
    fn test_degenerate_landmarks() {
        let mut lm = landmarks();
        lm.top = lm.bottom;
        let err = RootFrame::build(&lm, &FrameSettings::default(), &square_crown()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::DegenerateLandmarks);

        let mut lm = landmarks();
        lm.radius_ref = lm.bottom;
        let err = RootFrame::build(&lm, &FrameSettings::default(), &square_crown()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::DegenerateLandmarks);
    }

    #[test]
    fn test_cap_transform_places_origin_at_cap_center() {
        let lm = LandmarkPoints {
            bottom: Point3::new(0.0, 0.0, 0.0),
            top: Point3::new(0.0, 5.0, 0.0),
            radius_ref: Point3::new(2.0, 0.0, 0.0),
        };
        let settings = FrameSettings {
            height: HeightMode::Fixed { value: 2.0 },
            ..Default::default()
        };
        let frame = RootFrame::build(&lm, &settings, &PolyMesh::new()).unwrap();
        let t = frame.cap_transform();
        assert_relative_eq!(t.apply_point(&Point3::origin()), frame.cap_center, epsilon = 1e-12);
        assert_relative_eq!(t.apply_vec(&Vec3::z()), frame.axis.into_inner(), epsilon = 1e-12);
    }
}
