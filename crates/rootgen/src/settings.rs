//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use rootgen_math::Tolerance;
use rootgen_mesh::{BoundaryMode, SmoothSettings};

use crate::cap::CapStyle;
use crate::closer::CloseSettings;
use crate::error::{Result, RootError};
use crate::frame::FrameSettings;

/// Settings for one root generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RootSettings {
    /// Crown points closer than this are merged before processing.
    pub weld_tolerance: f64,
    /// Smooth the crown before extracting its boundary.
    pub smooth: bool,
    /// Remove faces hanging off the crown by a single point.
    pub clean_single_point_faces: bool,
    /// Rotate the cap ring so it starts next to the first crown ring point.
    pub align_seam: bool,
    /// Distance the offset copy of the crown ring is moved toward the root.
    pub wall_offset: f64,
    /// Position tolerance when pruning faces on the crown ring.
    pub prune_tolerance: f64,
    /// Cap geometry.
    pub cap_style: CapStyle,
    /// Smoothing parameters, used when `smooth` is set.
    pub smoothing: SmoothSettings,
    /// Boundary conditioning.
    pub boundary: BoundaryMode,
    /// Frame construction.
    pub frame: FrameSettings,
    /// Shape closing.
    pub close: CloseSettings,
}

impl Default for RootSettings {
    fn default() -> Self {
        Self {
            weld_tolerance: Tolerance::DEFAULT.linear,
            smooth: true,
            clean_single_point_faces: true,
            align_seam: true,
            wall_offset: 0.5,
            prune_tolerance: Tolerance::DEFAULT.linear,
            cap_style: CapStyle::Ring,
            smoothing: SmoothSettings::default(),
            boundary: BoundaryMode::default(),
            frame: FrameSettings::default(),
            close: CloseSettings::default(),
        }
    }
}

impl RootSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("weld_tolerance", self.weld_tolerance),
            ("prune_tolerance", self.prune_tolerance),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(RootError::InvalidSettings(format!("{name} must be positive")));
            }
        }
        if !self.wall_offset.is_finite() {
            return Err(RootError::InvalidSettings(
                "wall_offset must be finite".into(),
            ));
        }
        if self.smooth {
            self.smoothing.validate()?;
        }
        self.boundary.validate()?;
        self.frame.validate()?;
        self.close.validate()
    }

    /// Parse settings from TOML. Missing keys take their defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Self =
            toml::from_str(text).map_err(|e| RootError::InvalidSettings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize settings as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| RootError::InvalidSettings(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closer::ClosingStrategy;
    use crate::frame::HeightMode;

    #[test]
    fn test_defaults_are_valid() {
        assert!(RootSettings::default().validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut settings = RootSettings::default();
        settings.boundary = BoundaryMode::Spline { samples: 50 };
        settings.frame.height = HeightMode::Fixed { value: 6.0 };
        settings.close.strategy = ClosingStrategy::Loft;
        settings.cap_style = CapStyle::Disc;

        let text = settings.to_toml().unwrap();
        let parsed = RootSettings::from_toml(&text).unwrap();
        assert_eq!(parsed.boundary, BoundaryMode::Spline { samples: 50 });
        assert_eq!(parsed.frame.height, HeightMode::Fixed { value: 6.0 });
        assert_eq!(parsed.close.strategy, ClosingStrategy::Loft);
        assert_eq!(parsed.cap_style, CapStyle::Disc);
        assert_eq!(parsed.smoothing.iterations, settings.smoothing.iterations);
    }

    #[test]
    fn test_partial_toml() {
        let parsed = RootSettings::from_toml(
            r#"
smooth = false
wall_offset = 0.8

[boundary]
mode = "unordered"

[frame.height]
mode = "projected_max"
margin = 1.0
"#,
        )
        .unwrap();
        assert!(!parsed.smooth);
        assert_eq!(parsed.wall_offset, 0.8);
        assert_eq!(parsed.boundary, BoundaryMode::Unordered);
        assert_eq!(parsed.frame.height, HeightMode::ProjectedMax { margin: 1.0 });
        assert_eq!(parsed.close.timeout_secs, 30.0);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            RootSettings::from_toml("weld_tolerance = -1.0"),
            Err(RootError::InvalidSettings(_))
        ));
        assert!(matches!(
            RootSettings::from_toml("[boundary]\nmode = \"spline\"\nsamples = 2"),
            Err(RootError::InvalidSettings(_))
        ));
        assert!(RootSettings::from_toml("smooth = 3").is_err());
    }
}
