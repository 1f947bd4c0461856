//! Analyzer configuration and validation.
//!
//! Every section deserializes with defaults, so a JSON file only needs the
//! fields it overrides:
//!
//! ```json
//! { "peaks": { "sensitivity": 2.0 }, "geometry": { "center": [1024.0, 1030.5] } }
//! ```

use std::path::{Path, PathBuf};

use crate::image_source::DiffractionImage;
use crate::ring::{
    OverlayConfig, PeakDetectionParams, RadialProfileConfig, RingMatchConfig, MAX_SMOOTHING_SIGMA,
};

// ── Error type ─────────────────────────────────────────────────────────────

/// Invalid or unreadable analyzer configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The radial profile needs at least two bin edges.
    TooFewBins {
        /// Configured number of bin edges.
        num_bins: usize,
    },
    /// A scalar parameter is non-finite or outside its allowed range.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Overlay point count must be positive.
    ZeroPointCount,
    /// The reference resolution list is empty.
    NoReferences,
    /// A reference has a non-positive resolution or tolerance.
    InvalidReference {
        /// Position in the reference list.
        index: usize,
        /// Configured resolution (Å).
        resolution_angstrom: f64,
        /// Configured tolerance (px).
        tolerance_px: f64,
    },
    /// Beam center is non-finite or outside `[0, width) x [0, height)`.
    CenterOutOfBounds {
        /// Resolved center.
        center: [f64; 2],
        /// Image width.
        width: usize,
        /// Image height.
        height: usize,
    },
    /// The image is too small to span a single radial bin.
    DegenerateGeometry {
        /// Image width.
        width: usize,
        /// Image height.
        height: usize,
    },
    /// The configuration file could not be read.
    Read {
        /// Config path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The configuration file is not valid JSON for [`AnalyzerConfig`].
    Parse {
        /// Config path.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewBins { num_bins } => {
                write!(f, "num_bins must be at least 2, got {}", num_bins)
            }
            Self::InvalidParameter { name, value } => {
                write!(f, "invalid value for {}: {}", name, value)
            }
            Self::ZeroPointCount => write!(f, "overlay point_count must be positive"),
            Self::NoReferences => write!(f, "reference resolution list is empty"),
            Self::InvalidReference {
                index,
                resolution_angstrom,
                tolerance_px,
            } => write!(
                f,
                "reference {} is invalid: resolution {} Å, tolerance {} px",
                index, resolution_angstrom, tolerance_px
            ),
            Self::CenterOutOfBounds {
                center,
                width,
                height,
            } => write!(
                f,
                "beam center ({}, {}) lies outside the {}x{} image",
                center[0], center[1], width, height
            ),
            Self::DegenerateGeometry { width, height } => {
                write!(f, "{}x{} image is too small for radial profiling", width, height)
            }
            Self::Read { path, source } => {
                write!(f, "failed to read config {}: {}", path.display(), source)
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ── Geometry ───────────────────────────────────────────────────────────────

/// Detector geometry shared by all frames analyzed with one config.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BeamGeometry {
    /// Beam center `[x, y]` in pixels. `None` uses the image center.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<[f64; 2]>,
    /// Detector pixel size in millimetres.
    ///
    /// Carried for completeness; the pixel calibration in
    /// [`RingMatchConfig::calibration`] does not read it.
    pub pixel_size_mm: f64,
}

impl Default for BeamGeometry {
    fn default() -> Self {
        Self {
            center: None,
            pixel_size_mm: 0.075,
        }
    }
}

impl BeamGeometry {
    /// Beam center for `image`: the frame's own override, then this config's
    /// center, then the geometric center.
    pub fn resolve_center(&self, image: &DiffractionImage) -> Result<[f64; 2], ConfigError> {
        let center = image
            .center_override()
            .or(self.center)
            .unwrap_or_else(|| image.geometric_center());
        let [cx, cy] = center;
        let inside = cx.is_finite()
            && cy.is_finite()
            && cx >= 0.0
            && cy >= 0.0
            && cx < image.width() as f64
            && cy < image.height() as f64;
        if !inside {
            return Err(ConfigError::CenterOutOfBounds {
                center,
                width: image.width(),
                height: image.height(),
            });
        }
        Ok(center)
    }
}

// ── Top-level config ───────────────────────────────────────────────────────

/// Full configuration of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub geometry: BeamGeometry,
    pub profile: RadialProfileConfig,
    pub peaks: PeakDetectionParams,
    pub matching: RingMatchConfig,
    pub overlay: OverlayConfig,
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

impl AnalyzerConfig {
    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check image-independent parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.profile.num_bins < 2 {
            return Err(ConfigError::TooFewBins {
                num_bins: self.profile.num_bins,
            });
        }

        check_non_negative("peaks.sensitivity", self.peaks.sensitivity)?;
        check_non_negative("peaks.smoothing_sigma", self.peaks.smoothing_sigma)?;
        if self.peaks.smoothing_sigma > MAX_SMOOTHING_SIGMA {
            return Err(ConfigError::InvalidParameter {
                name: "peaks.smoothing_sigma",
                value: self.peaks.smoothing_sigma,
            });
        }
        check_non_negative("peaks.min_height_factor", self.peaks.min_height_factor)?;

        if self.overlay.point_count == 0 {
            return Err(ConfigError::ZeroPointCount);
        }

        check_positive("geometry.pixel_size_mm", self.geometry.pixel_size_mm)?;
        if let Some([cx, cy]) = self.geometry.center {
            check_non_negative("geometry.center.x", cx)?;
            check_non_negative("geometry.center.y", cy)?;
        }

        let cal = &self.matching.calibration;
        check_positive("matching.calibration.numerator_angstrom", cal.numerator_angstrom)?;
        check_positive("matching.calibration.scale_px", cal.scale_px)?;

        if self.matching.references.is_empty() {
            return Err(ConfigError::NoReferences);
        }
        for (index, r) in self.matching.references.iter().enumerate() {
            let ok = r.resolution_angstrom.is_finite()
                && r.resolution_angstrom > 0.0
                && r.tolerance_px.is_finite()
                && r.tolerance_px > 0.0;
            if !ok {
                return Err(ConfigError::InvalidReference {
                    index,
                    resolution_angstrom: r.resolution_angstrom,
                    tolerance_px: r.tolerance_px,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::IceReference;

    #[test]
    fn default_config_is_valid() {
        let cfg = AnalyzerConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.profile.num_bins, 500);
        assert_eq!(cfg.overlay.point_count, 360);
        assert_eq!(cfg.geometry.pixel_size_mm, 0.075);
        assert_eq!(cfg.matching.references.len(), 4);
    }

    #[test]
    fn rejects_too_few_bins() {
        let mut cfg = AnalyzerConfig::default();
        cfg.profile.num_bins = 1;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::TooFewBins { num_bins: 1 })
        ));
    }

    #[test]
    fn rejects_bad_scalars() {
        let mut cfg = AnalyzerConfig::default();
        cfg.peaks.sensitivity = f64::NAN;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidParameter {
                name: "peaks.sensitivity",
                ..
            })
        ));

        let mut cfg = AnalyzerConfig::default();
        cfg.geometry.pixel_size_mm = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = AnalyzerConfig::default();
        cfg.overlay.point_count = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroPointCount)));
    }

    #[test]
    fn smoothing_sigma_bounds() {
        let mut cfg = AnalyzerConfig::default();
        cfg.peaks.smoothing_sigma = 1e10;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidParameter {
                name: "peaks.smoothing_sigma",
                ..
            })
        ));

        cfg.peaks.smoothing_sigma = MAX_SMOOTHING_SIGMA;
        cfg.validate().unwrap();
        cfg.peaks.smoothing_sigma = 1e-200;
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_bad_references() {
        let mut cfg = AnalyzerConfig::default();
        cfg.matching.references.clear();
        assert!(matches!(cfg.validate(), Err(ConfigError::NoReferences)));

        let mut cfg = AnalyzerConfig::default();
        cfg.matching.references.push(IceReference::new(0.0, 30.0));
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidReference { index: 4, .. })
        ));
    }

    #[test]
    fn center_resolution_order_and_bounds() {
        let img = DiffractionImage::from_raw(10, 8, vec![0.0; 80]).unwrap();
        let mut geom = BeamGeometry::default();
        assert_eq!(geom.resolve_center(&img).unwrap(), [5.0, 4.0]);

        geom.center = Some([2.0, 3.0]);
        assert_eq!(geom.resolve_center(&img).unwrap(), [2.0, 3.0]);

        let img = img.with_center([9.5, 7.5]);
        assert_eq!(geom.resolve_center(&img).unwrap(), [9.5, 7.5]);

        let img = img.with_center([10.0, 1.0]);
        assert!(matches!(
            geom.resolve_center(&img),
            Err(ConfigError::CenterOutOfBounds { width: 10, .. })
        ));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let json = r#"{ "peaks": { "sensitivity": 2.5 }, "matching": { "priority": "nearest" } }"#;
        let cfg: AnalyzerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.peaks.sensitivity, 2.5);
        assert_eq!(cfg.peaks.smoothing_sigma, 3.0);
        assert_eq!(cfg.matching.priority, crate::ring::MatchPriority::Nearest);
        assert_eq!(cfg.matching.references.len(), 4);
        assert_eq!(cfg.profile.num_bins, 500);
    }

    #[test]
    fn json_round_trip_preserves_config() {
        let mut cfg = AnalyzerConfig::default();
        cfg.geometry.center = Some([100.0, 120.0]);
        cfg.matching = cfg.matching.with_uniform_tolerance(8.0);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: AnalyzerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn missing_config_file_is_read_error() {
        let err = AnalyzerConfig::from_json_file(Path::new("/nonexistent/icering.json"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
