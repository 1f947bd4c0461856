//! icering: ice-ring detection for X-ray diffraction frames.
//!
//! Crystalline ice in a cryo-cooled sample shows up as sharp powder rings
//! at fixed resolutions. The pipeline turns one grayscale frame into a
//! contamination report:
//!
//! 1. **Radial profile** – azimuthal mean intensity per radius bin.
//! 2. **Peaks** – Gaussian smoothing, local maxima, prominence/height gates,
//!    greedy minimum separation.
//! 3. **Matching** – calibrated expected radii of the ice lines, list-order
//!    priority.
//! 4. **Scoring** – excess over the profile median, clamped to `[0, 100]`.
//! 5. **Overlays** – circle outlines plus a severity color per ring.
//!
//! # Public API
//! - [`IceRingAnalyzer`] and [`analyze`] as entry points
//! - [`AnalyzerConfig`] for tuning
//! - [`DiffractionImage`] as input and [`AnalysisResult`] as output

mod analyzer;
mod config;
mod error;
mod image_source;
pub mod ring;
mod severity;

#[cfg(test)]
mod test_utils;

pub use analyzer::{analyze, radial_profile, IceRingAnalyzer};
pub use config::{AnalyzerConfig, BeamGeometry, ConfigError};
pub use error::AnalysisError;
pub use image_source::{DiffractionImage, Gray16Image, ImageSourceError, Rgb16Image};
pub use ring::{
    DetectedRing, IceReference, MatchPriority, OverlayConfig, PeakDetectionParams, RadialProfile,
    RadialProfileConfig, ReciprocalCalibration, RingMatchConfig, RingOverlay,
};
pub use severity::{AnalysisStatus, ColorTier, CRITICAL_THRESHOLD, WARNING_THRESHOLD};

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Contamination report for a single frame.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisResult {
    /// At least one ice ring was found.
    pub ice_detected: bool,
    /// Number of detected rings.
    pub ring_count: usize,
    /// Highest ring contamination, rounded to 2 decimals; 0 without rings.
    pub max_contamination: f64,
    /// Detected rings in ascending radius order.
    pub detected_rings: Vec<DetectedRing>,
    /// One overlay per detected ring, same order.
    pub ring_overlays: Vec<RingOverlay>,
    pub status: AnalysisStatus,
    pub recommendation: String,
}

impl AnalysisResult {
    /// Aggregate per-ring results into a frame report.
    ///
    /// Status is taken from the unrounded maximum, so a level of 9.999
    /// reports `CLEAN` even though `max_contamination` rounds to 10.00.
    pub fn from_rings(detected_rings: Vec<DetectedRing>, ring_overlays: Vec<RingOverlay>) -> Self {
        let max = detected_rings
            .iter()
            .map(|r| r.contamination_level)
            .fold(0.0f64, f64::max);
        let status = AnalysisStatus::from_level(max);
        Self {
            ice_detected: !detected_rings.is_empty(),
            ring_count: detected_rings.len(),
            max_contamination: round2(max),
            detected_rings,
            ring_overlays,
            status,
            recommendation: status.recommendation().to_string(),
        }
    }

    /// Report for a frame without ice rings.
    pub fn clean() -> Self {
        Self::from_rings(Vec::new(), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(level: f64) -> DetectedRing {
        DetectedRing {
            resolution: 3.7,
            radius_pixels: 135.0,
            intensity: 0.0,
            contamination_level: level,
        }
    }

    fn status_for(level: f64) -> AnalysisStatus {
        AnalysisResult::from_rings(vec![ring(level)], Vec::new()).status
    }

    #[test]
    fn clean_report() {
        let r = AnalysisResult::clean();
        assert!(!r.ice_detected);
        assert_eq!(r.ring_count, 0);
        assert_eq!(r.max_contamination, 0.0);
        assert_eq!(r.status, AnalysisStatus::Clean);
        assert_eq!(r.recommendation, "No ice detected. Data quality adequate.");
    }

    #[test]
    fn status_boundaries_on_max_contamination() {
        assert_eq!(status_for(9.999), AnalysisStatus::Clean);
        assert_eq!(status_for(10.0), AnalysisStatus::Warning);
        assert_eq!(status_for(29.999), AnalysisStatus::Warning);
        assert_eq!(status_for(30.0), AnalysisStatus::Contaminated);
    }

    #[test]
    fn max_contamination_is_rounded_maximum() {
        let r = AnalysisResult::from_rings(vec![ring(5.0), ring(12.3456), ring(7.0)], Vec::new());
        assert_eq!(r.ring_count, 3);
        assert!(r.ice_detected);
        assert_eq!(r.max_contamination, 12.35);
        assert_eq!(r.status, AnalysisStatus::Warning);
        assert_eq!(
            r.recommendation,
            "Minor ice contamination detected. Monitor data quality."
        );
    }

    #[test]
    fn zero_level_rings_still_count_as_ice() {
        let r = AnalysisResult::from_rings(vec![ring(0.0)], Vec::new());
        assert!(r.ice_detected);
        assert_eq!(r.status, AnalysisStatus::Clean);
    }
}
