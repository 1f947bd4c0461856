//! Assignment of profile peaks to known ice-diffraction resolutions.

use super::contamination::{contamination_level, median};
use super::peaks::PeakCandidate;
use super::radial_profile::RadialProfile;

/// Hexagonal ice lines checked by default, in priority order (Å).
pub const ICE_RESOLUTIONS_ANGSTROM: [f64; 4] = [3.9, 3.7, 3.4, 2.7];

/// Default radius window around each expected ring (pixels).
pub const DEFAULT_MATCH_TOLERANCE_PX: f64 = 30.0;

/// One reference resolution with its matching window.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IceReference {
    /// Resolution in Ångström.
    pub resolution_angstrom: f64,
    /// A peak matches when `|r - expected| < tolerance_px`.
    pub tolerance_px: f64,
}

impl IceReference {
    pub fn new(resolution_angstrom: f64, tolerance_px: f64) -> Self {
        Self {
            resolution_angstrom,
            tolerance_px,
        }
    }
}

/// Detector calibration `radius_px = (numerator_angstrom / d) * scale_px`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ReciprocalCalibration {
    pub numerator_angstrom: f64,
    pub scale_px: f64,
}

impl Default for ReciprocalCalibration {
    fn default() -> Self {
        Self {
            numerator_angstrom: 10.0,
            scale_px: 50.0,
        }
    }
}

impl ReciprocalCalibration {
    /// Expected ring radius in pixels for a resolution in Ångström.
    pub fn radius_px(&self, resolution_angstrom: f64) -> f64 {
        (self.numerator_angstrom / resolution_angstrom) * self.scale_px
    }
}

/// How a peak picks among several references whose windows contain it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPriority {
    /// First reference in list order wins.
    #[default]
    ListOrder,
    /// Smallest radius error wins; ties fall back to list order.
    Nearest,
}

/// Reference list and calibration for ring matching.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RingMatchConfig {
    /// Ordered references; order is the match priority under [`MatchPriority::ListOrder`].
    pub references: Vec<IceReference>,
    pub calibration: ReciprocalCalibration,
    pub priority: MatchPriority,
}

impl Default for RingMatchConfig {
    fn default() -> Self {
        Self {
            references: ICE_RESOLUTIONS_ANGSTROM
                .iter()
                .map(|&d| IceReference::new(d, DEFAULT_MATCH_TOLERANCE_PX))
                .collect(),
            calibration: ReciprocalCalibration::default(),
            priority: MatchPriority::ListOrder,
        }
    }
}

impl RingMatchConfig {
    /// Same references with one shared tolerance.
    pub fn with_uniform_tolerance(mut self, tolerance_px: f64) -> Self {
        for r in &mut self.references {
            r.tolerance_px = tolerance_px;
        }
        self
    }

    /// Reference assigned to a peak at `radius_px`, if any.
    pub fn match_reference(&self, radius_px: f64) -> Option<&IceReference> {
        let within = self.references.iter().filter_map(|r| {
            let err = (radius_px - self.calibration.radius_px(r.resolution_angstrom)).abs();
            (err < r.tolerance_px).then_some((r, err))
        });
        match self.priority {
            MatchPriority::ListOrder => within.map(|(r, _)| r).next(),
            MatchPriority::Nearest => within
                .fold(None, |best: Option<(&IceReference, f64)>, (r, err)| match best {
                    Some((_, best_err)) if best_err <= err => best,
                    _ => Some((r, err)),
                })
                .map(|(r, _)| r),
        }
    }
}

/// A peak identified as an ice ring.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DetectedRing {
    /// Matched reference resolution (Å).
    pub resolution: f64,
    /// Peak radius in pixels.
    pub radius_pixels: f64,
    /// Smoothed profile intensity at the peak.
    pub intensity: f64,
    /// Severity in `[0, 100]`.
    pub contamination_level: f64,
}

/// Match candidates against the references and score the matches.
///
/// The background for scoring is the median of the raw (unsmoothed)
/// profile. Candidates outside every window are dropped; input order is kept.
pub fn match_rings(
    candidates: &[PeakCandidate],
    raw_profile: &RadialProfile,
    config: &RingMatchConfig,
) -> Vec<DetectedRing> {
    let background = median(raw_profile.intensities());
    let mut rings = Vec::with_capacity(candidates.len());
    for c in candidates {
        let Some(reference) = config.match_reference(c.radius_px) else {
            tracing::trace!(radius_px = c.radius_px, "peak matches no ice resolution");
            continue;
        };
        rings.push(DetectedRing {
            resolution: reference.resolution_angstrom,
            radius_pixels: c.radius_px,
            intensity: c.intensity,
            contamination_level: contamination_level(c.intensity, background),
        });
    }
    tracing::debug!(
        n_candidates = candidates.len(),
        n_rings = rings.len(),
        background,
        "ring matching"
    );
    rings
}
