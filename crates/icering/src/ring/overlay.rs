//! Drawable circle geometry for detected rings.

use std::f64::consts::TAU;

use super::matcher::DetectedRing;
use crate::severity::ColorTier;

/// Overlay rendering controls.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Points per circle.
    pub point_count: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self { point_count: 360 }
    }
}

/// Circle outline and severity color of one detected ring.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RingOverlay {
    /// Resolution of the ring this overlay draws (Å).
    pub resolution: f64,
    /// Circle points `[x, y]` in image pixels; not clipped to the frame.
    pub coordinates: Vec<[f64; 2]>,
    pub contamination_level: f64,
    /// Hex color of `tier`.
    pub color: String,
    pub tier: ColorTier,
}

/// `point_count` points evenly spaced on a circle, starting at angle 0.
///
/// Point `k` sits at angle `2πk / point_count`; the last point does not
/// repeat the first.
pub fn ring_coordinates(center: [f64; 2], radius_px: f64, point_count: usize) -> Vec<[f64; 2]> {
    let [cx, cy] = center;
    (0..point_count)
        .map(|k| {
            let theta = TAU * k as f64 / point_count as f64;
            [cx + radius_px * theta.cos(), cy + radius_px * theta.sin()]
        })
        .collect()
}

/// Build the overlay for a detected ring.
pub fn build_overlay(ring: &DetectedRing, center: [f64; 2], config: &OverlayConfig) -> RingOverlay {
    let tier = ColorTier::from_level(ring.contamination_level);
    RingOverlay {
        resolution: ring.resolution,
        coordinates: ring_coordinates(center, ring.radius_pixels, config.point_count),
        contamination_level: ring.contamination_level,
        color: tier.hex().to_string(),
        tier,
    }
}
