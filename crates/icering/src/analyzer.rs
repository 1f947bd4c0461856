//! End-to-end analysis of one frame.
//!
//! [`analyze`] is a pure function of the frame and the configuration.
//! [`IceRingAnalyzer`] holds a configuration so the same settings can be
//! applied to many frames, from any number of threads.

use std::path::Path;

use crate::config::{AnalyzerConfig, ConfigError};
use crate::error::AnalysisError;
use crate::image_source::DiffractionImage;
use crate::ring::matcher::match_rings;
use crate::ring::overlay::build_overlay;
use crate::ring::peaks::detect_peaks;
use crate::ring::radial_profile::{compute_radial_profile, RadialProfile};
use crate::AnalysisResult;

fn prepare(
    image: &DiffractionImage,
    config: &AnalyzerConfig,
) -> Result<([f64; 2], RadialProfile), ConfigError> {
    config.validate()?;
    let center = config.geometry.resolve_center(image)?;
    if image.max_radius() <= 0.0 {
        return Err(ConfigError::DegenerateGeometry {
            width: image.width(),
            height: image.height(),
        });
    }
    let profile = compute_radial_profile(image, center, config.profile.num_bins);
    Ok((center, profile))
}

/// Radial profile of `image` under `config`, after validation.
pub fn radial_profile(
    image: &DiffractionImage,
    config: &AnalyzerConfig,
) -> Result<RadialProfile, ConfigError> {
    prepare(image, config).map(|(_, profile)| profile)
}

/// Detect and score ice rings in a single frame.
///
/// Invalid configuration fails before any work is done. Frames without
/// rings are a valid `CLEAN` outcome, not an error.
pub fn analyze(
    image: &DiffractionImage,
    config: &AnalyzerConfig,
) -> Result<AnalysisResult, ConfigError> {
    let (center, profile) = prepare(image, config)?;
    tracing::debug!(
        width = image.width(),
        height = image.height(),
        cx = center[0],
        cy = center[1],
        n_bins = profile.len(),
        "radial profile computed"
    );

    let candidates = detect_peaks(&profile, &config.peaks);
    let rings = match_rings(&candidates, &profile, &config.matching);
    let overlays = rings
        .iter()
        .map(|r| build_overlay(r, center, &config.overlay))
        .collect();

    let result = AnalysisResult::from_rings(rings, overlays);
    tracing::info!(
        "{} ice rings, max contamination {:.2}, status {}",
        result.ring_count,
        result.max_contamination,
        result.status,
    );
    Ok(result)
}

/// Configured ice-ring analyzer.
///
/// # Examples
///
/// ```no_run
/// use icering::{DiffractionImage, IceRingAnalyzer};
/// use std::path::Path;
///
/// let analyzer = IceRingAnalyzer::new();
/// let frame = DiffractionImage::open(Path::new("frame_0001.png")).unwrap();
/// let result = analyzer.analyze(&frame).unwrap();
/// println!("{}: {}", result.status, result.recommendation);
/// ```
#[derive(Debug, Clone, Default)]
pub struct IceRingAnalyzer {
    config: AnalyzerConfig,
}

impl IceRingAnalyzer {
    /// Analyzer with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer with full config control.
    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Access the current configuration.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Mutable access to configuration for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut AnalyzerConfig {
        &mut self.config
    }

    /// Analyze an in-memory frame.
    pub fn analyze(&self, image: &DiffractionImage) -> Result<AnalysisResult, ConfigError> {
        analyze(image, &self.config)
    }

    /// Load a frame from disk and analyze it.
    pub fn analyze_path(&self, path: &Path) -> Result<AnalysisResult, AnalysisError> {
        tracing::debug!("loading frame {}", path.display());
        let image = DiffractionImage::open(path)?;
        Ok(self.analyze(&image)?)
    }

    /// Radial profile of a frame under this analyzer's configuration.
    pub fn radial_profile(&self, image: &DiffractionImage) -> Result<RadialProfile, ConfigError> {
        radial_profile(image, &self.config)
    }
}
