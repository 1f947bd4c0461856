//! Top-level error for analyses that also acquire their input.

use crate::config::ConfigError;
use crate::image_source::ImageSourceError;

/// Failure of a full "load + analyze" call.
#[derive(Debug)]
pub enum AnalysisError {
    /// The frame could not be acquired.
    Image(ImageSourceError),
    /// The configuration is invalid for this frame.
    Config(ConfigError),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image(e) => write!(f, "image acquisition failed: {}", e),
            Self::Config(e) => write!(f, "invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Image(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

impl From<ImageSourceError> for AnalysisError {
    fn from(e: ImageSourceError) -> Self {
        Self::Image(e)
    }
}

impl From<ConfigError> for AnalysisError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
