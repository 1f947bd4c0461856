//! Ring pipeline stages: radial profile → peaks → matching → overlays.

pub mod contamination;
pub mod matcher;
pub mod overlay;
pub mod peaks;
pub mod radial_profile;

pub use matcher::{
    DetectedRing, IceReference, MatchPriority, ReciprocalCalibration, RingMatchConfig,
    DEFAULT_MATCH_TOLERANCE_PX, ICE_RESOLUTIONS_ANGSTROM,
};
pub use overlay::{OverlayConfig, RingOverlay};
pub use peaks::{PeakCandidate, PeakDetectionParams, MAX_SMOOTHING_SIGMA};
pub use radial_profile::{RadialProfile, RadialProfileConfig};
