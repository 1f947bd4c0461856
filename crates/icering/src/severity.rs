//! Severity bands shared by ring overlays and the per-image status.

/// Contamination level at which a ring or image becomes a warning.
pub const WARNING_THRESHOLD: f64 = 10.0;
/// Contamination level at which a ring or image becomes critical.
pub const CRITICAL_THRESHOLD: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    Low,
    Mid,
    High,
}

fn band(level: f64) -> Band {
    if level < WARNING_THRESHOLD {
        Band::Low
    } else if level < CRITICAL_THRESHOLD {
        Band::Mid
    } else {
        Band::High
    }
}

/// Color bucket of a ring overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorTier {
    /// Below [`WARNING_THRESHOLD`].
    Ok,
    /// In `[WARNING_THRESHOLD, CRITICAL_THRESHOLD)`.
    Warning,
    /// At or above [`CRITICAL_THRESHOLD`].
    Critical,
}

impl ColorTier {
    /// Tier for a contamination level in `[0, 100]`.
    pub fn from_level(level: f64) -> Self {
        match band(level) {
            Band::Low => Self::Ok,
            Band::Mid => Self::Warning,
            Band::High => Self::Critical,
        }
    }

    /// Hex display color.
    pub fn hex(self) -> &'static str {
        match self {
            Self::Ok => "#00ff88",
            Self::Warning => "#ffaa00",
            Self::Critical => "#ff3333",
        }
    }
}

/// Overall verdict for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    Clean,
    Warning,
    Contaminated,
}

impl AnalysisStatus {
    /// Status for the maximum ring contamination of a frame.
    pub fn from_level(max_contamination: f64) -> Self {
        match band(max_contamination) {
            Band::Low => Self::Clean,
            Band::Mid => Self::Warning,
            Band::High => Self::Contaminated,
        }
    }

    /// Operator-facing recommendation text.
    pub fn recommendation(self) -> &'static str {
        match self {
            Self::Clean => "No ice detected. Data quality adequate.",
            Self::Warning => "Minor ice contamination detected. Monitor data quality.",
            Self::Contaminated => {
                "Severe ice contamination detected. Consider re-mounting crystal."
            }
        }
    }

    /// Wire name (`CLEAN`, `WARNING`, `CONTAMINATED`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "CLEAN",
            Self::Warning => "WARNING",
            Self::Contaminated => "CONTAMINATED",
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
