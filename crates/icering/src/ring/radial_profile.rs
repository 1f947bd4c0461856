//! Azimuthally averaged intensity profile around the beam center.

use crate::image_source::DiffractionImage;

/// Binning controls for the radial profile.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RadialProfileConfig {
    /// Number of bin edges spanning `[0, max_radius]`.
    ///
    /// The profile has `num_bins - 1` entries.
    pub num_bins: usize,
}

impl Default for RadialProfileConfig {
    fn default() -> Self {
        Self { num_bins: 500 }
    }
}

/// Mean intensity per radial bin, indexed by the bin's inner radius.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RadialProfile {
    radii: Vec<f64>,
    intensities: Vec<f64>,
}

impl RadialProfile {
    /// Number of bins.
    pub fn len(&self) -> usize {
        self.radii.len()
    }

    /// `true` when the profile has no bins.
    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }

    /// Inner radius of each bin, in pixels.
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    /// Mean intensity of each bin (0 for empty bins).
    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    /// Iterate `(radius_start, mean_intensity)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.radii
            .iter()
            .copied()
            .zip(self.intensities.iter().copied())
    }
}

/// `num` evenly spaced values over `[start, stop]`, endpoints included.
fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            let mut out: Vec<f64> = (0..num).map(|i| start + i as f64 * step).collect();
            out[num - 1] = stop;
            out
        }
    }
}

/// Average pixel intensity in `num_bins - 1` equal-width annuli around `center`.
///
/// A pixel at distance `r` falls into bin `i` when `edge[i] <= r < edge[i + 1]`;
/// pixels at or beyond the outermost edge are ignored. Bins without pixels
/// report 0. Returns an empty profile when `num_bins < 2`.
pub fn compute_radial_profile(
    image: &DiffractionImage,
    center: [f64; 2],
    num_bins: usize,
) -> RadialProfile {
    if num_bins < 2 {
        return RadialProfile {
            radii: Vec::new(),
            intensities: Vec::new(),
        };
    }

    let edges = linspace(0.0, image.max_radius(), num_bins);
    let n_out = num_bins - 1;
    let mut sums = vec![0.0f64; n_out];
    let mut counts = vec![0usize; n_out];

    let [cx, cy] = center;
    for (y, row) in image.data().chunks_exact(image.width()).enumerate() {
        let dy = y as f64 - cy;
        for (x, &v) in row.iter().enumerate() {
            let dx = x as f64 - cx;
            let r = (dx * dx + dy * dy).sqrt();
            // Number of edges <= r; bin index is one less.
            let k = edges.partition_point(|&e| e <= r);
            if k == 0 || k > n_out {
                continue;
            }
            sums[k - 1] += v;
            counts[k - 1] += 1;
        }
    }

    let intensities = sums
        .iter()
        .zip(&counts)
        .map(|(&s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();

    let mut radii = edges;
    radii.truncate(n_out);

    RadialProfile { radii, intensities }
}
