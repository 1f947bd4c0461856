//! Smoothing and constrained peak picking on a radial profile.

use super::radial_profile::RadialProfile;

/// Gaussian kernel half-width in units of sigma.
const KERNEL_TRUNCATE: f64 = 4.0;

/// Largest accepted smoothing sigma (bins); the kernel spans `8σ + 1` taps.
pub const MAX_SMOOTHING_SIGMA: f64 = 1.0e4;

/// Peak-picking parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PeakDetectionParams {
    /// Minimum prominence in units of the smoothed profile's standard deviation.
    pub sensitivity: f64,
    /// Gaussian smoothing sigma in bins.
    pub smoothing_sigma: f64,
    /// Minimum index distance between accepted peaks.
    pub min_separation_bins: usize,
    /// Minimum peak height as a multiple of the smoothed profile mean.
    pub min_height_factor: f64,
}

impl Default for PeakDetectionParams {
    fn default() -> Self {
        Self {
            sensitivity: 1.5,
            smoothing_sigma: 3.0,
            min_separation_bins: 5,
            min_height_factor: 1.1,
        }
    }
}

/// A local maximum of the smoothed profile that survived all filters.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PeakCandidate {
    /// Bin index in the profile.
    pub bin_index: usize,
    /// Inner radius of the bin, in pixels.
    pub radius_px: f64,
    /// Smoothed intensity at the peak.
    pub intensity: f64,
}

/// Map an out-of-range index back into `[0, n)` by mirror reflection
/// about the outer sample edges (`d c b a | a b c d | d c b a`).
fn reflect_index(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

fn kernel_radius(sigma: f64) -> usize {
    (KERNEL_TRUNCATE * sigma + 0.5) as usize
}

fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = kernel_radius(sigma) as isize;
    let inv = -0.5 / (sigma * sigma);
    let mut k: Vec<f64> = (-radius..=radius)
        .map(|x| (inv * (x * x) as f64).exp())
        .collect();
    let sum: f64 = k.iter().sum();
    for w in &mut k {
        *w /= sum;
    }
    k
}

/// Gaussian-smooth a 1D sequence with reflected boundaries.
///
/// The output has the same length as the input. A sigma too small to give
/// the kernel more than one tap (including 0 and NaN) returns the input
/// unchanged; sigma is capped at [`MAX_SMOOTHING_SIGMA`].
pub fn gaussian_smooth(values: &[f64], sigma: f64) -> Vec<f64> {
    let n = values.len();
    if n == 0 || !(sigma > 0.0) {
        return values.to_vec();
    }
    let sigma = sigma.min(MAX_SMOOTHING_SIGMA);
    if kernel_radius(sigma) == 0 {
        return values.to_vec();
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;
    (0..n as isize)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(j, &w)| w * values[reflect_index(i + j as isize - radius, n)])
                .sum()
        })
        .collect()
}

/// Indices of local maxima.
///
/// A sample qualifies when it is strictly greater than both neighbours. A
/// flat run of equal samples bounded by lower samples on both sides counts
/// once, at its middle index. The first and last index never qualify.
pub fn local_maxima(values: &[f64]) -> Vec<usize> {
    let n = values.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }
    let i_max = n - 1;
    let mut i = 1;
    while i < i_max {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < i_max && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Height of `values[peak]` above the higher of its two bounding minima.
///
/// Each base is the minimum between the peak and the first strictly higher
/// sample (or the sequence boundary) on that side.
pub fn prominence(values: &[f64], peak: usize) -> f64 {
    let h = values[peak];

    let mut left_min = h;
    for &v in values[..=peak].iter().rev() {
        if v > h {
            break;
        }
        left_min = left_min.min(v);
    }

    let mut right_min = h;
    for &v in &values[peak..] {
        if v > h {
            break;
        }
        right_min = right_min.min(v);
    }

    h - left_min.max(right_min)
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Greedy minimum-separation selection by descending height.
///
/// Ties in height are visited in ascending index order. Returns the kept
/// indices in ascending order.
fn select_by_separation(values: &[f64], peaks: &[usize], min_separation: usize) -> Vec<usize> {
    if min_separation <= 1 {
        return peaks.to_vec();
    }
    let mut order: Vec<usize> = peaks.to_vec();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let mut accepted: Vec<usize> = Vec::with_capacity(order.len());
    for idx in order {
        if accepted.iter().all(|&a| a.abs_diff(idx) >= min_separation) {
            accepted.push(idx);
        } else {
            tracing::trace!(bin = idx, "peak rejected by separation");
        }
    }
    accepted.sort_unstable();
    accepted
}

/// Pick peaks from a radial profile.
///
/// Stages: Gaussian smoothing, local maxima, prominence gate
/// (`sensitivity * std`), height gate (`min_height_factor * mean`), then
/// greedy minimum separation. Output is sorted by ascending radius.
pub fn detect_peaks(profile: &RadialProfile, params: &PeakDetectionParams) -> Vec<PeakCandidate> {
    if profile.is_empty() {
        return Vec::new();
    }
    let smoothed = gaussian_smooth(profile.intensities(), params.smoothing_sigma);
    let (mean, std) = mean_and_std(&smoothed);
    let min_prominence = params.sensitivity * std;
    let min_height = params.min_height_factor * mean;

    let maxima = local_maxima(&smoothed);
    let n_maxima = maxima.len();
    let gated: Vec<usize> = maxima
        .into_iter()
        .filter(|&i| prominence(&smoothed, i) >= min_prominence)
        .filter(|&i| smoothed[i] >= min_height)
        .collect();
    let n_gated = gated.len();
    let kept = select_by_separation(&smoothed, &gated, params.min_separation_bins);

    tracing::debug!(
        n_maxima,
        n_gated,
        n_kept = kept.len(),
        min_prominence,
        min_height,
        "peak detection"
    );

    kept.into_iter()
        .map(|i| PeakCandidate {
            bin_index: i,
            radius_px: profile.radii()[i],
            intensity: smoothed[i],
        })
        .collect()
}
