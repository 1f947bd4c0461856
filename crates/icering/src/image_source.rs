//! Diffraction frame container and decoding helpers.
//!
//! The analysis core only needs an in-memory intensity grid. Decoding from
//! disk is a thin convenience layer over the `image` crate.

use std::path::{Path, PathBuf};

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

/// 16-bit grayscale buffer, the usual container for detector frames.
pub type Gray16Image = ImageBuffer<Luma<u16>, Vec<u16>>;
/// 16-bit RGB buffer.
pub type Rgb16Image = ImageBuffer<Rgb<u16>, Vec<u16>>;

/// ITU-R BT.601 luma weights for R, G, B.
const BT601_LUMA: [f64; 3] = [0.299, 0.587, 0.114];

fn bt601_luma<T: image::Primitive + Into<f64>>(p: &Rgb<T>) -> f64 {
    let [r, g, b] = p.0;
    (BT601_LUMA[0] * r.into() + BT601_LUMA[1] * g.into() + BT601_LUMA[2] * b.into()).round()
}

// ── Error type ─────────────────────────────────────────────────────────────

/// Errors raised while acquiring a diffraction frame.
#[derive(Debug)]
pub enum ImageSourceError {
    /// The file could not be opened or decoded.
    Decode {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying decoder error.
        source: image::ImageError,
    },
    /// The grid has no pixels.
    Empty {
        /// Reported width.
        width: usize,
        /// Reported height.
        height: usize,
    },
    /// `width * height` does not fit in memory addressing.
    TooLarge {
        /// Reported width.
        width: usize,
        /// Reported height.
        height: usize,
    },
    /// Raw buffer length does not match `width * height`.
    BufferSize {
        /// Expected number of samples.
        expected: usize,
        /// Provided number of samples.
        got: usize,
    },
}

impl std::fmt::Display for ImageSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode { path, source } => {
                write!(f, "cannot load image {}: {}", path.display(), source)
            }
            Self::Empty { width, height } => {
                write!(f, "image has no pixels ({}x{})", width, height)
            }
            Self::TooLarge { width, height } => {
                write!(f, "image dimensions {}x{} overflow", width, height)
            }
            Self::BufferSize { expected, got } => {
                write!(f, "buffer size mismatch: expected {}, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for ImageSourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ── Frame ──────────────────────────────────────────────────────────────────

/// Immutable row-major intensity grid of a single diffraction frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffractionImage {
    width: usize,
    height: usize,
    data: Vec<f64>,
    center: Option<[f64; 2]>,
}

impl DiffractionImage {
    /// Build from raw row-major samples.
    pub fn from_raw(width: usize, height: usize, data: Vec<f64>) -> Result<Self, ImageSourceError> {
        if width == 0 || height == 0 {
            return Err(ImageSourceError::Empty { width, height });
        }
        let expected = width
            .checked_mul(height)
            .ok_or(ImageSourceError::TooLarge { width, height })?;
        if data.len() != expected {
            return Err(ImageSourceError::BufferSize {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
            center: None,
        })
    }

    /// Build from an 8-bit grayscale buffer.
    pub fn from_gray(gray: &GrayImage) -> Result<Self, ImageSourceError> {
        let (w, h) = gray.dimensions();
        let data = gray.as_raw().iter().map(|&v| f64::from(v)).collect();
        Self::from_raw(w as usize, h as usize, data)
    }

    /// Build from a 16-bit grayscale buffer.
    pub fn from_gray16(gray: &Gray16Image) -> Result<Self, ImageSourceError> {
        let (w, h) = gray.dimensions();
        let data = gray.as_raw().iter().map(|&v| f64::from(v)).collect();
        Self::from_raw(w as usize, h as usize, data)
    }

    /// Build from an 8-bit RGB buffer using BT.601 luma, rounded to whole counts.
    pub fn from_rgb(rgb: &RgbImage) -> Result<Self, ImageSourceError> {
        let (w, h) = rgb.dimensions();
        let data = rgb.pixels().map(bt601_luma).collect();
        Self::from_raw(w as usize, h as usize, data)
    }

    /// Build from a 16-bit RGB buffer using BT.601 luma, rounded to whole counts.
    pub fn from_rgb16(rgb: &Rgb16Image) -> Result<Self, ImageSourceError> {
        let (w, h) = rgb.dimensions();
        let data = rgb.pixels().map(bt601_luma).collect();
        Self::from_raw(w as usize, h as usize, data)
    }

    /// Decode an image file into a grayscale frame.
    ///
    /// Sources deeper than 8 bits per channel keep their full range. Color
    /// sources are reduced with BT.601 weights; alpha is ignored.
    pub fn open(path: &Path) -> Result<Self, ImageSourceError> {
        let decoded = image::open(path).map_err(|source| ImageSourceError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let color = decoded.color();
        let wide = color.bytes_per_pixel() > color.channel_count();
        match (color.has_color(), wide) {
            (false, false) => Self::from_gray(&decoded.into_luma8()),
            (false, true) => Self::from_gray16(&decoded.into_luma16()),
            (true, false) => Self::from_rgb(&decoded.into_rgb8()),
            (true, true) => Self::from_rgb16(&decoded.into_rgb16()),
        }
    }

    /// Override the beam center carried by this frame.
    pub fn with_center(mut self, center: [f64; 2]) -> Self {
        self.center = Some(center);
        self
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major samples.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Intensity at (x, y).
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    /// Beam center override carried by the frame, if any.
    pub fn center_override(&self) -> Option<[f64; 2]> {
        self.center
    }

    /// Integer-halved geometric center `(width / 2, height / 2)`.
    pub fn geometric_center(&self) -> [f64; 2] {
        [(self.width / 2) as f64, (self.height / 2) as f64]
    }

    /// Maximum profiled radius: half the image diagonal, truncated to whole pixels.
    pub fn max_radius(&self) -> f64 {
        let w = self.width as f64;
        let h = self.height as f64;
        ((w * w + h * h).sqrt() / 2.0).floor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_buffer_length_is_checked() {
        let err = DiffractionImage::from_raw(4, 4, vec![0.0; 10]).unwrap_err();
        assert!(matches!(
            err,
            ImageSourceError::BufferSize {
                expected: 16,
                got: 10
            }
        ));
    }

    #[test]
    fn overflowing_dimensions_are_rejected() {
        let err = DiffractionImage::from_raw(usize::MAX, 2, vec![0.0; 2]).unwrap_err();
        assert!(matches!(
            err,
            ImageSourceError::TooLarge {
                width: usize::MAX,
                height: 2
            }
        ));
    }

    #[test]
    fn empty_grid_is_rejected() {
        let err = DiffractionImage::from_raw(0, 5, Vec::new()).unwrap_err();
        assert!(matches!(err, ImageSourceError::Empty { .. }));
    }

    #[test]
    fn gray_conversion_keeps_row_major_layout() {
        let mut gray = GrayImage::new(3, 2);
        gray.put_pixel(2, 1, Luma([77]));
        let img = DiffractionImage::from_gray(&gray).unwrap();
        assert_eq!(img.width(), 3);
        assert_eq!(img.height(), 2);
        assert_eq!(img.get(2, 1), 77.0);
        assert_eq!(img.data()[5], 77.0);
    }

    #[test]
    fn geometric_center_uses_integer_halving() {
        let img = DiffractionImage::from_raw(5, 4, vec![0.0; 20]).unwrap();
        assert_eq!(img.geometric_center(), [2.0, 2.0]);
        assert!(img.center_override().is_none());
        let img = img.with_center([1.5, 3.0]);
        assert_eq!(img.center_override(), Some([1.5, 3.0]));
    }

    #[test]
    fn max_radius_truncates_half_diagonal() {
        let img = DiffractionImage::from_raw(300, 400, vec![0.0; 120_000]).unwrap();
        assert_eq!(img.max_radius(), 250.0);
        let img = DiffractionImage::from_raw(3, 3, vec![0.0; 9]).unwrap();
        assert_eq!(img.max_radius(), 2.0);
    }

    #[test]
    fn color_reduces_with_bt601_weights() {
        let mut rgb = RgbImage::new(3, 1);
        rgb.put_pixel(0, 0, Rgb([255, 0, 0]));
        rgb.put_pixel(1, 0, Rgb([0, 255, 0]));
        rgb.put_pixel(2, 0, Rgb([0, 0, 255]));
        let img = DiffractionImage::from_rgb(&rgb).unwrap();
        assert_eq!(img.data(), &[76.0, 150.0, 29.0]);

        let rgb16 = Rgb16Image::from_pixel(1, 1, Rgb([1000, 1000, 1000]));
        let img = DiffractionImage::from_rgb16(&rgb16).unwrap();
        assert_eq!(img.get(0, 0), 1000.0);
    }

    fn temp_png(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("icering_{}_{}.png", tag, std::process::id()))
    }

    #[test]
    fn open_decodes_color_and_deep_frames() {
        let path = temp_png("rgb");
        RgbImage::from_pixel(4, 2, Rgb([200, 100, 50])).save(&path).unwrap();
        let img = DiffractionImage::open(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!((img.width(), img.height()), (4, 2));
        // 0.299 * 200 + 0.587 * 100 + 0.114 * 50 = 124.2
        assert!(img.data().iter().all(|&v| v == 124.0));

        let path = temp_png("gray16");
        Gray16Image::from_pixel(3, 3, Luma([40_000])).save(&path).unwrap();
        let img = DiffractionImage::open(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(img.get(1, 1), 40_000.0);
    }

    #[test]
    fn missing_file_reports_decode_error() {
        let err = DiffractionImage::open(Path::new("/nonexistent/frame_0001.png")).unwrap_err();
        assert!(matches!(err, ImageSourceError::Decode { .. }));
        assert!(err.to_string().contains("frame_0001.png"));
    }
}
