//! Synthetic diffraction frames for unit tests.

use image::{GrayImage, ImageBuffer, Luma};

use crate::image_source::DiffractionImage;

/// Annulus `[inner, outer]` (pixels, inclusive) drawn around `center`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RingBand {
    pub center: [f64; 2],
    pub inner: f64,
    pub outer: f64,
}

impl RingBand {
    /// Band of half-width `half_width` around `radius`.
    pub(crate) fn around(center: [f64; 2], radius: f64, half_width: f64) -> Self {
        Self {
            center,
            inner: radius - half_width,
            outer: radius + half_width,
        }
    }

    fn contains(&self, x: u32, y: u32) -> bool {
        let d = (x as f64 - self.center[0]).hypot(y as f64 - self.center[1]);
        d >= self.inner && d <= self.outer
    }
}

/// 8-bit detector frame with `ring_pix` inside `band` and `bg_pix` elsewhere.
pub(crate) fn ring_gray(w: u32, h: u32, band: RingBand, ring_pix: u8, bg_pix: u8) -> GrayImage {
    GrayImage::from_fn(w, h, |x, y| {
        Luma([if band.contains(x, y) { ring_pix } else { bg_pix }])
    })
}

/// Frame from `gray` after a Gaussian point-spread of `sigma` pixels.
///
/// Blurring runs in `f32` through `imageproc`; intensities stay on the
/// 0..=255 scale and are not re-quantized.
pub(crate) fn blurred_frame(gray: &GrayImage, sigma: f32) -> DiffractionImage {
    let (w, h) = gray.dimensions();
    let f = ImageBuffer::<Luma<f32>, Vec<f32>>::from_fn(w, h, |x, y| {
        Luma([f32::from(gray.get_pixel(x, y)[0])])
    });
    let blurred = imageproc::filter::gaussian_blur_f32(&f, sigma);
    let data = blurred.as_raw().iter().map(|&v| f64::from(v)).collect();
    DiffractionImage::from_raw(w as usize, h as usize, data).unwrap()
}

/// Square frame with one ring band `[radius - half_width, radius + half_width]`
/// around the geometric center.
pub(crate) fn ring_frame(
    size: u32,
    radius: f64,
    half_width: f64,
    ring_pix: u8,
    bg_pix: u8,
) -> DiffractionImage {
    let c = (size / 2) as f64;
    let band = RingBand::around([c, c], radius, half_width);
    DiffractionImage::from_gray(&ring_gray(size, size, band, ring_pix, bg_pix)).unwrap()
}

/// Square frame of constant intensity.
pub(crate) fn flat_frame(size: u32, value: u8) -> DiffractionImage {
    let gray = GrayImage::from_pixel(size, size, Luma([value]));
    DiffractionImage::from_gray(&gray).unwrap()
}

/// Copy of `img` with an extra ring band painted at `value`.
pub(crate) fn add_ring(
    img: &DiffractionImage,
    center: [f64; 2],
    radius: f64,
    half_width: f64,
    value: f64,
) -> DiffractionImage {
    let w = img.width();
    let data = img
        .data()
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let dx = (i % w) as f64 - center[0];
            let dy = (i / w) as f64 - center[1];
            if (dx.hypot(dy) - radius).abs() <= half_width {
                value
            } else {
                v
            }
        })
        .collect();
    DiffractionImage::from_raw(w, img.height(), data).unwrap()
}
