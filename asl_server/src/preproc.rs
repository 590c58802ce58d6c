//! Preprocessing of cropped hand images into classifier input.
//!
//! grayscale -> gaussian blur (15x15) -> binary threshold (161) -> resize (32x32) -> [0, 1]
//!
//! Rounding, blur borders and resize sampling follow OpenCV (`cvtColor`, `GaussianBlur` with
//! `BORDER_REFLECT_101`, `resize` with `INTER_LINEAR`), which produced the training data.
//!
use image::{
    imageops::{crop_imm, interpolate_bilinear},
    GrayImage, ImageBuffer, Luma, RgbImage,
};
use imageproc::filter::separable_filter_equal;
use tract_onnx::prelude::tract_ndarray::Array4;

/// Side length of the square classifier input.
pub const INPUT_SIZE: u32 = 32;

/// Gaussian kernel size in both directions.
pub const BLUR_KERNEL_SIZE: usize = 15;

/// Blurred intensities at or above this value become white.
pub const THRESHOLD: u8 = 161;

type GrayImageF32 = ImageBuffer<Luma<f32>, Vec<f32>>;

pub struct Preprocessor {
    kernel: Vec<f32>,
    threshold: u8,
    size: u32,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(BLUR_KERNEL_SIZE, THRESHOLD, INPUT_SIZE)
    }
}

impl Preprocessor {
    pub fn new(kernel_size: usize, threshold: u8, size: u32) -> Self {
        Self {
            kernel: gaussian_kernel(kernel_size),
            threshold,
            size,
        }
    }

    /// Turn a hand crop into a `(1, size, size, 1)` tensor with values in `[0, 1]`.
    ///
    /// Returns `None` for crops without any pixels.
    pub fn run(&self, crop: &RgbImage) -> Option<Array4<f32>> {
        if crop.width() == 0 || crop.height() == 0 {
            return None;
        }

        let gray = to_grayscale(crop);
        let blurred = self.blur(&gray);
        let binary = binarize(&blurred, self.threshold);
        let resized = resize_linear(&binary, self.size);

        let tensor = Array4::from_shape_fn(
            (1, self.size as usize, self.size as usize, 1),
            |(_, y, x, _)| resized[(x as _, y as _)][0] as f32 / 255.0,
        );

        Some(tensor)
    }

    /// Gaussian blur with mirrored borders. The result stays in `f32`.
    fn blur(&self, image: &GrayImage) -> GrayImageF32 {
        let radius = (self.kernel.len() / 2) as u32;
        let padded = pad_reflect_101(image, radius);
        let blurred: GrayImageF32 = separable_filter_equal(&padded, &self.kernel);

        crop_imm(&blurred, radius, radius, image.width(), image.height()).to_image()
    }
}

/// Convert to grayscale with BT.601 luma weights, rounded to the nearest integer.
fn to_grayscale(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image[(x, y)].0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([luma.round().min(255.0) as u8])
    })
}

/// Map an index outside of `0..len` back into it, mirroring without repeating the edge.
///
/// `gfedcb|abcdefgh|gfedcba`
fn reflect_101(index: i64, len: i64) -> i64 {
    if len == 1 {
        return 0;
    }

    let period = 2 * (len - 1);
    let index = index.rem_euclid(period);
    match index < len {
        true => index,
        false => period - index,
    }
}

/// Grow the image by `pad` pixels on every side, filled by [`reflect_101`].
fn pad_reflect_101(image: &GrayImage, pad: u32) -> GrayImageF32 {
    let (width, height) = image.dimensions();
    let pad = pad as i64;

    ImageBuffer::from_fn(
        width + 2 * pad as u32,
        height + 2 * pad as u32,
        |x, y| {
            let src_x = reflect_101(x as i64 - pad, width as i64) as u32;
            let src_y = reflect_101(y as i64 - pad, height as i64) as u32;
            Luma([image[(src_x, src_y)][0] as f32])
        },
    )
}

/// Normalized 1D gaussian kernel with sigma derived from the kernel size.
///
/// `sigma = 0.3 * ((size - 1) * 0.5 - 1) + 0.8`
pub fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size as f32 - 1.0) / 2.0;

    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();

    weights.into_iter().map(|w| w / sum).collect()
}

/// Binarize: rounded intensities `>= threshold` become 255, everything else 0.
fn binarize(image: &GrayImageF32, threshold: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        match image[(x, y)][0].round() >= threshold as f32 {
            true => Luma([255]),
            false => Luma([0]),
        }
    })
}

/// Bilinear resize to `size x size`.
///
/// Output pixel `d` samples the source at `(d + 0.5) * scale - 0.5`, so every output pixel mixes
/// at most two source pixels per axis, regardless of the scale.
fn resize_linear(image: &GrayImage, size: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    let source = |d: u32, len: u32| {
        let scale = len as f32 / size as f32;
        ((d as f32 + 0.5) * scale - 0.5).clamp(0.0, (len - 1) as f32)
    };

    GrayImage::from_fn(size, size, |x, y| {
        interpolate_bilinear(image, source(x, width), source(y, height)).unwrap_or(Luma([0]))
    })
}
