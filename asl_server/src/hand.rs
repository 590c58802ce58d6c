//! Hand landmark detection and the bounding box around a hand.
//!
use std::path::Path;

use anyhow::{bail, Context, Result};
use image::{imageops::FilterType, RgbImage};
use tract_onnx::prelude::*;

use crate::nn::{NnModel, NnOut};

/// Number of landmarks of a hand.
pub const NUM_LANDMARKS: usize = 21;

/// Landmark position relative to the image size, usually within `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

pub type HandLandmarks = Vec<Landmark>;

pub trait HandDetector: Send + Sync {
    /// Detect hands on an RGB frame, returning one landmark set per hand.
    fn detect(&self, frame: &RgbImage) -> Result<Vec<HandLandmarks>>;
}

/// Axis-aligned pixel box, `x_max` and `y_max` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.x_max.saturating_sub(self.x_min)
    }

    pub fn height(&self) -> u32 {
        self.y_max.saturating_sub(self.y_min)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Copy the enclosed region out of the frame.
    pub fn crop(&self, frame: &RgbImage) -> RgbImage {
        image::imageops::crop_imm(frame, self.x_min, self.y_min, self.width(), self.height())
            .to_image()
    }
}

/// Pixel box around all landmarks, grown by `margin` on every side and clamped to the frame.
///
/// Returns `None` if there are no landmarks.
pub fn hand_bbox(
    landmarks: &[Landmark],
    width: u32,
    height: u32,
    margin: u32,
) -> Option<BoundingBox> {
    if landmarks.is_empty() {
        return None;
    }

    let (w, h) = (width as i64, height as i64);
    let (mut x_min, mut y_min, mut x_max, mut y_max) = (w, h, 0_i64, 0_i64);

    for landmark in landmarks {
        // Truncate towards zero like an integer cast
        let x = (landmark.x * width as f32) as i64;
        let y = (landmark.y * height as f32) as i64;
        x_min = x_min.min(x);
        y_min = y_min.min(y);
        x_max = x_max.max(x);
        y_max = y_max.max(y);
    }

    let margin = margin as i64;
    let clamp = |v: i64, upper: i64| v.clamp(0, upper) as u32;

    // Casts of infinite coordinates saturate at the i64 bounds
    Some(BoundingBox {
        x_min: clamp(x_min.saturating_sub(margin), w),
        y_min: clamp(y_min.saturating_sub(margin), h),
        x_max: clamp(x_max.saturating_add(margin), w),
        y_max: clamp(y_max.saturating_add(margin), h),
    })
}

/// Single-hand landmark network in ONNX format.
///
/// Input is a `(1, size, size, 3)` RGB image scaled to `[0, 1]`. The first output holds
/// `21 * 3` landmark coordinates in input pixels, the second the hand presence score.
pub struct OnnxHandLandmarker {
    model: NnModel,
    size: u32,
    min_confidence: f32,
}

impl OnnxHandLandmarker {
    pub fn new(path: impl AsRef<Path>, size: u32, min_confidence: f32) -> Result<Self> {
        let path = path.as_ref();
        let input_fact = InferenceFact::dt_shape(
            f32::datum_type(),
            tvec!(1, size as usize, size as usize, 3),
        );
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| format!("failed to load hand landmark model {}", path.display()))?
            .with_input_fact(0, input_fact)?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self {
            model,
            size,
            min_confidence,
        })
    }

    fn preproc(&self, frame: &RgbImage) -> Tensor {
        let resized: RgbImage =
            image::imageops::resize(frame, self.size, self.size, FilterType::Triangle);

        tract_ndarray::Array4::from_shape_fn(
            (1, self.size as usize, self.size as usize, 3),
            |(_, y, x, c)| resized[(x as _, y as _)][c] as f32 / 255.0,
        )
        .into()
    }

    fn postproc(&self, raw_nn_out: NnOut) -> Result<Vec<HandLandmarks>> {
        if raw_nn_out.len() < 2 {
            bail!("expected 2 outputs, got {}", raw_nn_out.len());
        }

        let presence = raw_nn_out[1]
            .to_array_view::<f32>()?
            .iter()
            .cloned()
            .next()
            .unwrap_or(0.0);
        log::debug!("Hand presence {:.3}", presence);
        if presence < self.min_confidence {
            return Ok(vec![]);
        }

        let coords: Vec<f32> = raw_nn_out[0]
            .to_array_view::<f32>()?
            .iter()
            .cloned()
            .collect();
        if coords.len() < NUM_LANDMARKS * 3 {
            bail!("expected {} landmark values, got {}", NUM_LANDMARKS * 3, coords.len());
        }

        // Every landmark is (x, y, z), z is not needed
        let size = self.size as f32;
        let landmarks = coords
            .chunks(3)
            .take(NUM_LANDMARKS)
            .map(|xyz| Landmark {
                x: xyz[0] / size,
                y: xyz[1] / size,
            })
            .collect();

        Ok(vec![landmarks])
    }
}

impl HandDetector for OnnxHandLandmarker {
    fn detect(&self, frame: &RgbImage) -> Result<Vec<HandLandmarks>> {
        let raw_nn_out = self.model.run(tvec!(self.preproc(frame).into()))?;
        self.postproc(raw_nn_out)
    }
}
