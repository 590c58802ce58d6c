//! Per-frame pipeline from a posted data URL to a letter.
//!
//! decode -> mirror -> detect hand -> crop -> preprocess -> classify
//!
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::RgbImage;
use tract_onnx::prelude::tract_ndarray::Array4;

use crate::{
    error::{PipelineError, Result},
    hand::{hand_bbox, HandDetector},
    labels::Labels,
    nn::{best_class, LetterClassifier},
    preproc::{Preprocessor, INPUT_SIZE},
    stats::{FrameOutcome, STATS},
};

/// Pixels added around the landmarks on every side of the hand crop.
pub const DEFAULT_MARGIN: u32 = 30;

/// Letter recognized on a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    pub letter: char,
    /// Probability of the letter.
    pub confidence: f32,
}

pub struct FramePipeline {
    detector: Box<dyn HandDetector>,
    classifier: Box<dyn LetterClassifier>,
    labels: Labels,
    preproc: Preprocessor,
    margin: u32,
    mirror: bool,
}

impl FramePipeline {
    /// Build the pipeline, checking that the classifier agrees with the labels.
    pub fn new(
        detector: Box<dyn HandDetector>,
        classifier: Box<dyn LetterClassifier>,
        labels: Labels,
        margin: u32,
        mirror: bool,
    ) -> anyhow::Result<Self> {
        let size = INPUT_SIZE as usize;
        let probabilities = classifier.predict(Array4::zeros((1, size, size, 1)))?;
        labels.check_num_classes(probabilities.len())?;

        Ok(Self {
            detector,
            classifier,
            labels,
            preproc: Preprocessor::default(),
            margin,
            mirror,
        })
    }

    /// Run on a base64 image, optionally prefixed with `data:...,`.
    pub fn run(&self, image: &str) -> Result<Option<Prediction>> {
        let frame = decode_frame(image)?;
        self.run_frame(frame)
    }

    /// Run on a decoded frame. `None` if no hand was found.
    pub fn run_frame(&self, frame: RgbImage) -> Result<Option<Prediction>> {
        let frame = match self.mirror {
            true => image::imageops::flip_horizontal(&frame),
            false => frame,
        };

        let hands = self
            .detector
            .detect(&frame)
            .map_err(PipelineError::Detection)?;

        // At most one hand is tracked
        let Some(landmarks) = hands.first() else {
            STATS.record(FrameOutcome::NoHand);
            return Ok(None);
        };

        let bbox = match hand_bbox(landmarks, frame.width(), frame.height(), self.margin) {
            Some(bbox) if !bbox.is_empty() => bbox,
            _ => {
                log::debug!("Empty hand crop, skipping classification");
                STATS.record(FrameOutcome::EmptyCrop);
                return Ok(None);
            }
        };

        let crop = bbox.crop(&frame);
        let Some(input) = self.preproc.run(&crop) else {
            STATS.record(FrameOutcome::EmptyCrop);
            return Ok(None);
        };

        let probabilities = self
            .classifier
            .predict(input)
            .map_err(PipelineError::Classification)?;
        STATS.record(FrameOutcome::Classified);

        let (index, confidence) = best_class(&probabilities).ok_or_else(|| {
            PipelineError::Classification(anyhow::anyhow!("classifier returned no classes"))
        })?;
        let letter = self.labels.get(index).ok_or_else(|| {
            PipelineError::Classification(anyhow::anyhow!("no label for class {}", index))
        })?;

        log::debug!(
            "Detected {} with {:.2}% confidence in {:?}",
            letter,
            confidence * 100.0,
            bbox
        );

        Ok(Some(Prediction { letter, confidence }))
    }
}

/// Decode a base64 (data URL) image into an RGB frame.
pub fn decode_frame(image: &str) -> Result<RgbImage> {
    let bytes = STANDARD.decode(common::protocol::strip_data_url(image))?;
    let frame = image::load_from_memory(&bytes)?.to_rgb8();

    Ok(frame)
}

#[cfg(test)]
mod test {

    use std::{
        io::Cursor,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    use image::{ImageOutputFormat, Rgb};

    use super::*;
    use crate::hand::{HandLandmarks, Landmark};

    /// Reports the same landmarks for every frame.
    struct FixedHand(Vec<HandLandmarks>);

    impl HandDetector for FixedHand {
        fn detect(&self, _frame: &RgbImage) -> anyhow::Result<Vec<HandLandmarks>> {
            Ok(self.0.clone())
        }
    }

    struct FailingHand;

    impl HandDetector for FailingHand {
        fn detect(&self, _frame: &RgbImage) -> anyhow::Result<Vec<HandLandmarks>> {
            anyhow::bail!("detector exploded")
        }
    }

    /// Always votes for one class and counts its calls.
    struct OneClass {
        index: usize,
        num_classes: usize,
        calls: Arc<AtomicUsize>,
    }

    impl LetterClassifier for OneClass {
        fn predict(&self, _input: Array4<f32>) -> anyhow::Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut probabilities = vec![0.01; self.num_classes];
            probabilities[self.index] = 0.9;
            Ok(probabilities)
        }
    }

    fn hand(x: f32, y: f32) -> Vec<HandLandmarks> {
        vec![vec![
            Landmark { x, y },
            Landmark {
                x: x + 0.1,
                y: y + 0.1,
            },
        ]]
    }

    fn pipeline(
        hands: Vec<HandLandmarks>,
        index: usize,
    ) -> anyhow::Result<(FramePipeline, Arc<AtomicUsize>)> {
        pipeline_with_margin(hands, index, DEFAULT_MARGIN)
    }

    fn pipeline_with_margin(
        hands: Vec<HandLandmarks>,
        index: usize,
        margin: u32,
    ) -> anyhow::Result<(FramePipeline, Arc<AtomicUsize>)> {
        let calls = Arc::new(AtomicUsize::new(0));
        let classifier = OneClass {
            index,
            num_classes: 24,
            calls: Arc::clone(&calls),
        };
        let pipeline = FramePipeline::new(
            Box::new(FixedHand(hands)),
            Box::new(classifier),
            Labels::default(),
            margin,
            true,
        )?;

        Ok((pipeline, calls))
    }

    fn frame() -> RgbImage {
        RgbImage::from_pixel(200, 100, Rgb([200, 180, 170]))
    }

    #[test]
    fn test_detects_letter() -> anyhow::Result<()> {
        let (pipeline, calls) = pipeline(hand(0.4, 0.4), 1)?;
        let prediction = pipeline.run_frame(frame())?.expect("hand on frame");
        assert_eq!(prediction.letter, 'B');
        assert!((prediction.confidence - 0.9).abs() < 1e-6);

        // One call on construction, one for the frame
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        Ok(())
    }

    #[test]
    fn test_no_hand() -> anyhow::Result<()> {
        let (pipeline, calls) = pipeline(vec![], 0)?;
        assert_eq!(pipeline.run_frame(frame())?, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        Ok(())
    }

    #[test]
    fn test_empty_crop_skips_classification() -> anyhow::Result<()> {
        // Hand right of the frame: x_min starts at the width, x_max is clamped to it
        let (pipeline, calls) = pipeline_with_margin(hand(1.5, 0.4), 0, 0)?;
        assert_eq!(pipeline.run_frame(frame())?, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Any margin keeps a non-empty box
        let (pipeline, calls) = pipeline_with_margin(hand(1.5, 0.4), 0, DEFAULT_MARGIN)?;
        assert!(pipeline.run_frame(frame())?.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        Ok(())
    }

    #[test]
    fn test_label_mismatch_fails_construction() {
        let classifier = OneClass {
            index: 0,
            num_classes: 26,
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let pipeline = FramePipeline::new(
            Box::new(FixedHand(vec![])),
            Box::new(classifier),
            Labels::default(),
            DEFAULT_MARGIN,
            true,
        );
        assert!(pipeline.is_err());
    }

    #[test]
    fn test_detection_error() -> anyhow::Result<()> {
        let classifier = OneClass {
            index: 0,
            num_classes: 24,
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let pipeline = FramePipeline::new(
            Box::new(FailingHand),
            Box::new(classifier),
            Labels::default(),
            DEFAULT_MARGIN,
            true,
        )?;

        let err = pipeline.run_frame(frame()).unwrap_err();
        assert!(matches!(err, PipelineError::Detection(_)));
        assert_eq!(err.to_string(), "hand detection failed: detector exploded");

        Ok(())
    }

    #[test]
    fn test_decode_frame() -> anyhow::Result<()> {
        let mut png = Cursor::new(Vec::new());
        frame().write_to(&mut png, ImageOutputFormat::Png)?;
        let url = common::protocol::to_data_url("image/png", png.get_ref());

        let decoded = decode_frame(&url)?;
        assert_eq!(decoded.dimensions(), (200, 100));
        assert_eq!(decoded[(0, 0)], Rgb([200, 180, 170]));

        Ok(())
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            decode_frame("data:image/jpeg;base64,***"),
            Err(PipelineError::Decode(_))
        ));
        assert!(matches!(
            decode_frame("data:image/jpeg;base64,QUJD"),
            Err(PipelineError::Image(_))
        ));
    }
}
