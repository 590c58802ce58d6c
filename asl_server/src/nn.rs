//! Letter classification network.
//!
use std::path::Path;

use anyhow::{bail, Context, Result};
use itertools::Itertools;
use ndarray::s;
use tract_onnx::prelude::*;

use crate::preproc::INPUT_SIZE;

pub(crate) type NnModel =
    SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;
pub(crate) type NnOut = TVec<TValue>;

pub trait LetterClassifier: Send + Sync {
    /// Class probabilities for a preprocessed `(1, 32, 32, 1)` input.
    fn predict(&self, input: tract_ndarray::Array4<f32>) -> Result<Vec<f32>>;
}

/// Most likely class with its probability.
///
/// On ties the first class wins.
pub fn best_class(probabilities: &[f32]) -> Option<(usize, f32)> {
    probabilities
        .iter()
        .position_min_by(|a, b| b.total_cmp(a))
        .map(|index| (index, probabilities[index]))
}

/// CNN trained on binarized 32x32 hand crops, in ONNX format.
pub struct OnnxLetterClassifier {
    model: NnModel,
}

impl OnnxLetterClassifier {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let size = INPUT_SIZE as usize;
        let input_fact = InferenceFact::dt_shape(f32::datum_type(), tvec!(1, size, size, 1));
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| format!("failed to load classifier model {}", path.display()))?
            .with_input_fact(0, input_fact)?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self { model })
    }

    fn postproc(&self, raw_nn_out: NnOut) -> Result<Vec<f32>> {
        if raw_nn_out.is_empty() {
            bail!("classifier produced no output");
        }

        // Output is (1, num_classes)
        let probabilities = raw_nn_out[0]
            .to_array_view::<f32>()?
            .into_dimensionality::<tract_ndarray::Ix2>()?
            .slice(s![0, ..])
            .to_vec();

        Ok(probabilities)
    }
}

impl LetterClassifier for OnnxLetterClassifier {
    fn predict(&self, input: tract_ndarray::Array4<f32>) -> Result<Vec<f32>> {
        let input: Tensor = input.into();
        let raw_nn_out = self.model.run(tvec!(input.into()))?;
        self.postproc(raw_nn_out)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_best_class() {
        assert_eq!(best_class(&[0.1, 0.7, 0.2]), Some((1, 0.7)));
        assert_eq!(best_class(&[]), None);
    }

    #[test]
    fn test_best_class_tie_takes_first() {
        assert_eq!(best_class(&[0.4, 0.1, 0.4, 0.1]), Some((0, 0.4)));
    }
}
