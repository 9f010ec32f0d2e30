// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The boundary to the segmentation model runtime.

use super::mask::MaskOutput;
use super::tensors::ModelInputs;
use crate::error::AppError;
use crate::io::embedding::Embedding;
use std::path::Path;

/// Name of the embedding input; the remaining inputs are named after the [`ModelInputs`] fields.
pub const EMBEDDING_INPUT: &str = "image_embeddings";

/// Runs the prompt decoder on a precomputed embedding.
pub trait MaskPredictor: Send {
    /// Returns the first declared model output, interpreted as the mask.
    fn predict(&mut self, embedding: &Embedding, inputs: &ModelInputs) -> Result<MaskOutput, AppError>;
}

/// Load the decoder model at `path`.
#[cfg(feature = "onnx")]
pub fn load_predictor(path: &Path) -> Result<Box<dyn MaskPredictor>, AppError> {
    Ok(Box::new(super::onnx::OnnxPredictor::load(path)?))
}

/// Load the decoder model at `path`.
#[cfg(not(feature = "onnx"))]
pub fn load_predictor(path: &Path) -> Result<Box<dyn MaskPredictor>, AppError> {
    Err(AppError::ModelLoad(format!(
        "cannot load {}: samview was built without the `onnx` feature",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_load_without_runtime_is_model_error() {
        let err = load_predictor(Path::new("model/sam.onnx")).err().unwrap();
        assert!(matches!(err, AppError::ModelLoad(_)));
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn test_load_missing_model_is_model_error() {
        let err = load_predictor(Path::new("/nonexistent/sam.onnx")).err().unwrap();
        assert!(matches!(err, AppError::ModelLoad(_)));
    }
}
