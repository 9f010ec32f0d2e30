// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! ONNX Runtime backed mask predictor.

use super::mask::MaskOutput;
use super::predictor::{MaskPredictor, EMBEDDING_INPUT};
use super::tensors::ModelInputs;
use crate::error::AppError;
use crate::io::embedding::Embedding;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use std::path::Path;

/// SAM prompt decoder running in an ONNX Runtime session.
pub struct OnnxPredictor {
    session: Session,
    /// First declared output, treated as the mask
    output_name: String,
}

fn model_load_error(e: impl std::fmt::Display) -> AppError {
    AppError::ModelLoad(e.to_string())
}

fn inference_error(e: impl std::fmt::Display) -> AppError {
    AppError::Inference(e.to_string())
}

impl OnnxPredictor {
    /// Create a session for the model file at `path`.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let session = Session::builder()
            .map_err(model_load_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(model_load_error)?
            .commit_from_file(path)
            .map_err(|e| AppError::ModelLoad(format!("{}: {}", path.display(), e)))?;

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| AppError::ModelLoad(format!("{} declares no outputs", path.display())))?;

        log::info!("Loaded model {} (mask output: {})", path.display(), output_name);

        Ok(Self {
            session,
            output_name,
        })
    }
}

impl MaskPredictor for OnnxPredictor {
    fn predict(&mut self, embedding: &Embedding, inputs: &ModelInputs) -> Result<MaskOutput, AppError> {
        let embedding_value = Value::from_array(embedding.array().clone()).map_err(inference_error)?;
        let coords_value = Value::from_array(inputs.point_coords.clone()).map_err(inference_error)?;
        let labels_value = Value::from_array(inputs.point_labels.clone()).map_err(inference_error)?;
        let size_value = Value::from_array(inputs.orig_im_size.clone()).map_err(inference_error)?;
        let mask_value = Value::from_array(inputs.mask_input.clone()).map_err(inference_error)?;
        let has_mask_value = Value::from_array(inputs.has_mask_input.clone()).map_err(inference_error)?;

        let outputs = self
            .session
            .run(ort::inputs![
                EMBEDDING_INPUT => embedding_value,
                "point_coords" => coords_value,
                "point_labels" => labels_value,
                "orig_im_size" => size_value,
                "mask_input" => mask_value,
                "has_mask_input" => has_mask_value
            ])
            .map_err(inference_error)?;
        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            AppError::Inference(format!("model did not return output {}", self.output_name))
        })?;

        let (shape, data) = output.try_extract_tensor::<f32>().map_err(inference_error)?;
        let dims: Vec<i64> = shape.iter().copied().collect();
        MaskOutput::from_raw(&dims, data)
    }
}
