// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for the viewer.
//!
//! Each failure the user can observe maps to its own variant so that setup
//! problems (model, image, embedding) are reported distinctly from failures
//! inside the per-interaction inference loop.

use thiserror::Error;

/// Application errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Failed to load the model: {0}")]
    ModelLoad(String),

    #[error("Failed to load image: {0}")]
    ImageLoad(String),

    #[error("Failed to fetch embedding: {0}")]
    EmbeddingFetch(String),

    #[error("Failed to decode embedding: {0}")]
    EmbeddingDecode(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl AppError {
    /// Setup errors disable inference until the user loads new resources.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            AppError::ModelLoad(_)
                | AppError::ImageLoad(_)
                | AppError::EmbeddingFetch(_)
                | AppError::EmbeddingDecode(_)
        )
    }
}
