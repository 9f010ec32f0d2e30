// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image embedding loading.
//!
//! Embeddings arrive as `.npy` files, either posted back by the embedding
//! backend (multipart form field `image_url`) or read from a precomputed
//! file next to a local image.

use crate::error::AppError;
use ndarray::ArrayD;
use ndarray_npy::ReadNpyExt;
use std::path::Path;

/// Precomputed image embedding, consumed by every inference call.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    array: ArrayD<f32>,
}

impl Embedding {
    pub fn new(array: ArrayD<f32>) -> Self {
        Self { array }
    }

    pub fn shape(&self) -> &[usize] {
        self.array.shape()
    }

    pub fn array(&self) -> &ArrayD<f32> {
        &self.array
    }
}

/// Decode `.npy` bytes holding `f32` data.
pub fn decode_npy(bytes: &[u8]) -> Result<Embedding, AppError> {
    let array = ArrayD::<f32>::read_npy(std::io::Cursor::new(bytes))
        .map_err(|e| AppError::EmbeddingDecode(e.to_string()))?;
    log::debug!("Decoded embedding with shape {:?}", array.shape());
    Ok(Embedding::new(array))
}

/// Read a precomputed embedding from disk.
pub fn load_embedding_file(path: &Path) -> Result<Embedding, AppError> {
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::EmbeddingFetch(format!("{}: {}", path.display(), e)))?;
    let embedding = decode_npy(&bytes)?;
    log::info!("Loaded embedding {} {:?}", path.display(), embedding.shape());
    Ok(embedding)
}

/// Ask the embedding backend to embed the image at `image_url`.
pub fn fetch_embedding(
    client: &reqwest::blocking::Client,
    endpoint: &str,
    image_url: &str,
) -> Result<Embedding, AppError> {
    let form = reqwest::blocking::multipart::Form::new().text("image_url", image_url.to_string());

    let response = client
        .post(endpoint)
        .multipart(form)
        .send()
        .map_err(|e| AppError::EmbeddingFetch(format!("{}: {}", endpoint, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::EmbeddingFetch(format!("HTTP error! status: {}", status)));
    }

    let bytes = response
        .bytes()
        .map_err(|e| AppError::EmbeddingFetch(format!("Failed to read response body: {}", e)))?;
    let embedding = decode_npy(&bytes)?;
    log::info!(
        "Fetched embedding for {} ({} bytes, shape {:?})",
        image_url,
        bytes.len(),
        embedding.shape()
    );
    Ok(embedding)
}
