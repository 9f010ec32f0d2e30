// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image loading from local files and remote URLs.
//!
//! Images are decoded to RGBA8 so they can be uploaded as egui textures
//! directly. Remote images are fetched without cookies or credentials.

use crate::error::AppError;
use std::path::Path;

/// A decoded image ready for display.
#[derive(Clone)]
pub struct LoadedImage {
    /// Path or URL the image came from
    pub source: String,
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixels, row-major
    pub pixels: Vec<u8>,
}

impl std::fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedImage")
            .field("source", &self.source)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Decode an in-memory encoded image (PNG, JPEG, ...).
pub fn decode_image(bytes: &[u8], source: &str) -> Result<LoadedImage, AppError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| AppError::ImageLoad(format!("{}: {}", source, e)))?;
    from_dynamic(img, source)
}

/// Load an image from the local filesystem.
pub fn load_image_file(path: &Path) -> Result<LoadedImage, AppError> {
    let img = image::open(path)
        .map_err(|e| AppError::ImageLoad(format!("{}: {}", path.display(), e)))?;
    from_dynamic(img, &path.to_string_lossy())
}

/// Fetch and decode an image from a URL.
pub fn load_image_url(
    client: &reqwest::blocking::Client,
    url: &str,
) -> Result<LoadedImage, AppError> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| AppError::ImageLoad(format!("Failed to load image from {}: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::ImageLoad(format!(
            "Failed to load image from {}: HTTP {}",
            url, status
        )));
    }

    let bytes = response
        .bytes()
        .map_err(|e| AppError::ImageLoad(format!("Failed to read image body from {}: {}", url, e)))?;
    decode_image(&bytes, url)
}

fn from_dynamic(img: image::DynamicImage, source: &str) -> Result<LoadedImage, AppError> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(AppError::ImageLoad(format!("{}: image has no pixels", source)));
    }

    log::info!("Decoded image {} ({}x{})", source, width, height);

    Ok(LoadedImage {
        source: source.to_string(),
        width,
        height,
        pixels: rgba.into_raw(),
    })
}
