// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Decoding raw mask output into a displayable overlay.

use crate::error::AppError;
use image::{Rgba, RgbaImage};

/// Colour of masked pixels; the canvas applies the overlay opacity.
pub const MASK_COLOR: [u8; 4] = [0, 114, 189, 255];

/// Logits above this value count as inside the mask.
pub const MASK_THRESHOLD: f32 = 0.0;

/// First mask of a decoder output, with its spatial dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskOutput {
    pub height: usize,
    pub width: usize,
    pub data: Vec<f32>,
}

impl MaskOutput {
    /// Take the first mask out of a `[batch, channels, height, width]` output.
    pub fn from_raw(shape: &[i64], data: &[f32]) -> Result<Self, AppError> {
        let [_, _, height, width] = shape else {
            return Err(AppError::MalformedOutput(format!(
                "expected a 4-D mask output, got shape {:?}",
                shape
            )));
        };
        let height = usize::try_from(*height)
            .map_err(|_| AppError::MalformedOutput(format!("negative height in {:?}", shape)))?;
        let width = usize::try_from(*width)
            .map_err(|_| AppError::MalformedOutput(format!("negative width in {:?}", shape)))?;

        let len = height.checked_mul(width).ok_or_else(|| {
            AppError::MalformedOutput(format!("mask of {}x{} is too large", height, width))
        })?;
        if len == 0 || data.len() < len {
            return Err(AppError::MalformedOutput(format!(
                "mask buffer of {} values does not hold a {}x{} mask",
                data.len(),
                height,
                width
            )));
        }

        Ok(Self {
            height,
            width,
            data: data[..len].to_vec(),
        })
    }
}

/// Decoded mask, ready to upload as a texture.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskOverlay {
    image: RgbaImage,
    covered: usize,
}

impl MaskOverlay {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// RGBA8 pixels, row-major.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Fraction of pixels inside the mask.
    pub fn coverage(&self) -> f32 {
        let total = self.image.width() as usize * self.image.height() as usize;
        if total == 0 {
            0.0
        } else {
            self.covered as f32 / total as f32
        }
    }
}

/// Colour every pixel whose logit exceeds the threshold, leave the rest transparent.
pub fn mask_to_overlay(data: &[f32], height: usize, width: usize) -> Result<MaskOverlay, AppError> {
    if height.checked_mul(width) != Some(data.len()) {
        return Err(AppError::MalformedOutput(format!(
            "mask has {} values, expected {}x{}",
            data.len(),
            height,
            width
        )));
    }
    let (w, h) = (
        u32::try_from(width).map_err(|_| AppError::MalformedOutput("mask too wide".into()))?,
        u32::try_from(height).map_err(|_| AppError::MalformedOutput("mask too tall".into()))?,
    );

    let mut image = RgbaImage::new(w, h);
    let mut covered = 0;
    for (pixel, value) in image.pixels_mut().zip(data) {
        if *value > MASK_THRESHOLD {
            *pixel = Rgba(MASK_COLOR);
            covered += 1;
        }
    }

    Ok(MaskOverlay { image, covered })
}

impl TryFrom<&MaskOutput> for MaskOverlay {
    type Error = AppError;

    fn try_from(output: &MaskOutput) -> Result<Self, Self::Error> {
        mask_to_overlay(&output.data, output.height, output.width)
    }
}
