// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the coordinate transformations between the three
//! spaces the viewer deals with: the rendered (display) image, the natural
//! pixel grid of the loaded image, and the model's 1024 long-side space.

/// The model expects inputs resized so that the longest side is this long.
pub const LONG_SIDE_LENGTH: f32 = 1024.0;

/// Natural image dimensions plus the factor mapping them into model space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelScale {
    pub height: f32,
    pub width: f32,
    pub sam_scale: f32,
}

impl ModelScale {
    /// Compute the scale descriptor for an image of the given natural size.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        let width = width as f32;
        let height = height as f32;
        Self {
            height,
            width,
            sam_scale: LONG_SIDE_LENGTH / width.max(height),
        }
    }

    /// Map a natural pixel coordinate into model space.
    pub fn to_model(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.sam_scale, y * self.sam_scale)
    }
}

/// Ratio between natural and rendered width of the displayed image.
pub fn display_to_natural(natural_width: f32, rendered_width: f32) -> f32 {
    if rendered_width > 0.0 {
        natural_width / rendered_width
    } else {
        1.0
    }
}

/// Convert an element-relative pointer offset into natural pixel coordinates.
pub fn to_natural(offset_x: f32, offset_y: f32, ratio: f32) -> (f32, f32) {
    (offset_x * ratio, offset_y * ratio)
}
