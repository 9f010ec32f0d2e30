// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Model input tensor construction.
//!
//! Converts a prompt set plus the image's scale descriptor into the fixed
//! bundle of `f32` tensors the SAM decoder consumes. Building is pure: the
//! same prompts and scale always produce bit-identical tensors.

use crate::models::prompt::{ClickType, PointPrompt, PromptSet};
use crate::util::geometry::ModelScale;
use ndarray::{Array1, Array2, Array3, Array4};

/// Side length of the low resolution mask input.
pub const MASK_INPUT_SIZE: usize = 256;

/// Everything the decoder needs besides the image embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInputs {
    /// `[1, n, 2]` prompt coordinates in model space
    pub point_coords: Array3<f32>,
    /// `[1, n]` click labels
    pub point_labels: Array2<f32>,
    /// `[height, width]` of the natural image
    pub orig_im_size: Array1<f32>,
    pub mask_input: Array4<f32>,
    pub has_mask_input: Array1<f32>,
}

impl ModelInputs {
    /// Number of prompt points, padding included.
    pub fn point_count(&self) -> usize {
        self.point_labels.len()
    }
}

/// Build the decoder inputs for `prompts`.
///
/// Returns `None` for an empty or unusable prompt set; inference must then
/// be skipped rather than run on placeholder tensors.
pub fn build_model_inputs(prompts: &PromptSet, scale: &ModelScale) -> Option<ModelInputs> {
    if !prompts.is_usable() {
        return None;
    }

    let points: Vec<PointPrompt> = match prompts {
        PromptSet::Box(bbox) => bbox.corner_points().to_vec(),
        PromptSet::Points(clicks) => {
            // Without a box the decoder expects a trailing padding point
            let mut points = clicks.clone();
            points.push(PointPrompt::new(0.0, 0.0, ClickType::Padding));
            points
        }
        PromptSet::Empty => return None,
    };

    let n = points.len();
    let mut coords = Vec::with_capacity(n * 2);
    let mut labels = Vec::with_capacity(n);
    for point in &points {
        let (x, y) = match point.click_type {
            ClickType::Padding => (0.0, 0.0),
            _ => scale.to_model(point.x, point.y),
        };
        coords.push(x);
        coords.push(y);
        labels.push(point.click_type.label());
    }

    Some(ModelInputs {
        point_coords: Array3::from_shape_vec((1, n, 2), coords).ok()?,
        point_labels: Array2::from_shape_vec((1, n), labels).ok()?,
        orig_im_size: Array1::from(vec![scale.height, scale.width]),
        mask_input: Array4::zeros((1, 1, MASK_INPUT_SIZE, MASK_INPUT_SIZE)),
        has_mask_input: Array1::from(vec![0.0]),
    })
}
