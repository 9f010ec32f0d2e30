// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Prompt data structures.
//!
//! This module defines the point and box prompts that condition the
//! segmentation model. All coordinates are in the natural pixel space of
//! the loaded image, never in screen space.

/// Semantic role of a point prompt, encoded as the model's label value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickType {
    /// Background click; hover and box input never produce one.
    #[allow(dead_code)]
    Negative,
    Positive,
    BoxTopLeft,
    BoxBottomRight,
    Padding,
}

impl ClickType {
    /// Label value fed to the model.
    pub fn label(self) -> f32 {
        match self {
            ClickType::Negative => 0.0,
            ClickType::Positive => 1.0,
            ClickType::BoxTopLeft => 2.0,
            ClickType::BoxBottomRight => 3.0,
            ClickType::Padding => -1.0,
        }
    }
}

/// A single point prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointPrompt {
    pub x: f32,
    pub y: f32,
    pub click_type: ClickType,
}

impl PointPrompt {
    pub fn new(x: f32, y: f32, click_type: ClickType) -> Self {
        Self { x, y, click_type }
    }

    /// Positive inclusion point, as produced by hovering.
    pub fn positive(x: f32, y: f32) -> Self {
        Self::new(x, y, ClickType::Positive)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned bounding box prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxPrompt {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoxPrompt {
    /// Build the rectangle spanning two drag corners, in any order.
    ///
    /// A drag that never moved gives a zero-area box; it is kept.
    pub fn from_corners(start: (f32, f32), end: (f32, f32)) -> Self {
        Self {
            x: start.0.min(end.0),
            y: start.1.min(end.1),
            width: (end.0 - start.0).abs(),
            height: (end.1 - start.1).abs(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }

    /// Top-left and bottom-right corners as labelled point prompts.
    pub fn corner_points(&self) -> [PointPrompt; 2] {
        [
            PointPrompt::new(self.x, self.y, ClickType::BoxTopLeft),
            PointPrompt::new(
                self.x + self.width,
                self.y + self.height,
                ClickType::BoxBottomRight,
            ),
        ]
    }

    fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

/// The prompts currently conditioning the model.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PromptSet {
    #[default]
    Empty,
    Points(Vec<PointPrompt>),
    Box(BoxPrompt),
}

impl PromptSet {
    /// Whether the set can be turned into model inputs.
    pub fn is_usable(&self) -> bool {
        match self {
            PromptSet::Empty => false,
            PromptSet::Points(points) => {
                !points.is_empty() && points.iter().all(PointPrompt::is_finite)
            }
            PromptSet::Box(b) => b.is_valid(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            PromptSet::Empty => true,
            PromptSet::Points(points) => points.is_empty(),
            PromptSet::Box(_) => false,
        }
    }
}
