// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Shared application state.
//!
//! The application owns a single [`AppState`]; UI components receive
//! references to it. Each field is written only through its setter so the
//! invariants tying the fields together (a new image resets its scale,
//! prompts and mask) live in one place.

use super::prompt::PromptSet;
use crate::error::AppError;
use crate::inference::mask::MaskOverlay;
use crate::interaction::Mode;
use crate::io::embedding::Embedding;
use crate::io::media::LoadedImage;
use crate::util::geometry::ModelScale;
use std::sync::Arc;

/// What the user sees in the status area.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Status {
    #[default]
    Idle,
    Busy(String),
    Error(AppError),
}

/// The loaded image together with its scale descriptor.
#[derive(Debug, Clone)]
pub struct ImageState {
    pub image: LoadedImage,
    pub scale: ModelScale,
}

/// Application state shared between the UI components.
#[derive(Debug, Default)]
pub struct AppState {
    image: Option<ImageState>,
    embedding: Option<Arc<Embedding>>,
    prompts: PromptSet,
    mask: Option<MaskOverlay>,
    /// Bumped whenever `mask` changes so the view knows to re-upload it
    mask_revision: u64,
    mode: Mode,
    model_ready: bool,
    status: Status,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&ImageState> {
        self.image.as_ref()
    }

    pub fn scale(&self) -> Option<ModelScale> {
        self.image.as_ref().map(|state| state.scale)
    }

    /// Replace the image; its scale is computed here and nowhere else.
    ///
    /// Prompts, mask and embedding belong to the previous image and are dropped.
    pub fn set_image(&mut self, image: LoadedImage) {
        let scale = ModelScale::from_dimensions(image.width, image.height);
        log::info!(
            "Image {} ({}x{}), sam scale {:.4}",
            image.source,
            image.width,
            image.height,
            scale.sam_scale
        );
        self.image = Some(ImageState { image, scale });
        self.embedding = None;
        self.prompts = PromptSet::Empty;
        self.set_mask(None);
    }

    pub fn clear_image(&mut self) {
        self.image = None;
        self.embedding = None;
        self.prompts = PromptSet::Empty;
        self.set_mask(None);
    }

    pub fn embedding(&self) -> Option<&Arc<Embedding>> {
        self.embedding.as_ref()
    }

    pub fn set_embedding(&mut self, embedding: Option<Embedding>) {
        self.embedding = embedding.map(Arc::new);
    }

    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    pub fn set_prompts(&mut self, prompts: PromptSet) {
        self.prompts = prompts;
    }

    pub fn mask(&self) -> Option<&MaskOverlay> {
        self.mask.as_ref()
    }

    pub fn mask_revision(&self) -> u64 {
        self.mask_revision
    }

    pub fn set_mask(&mut self, mask: Option<MaskOverlay>) {
        if mask.is_none() && self.mask.is_none() {
            return;
        }
        self.mask = mask;
        self.mask_revision += 1;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Change the interaction mode; prompts and mask from the old mode are dropped.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.prompts = PromptSet::Empty;
        self.set_mask(None);
    }

    pub fn model_ready(&self) -> bool {
        self.model_ready
    }

    pub fn set_model_ready(&mut self, ready: bool) {
        self.model_ready = ready;
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn set_status(&mut self, status: Status) {
        if let Status::Error(ref e) = status {
            log::error!("{}", e);
        }
        self.status = status;
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.status, Status::Busy(_))
    }

    /// Model, image and embedding are all present.
    pub fn inference_ready(&self) -> bool {
        self.model_ready && self.image.is_some() && self.embedding.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::mask::mask_to_overlay;
    use crate::models::prompt::PointPrompt;
    use ndarray::ArrayD;

    fn image(width: u32, height: u32) -> LoadedImage {
        LoadedImage {
            source: "test.png".to_string(),
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    fn overlay() -> MaskOverlay {
        mask_to_overlay(&[1.0], 1, 1).unwrap()
    }

    #[test]
    fn test_set_image_computes_scale() {
        let mut state = AppState::new();
        state.set_image(image(2000, 1000));
        let scale = state.scale().unwrap();
        assert_eq!((scale.width, scale.height), (2000.0, 1000.0));
        assert!((scale.sam_scale - 0.512).abs() < 1e-6);
    }

    #[test]
    fn test_new_image_resets_dependents() {
        let mut state = AppState::new();
        state.set_image(image(10, 10));
        state.set_embedding(Some(Embedding::new(ArrayD::zeros(vec![1]))));
        state.set_prompts(PromptSet::Points(vec![PointPrompt::positive(1.0, 1.0)]));
        state.set_mask(Some(overlay()));

        state.set_image(image(20, 10));
        assert!(state.embedding().is_none());
        assert!(state.prompts().is_empty());
        assert!(state.mask().is_none());
    }

    #[test]
    fn test_mode_change_clears_prompts_and_mask() {
        let mut state = AppState::new();
        state.set_prompts(PromptSet::Points(vec![PointPrompt::positive(1.0, 1.0)]));
        state.set_mask(Some(overlay()));

        state.set_mode(Mode::Box);
        assert_eq!(state.mode(), Mode::Box);
        assert!(state.prompts().is_empty());
        assert!(state.mask().is_none());
    }

    #[test]
    fn test_mask_revision_tracks_changes() {
        let mut state = AppState::new();
        let start = state.mask_revision();
        state.set_mask(None);
        assert_eq!(state.mask_revision(), start);

        state.set_mask(Some(overlay()));
        state.set_mask(None);
        assert_eq!(state.mask_revision(), start + 2);
    }

    #[test]
    fn test_inference_ready() {
        let mut state = AppState::new();
        assert!(!state.inference_ready());
        state.set_model_ready(true);
        state.set_image(image(4, 4));
        assert!(!state.inference_ready());
        state.set_embedding(Some(Embedding::new(ArrayD::zeros(vec![1]))));
        assert!(state.inference_ready());
        state.clear_image();
        assert!(!state.inference_ready());
    }

    #[test]
    fn test_status() {
        let mut state = AppState::new();
        state.set_status(Status::Busy("Loading...".to_string()));
        assert!(state.is_busy());
        state.set_status(Status::Error(AppError::ImageLoad("404".to_string())));
        assert!(!state.is_busy());
    }
}
