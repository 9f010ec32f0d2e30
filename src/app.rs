// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module owns the shared [`AppState`] and coordinates the background
//! work around it: model loading at start-up, image and embedding loading,
//! and the inference worker that turns prompts into masks.

use crate::config::Settings;
use crate::error::AppError;
use crate::inference::predictor::{load_predictor, MaskPredictor};
use crate::inference::tensors::build_model_inputs;
use crate::inference::worker::{InferenceRequest, InferenceResponse, InferenceWorker, RequestTracker};
use crate::interaction::{Interaction, InteractionOutcome, Mode, PointerEvent};
use crate::io::embedding::{self, Embedding};
use crate::io::media::{self, LoadedImage};
use crate::models::prompt::PromptSet;
use crate::models::state::{AppState, Status};
use crate::ui::{canvas, source, toolbar};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Instant;

/// Result of a background loading step.
enum LoadEvent {
    Image(Result<LoadedImage, AppError>),
    Embedding(Result<Embedding, AppError>),
}

type ModelLoadResult = Result<Box<dyn MaskPredictor>, AppError>;

/// Main application state.
pub struct SamViewApp {
    settings: Settings,

    /// Shared state read by every UI component
    state: AppState,

    /// Hover / box state machine
    interaction: Interaction,

    /// Pointer state between frames
    pointer: canvas::PointerTracker,

    /// Generations of issued inference requests
    requests: RequestTracker,

    /// Generation we are still waiting for
    pending_generation: Option<u64>,

    /// Present once the model is loaded
    worker: Option<InferenceWorker>,

    /// Why the model failed to load; outlives later status changes
    model_error: Option<AppError>,

    /// Clear the mask at the start of the next frame
    clear_mask_next_frame: bool,

    /// Receiver for background model loading
    model_loader: Option<Receiver<ModelLoadResult>>,

    /// Receiver for background image / embedding loading
    resource_loader: Option<Receiver<LoadEvent>>,

    client: reqwest::blocking::Client,

    /// Contents of the URL field
    image_url: String,

    image_texture: Option<egui::TextureHandle>,
    image_dirty: bool,
    mask_texture: Option<egui::TextureHandle>,
    mask_texture_revision: u64,
}

impl SamViewApp {
    /// Create the application and start loading the model in the background.
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.request_timeout())
            .build()?;

        let mut app = Self::with_client(settings, client);
        app.load_model();
        Ok(app)
    }

    fn with_client(settings: Settings, client: reqwest::blocking::Client) -> Self {
        Self {
            interaction: Interaction::new(settings.hover_interval()),
            settings,
            state: AppState::new(),
            pointer: canvas::PointerTracker::default(),
            requests: RequestTracker::default(),
            pending_generation: None,
            worker: None,
            model_error: None,
            clear_mask_next_frame: false,
            model_loader: None,
            resource_loader: None,
            client,
            image_url: String::new(),
            image_texture: None,
            image_dirty: false,
            mask_texture: None,
            mask_texture_revision: 0,
        }
    }

    fn load_model(&mut self) {
        let (sender, receiver) = channel();
        self.model_loader = Some(receiver);
        self.state.set_status(Status::Busy("Loading model...".to_string()));

        let path = self.settings.model_path.clone();
        std::thread::spawn(move || {
            let _ = sender.send(load_predictor(&path));
        });
    }

    /// Load the image at `url`, then fetch its embedding from the backend.
    pub fn process_image_url(&mut self, url: String) {
        if url.is_empty() {
            self.state
                .set_status(Status::Error(AppError::ImageLoad("Please provide an image URL".to_string())));
            return;
        }

        let (sender, receiver) = channel();
        self.resource_loader = Some(receiver);
        self.state.set_status(Status::Busy("Loading image...".to_string()));

        let client = self.client.clone();
        let endpoint = self.settings.embedding_endpoint.clone();
        std::thread::spawn(move || {
            let image = media::load_image_url(&client, &url);
            let loaded = image.is_ok();
            if sender.send(LoadEvent::Image(image)).is_err() || !loaded {
                return;
            }
            let _ = sender.send(LoadEvent::Embedding(embedding::fetch_embedding(
                &client, &endpoint, &url,
            )));
        });
    }

    /// Load a local image and the precomputed `.npy` embedding next to it.
    pub fn open_image_file(&mut self, path: PathBuf) {
        let (sender, receiver) = channel();
        self.resource_loader = Some(receiver);
        self.state.set_status(Status::Busy("Loading image...".to_string()));

        std::thread::spawn(move || {
            let image = media::load_image_file(&path);
            let loaded = image.is_ok();
            if sender.send(LoadEvent::Image(image)).is_err() || !loaded {
                return;
            }

            let embedding_path = path.with_extension("npy");
            let embedding = if embedding_path.exists() {
                embedding::load_embedding_file(&embedding_path)
            } else {
                Err(AppError::EmbeddingFetch(format!(
                    "no precomputed embedding at {}, open one with File → Open Embedding...",
                    embedding_path.display()
                )))
            };
            let _ = sender.send(LoadEvent::Embedding(embedding));
        });
    }

    /// Load an embedding for the current image from a `.npy` file.
    pub fn open_embedding_file(&mut self, path: PathBuf) {
        let (sender, receiver) = channel();
        self.resource_loader = Some(receiver);
        self.state.set_status(Status::Busy("Loading embedding...".to_string()));

        std::thread::spawn(move || {
            let _ = sender.send(LoadEvent::Embedding(embedding::load_embedding_file(&path)));
        });
    }

    fn poll_model_loader(&mut self) {
        let Some(ref receiver) = self.model_loader else {
            return;
        };
        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(AppError::ModelLoad(
                "model loader stopped unexpectedly".to_string(),
            )),
        };
        self.model_loader = None;

        match result {
            Ok(predictor) => {
                self.model_error = None;
                self.worker = Some(InferenceWorker::spawn(predictor));
                self.state.set_model_ready(true);
                if self.state.is_busy() && self.resource_loader.is_none() {
                    self.state.set_status(Status::Idle);
                }
                log::info!("Model loaded successfully");
                self.run_model();
            }
            Err(e) => {
                self.state.set_model_ready(false);
                self.model_error = Some(e.clone());
                self.state.set_status(Status::Error(e));
            }
        }
    }

    fn poll_resource_loader(&mut self) {
        while let Some(ref receiver) = self.resource_loader {
            match receiver.try_recv() {
                Ok(event) => self.handle_load_event(event),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.resource_loader = None;
                    if self.state.is_busy() {
                        self.settle_status();
                    }
                }
            }
        }
    }

    fn handle_load_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Image(Ok(image)) => {
                self.reset_interaction();
                self.state.set_image(image);
                self.image_dirty = true;
                self.state.set_status(Status::Busy("Loading embedding...".to_string()));
            }
            LoadEvent::Image(Err(e)) => {
                self.reset_interaction();
                self.state.clear_image();
                self.image_dirty = true;
                self.state.set_status(Status::Error(e));
            }
            LoadEvent::Embedding(Ok(embedding)) => {
                self.state.set_embedding(Some(embedding));
                self.settle_status();
            }
            LoadEvent::Embedding(Err(e)) => {
                self.state.set_embedding(None);
                self.state.set_status(Status::Error(e));
            }
        }
    }

    /// Leave the busy state; a failed model load stays visible.
    fn settle_status(&mut self) {
        let status = match self.model_error {
            Some(ref e) => Status::Error(e.clone()),
            None => Status::Idle,
        };
        self.state.set_status(status);
    }

    /// Drop uncommitted input and make in-flight masks stale.
    fn reset_interaction(&mut self) {
        self.interaction.reset();
        self.requests.invalidate();
        self.pending_generation = None;
        self.clear_mask_next_frame = false;
    }

    fn poll_inference(&mut self) {
        while let Some(response) = self.worker.as_ref().and_then(InferenceWorker::try_recv) {
            self.apply_inference_response(response);
        }
    }

    fn apply_inference_response(&mut self, response: InferenceResponse) {
        if !self.requests.accepts(response.generation) {
            log::debug!("Discarding stale mask from request {}", response.generation);
            return;
        }
        self.pending_generation = None;

        match response.result {
            Ok(mask) => {
                self.state.set_mask(Some(mask));
                if matches!(self.state.status(), Status::Error(e) if !e.is_setup_failure()) {
                    self.state.set_status(Status::Idle);
                }
            }
            Err(e) => {
                log::warn!("Inference failed, keeping the previous mask: {}", e);
                self.state.set_status(Status::Error(e));
            }
        }
    }

    /// Run the model on the current prompts if everything is in place.
    fn run_model(&mut self) {
        if self.state.prompts().is_empty() {
            log::debug!("No input prompts provided");
            return;
        }
        let Some(ref worker) = self.worker else {
            log::debug!("Model is not ready");
            return;
        };
        let (Some(scale), Some(embedding)) = (self.state.scale(), self.state.embedding()) else {
            log::debug!("Image or embedding is not ready");
            return;
        };
        let Some(inputs) = build_model_inputs(self.state.prompts(), &scale) else {
            log::warn!("Skipping inference on invalid prompts");
            return;
        };

        let generation = self.requests.issue();
        let request = InferenceRequest {
            generation,
            embedding: Arc::clone(embedding),
            inputs,
        };
        match worker.submit(request) {
            Ok(()) => self.pending_generation = Some(generation),
            Err(e) => self.state.set_status(Status::Error(e)),
        }
    }

    fn handle_pointer_events(&mut self, events: Vec<PointerEvent>, now: Instant) {
        for event in events {
            let outcome = self.interaction.handle(event, now);
            self.apply_outcome(outcome);
        }
    }

    /// Send a hover move the throttle held back once it is due.
    fn flush_pending_hover(&mut self, now: Instant) {
        let outcome = self.interaction.flush(now);
        self.apply_outcome(outcome);
    }

    fn apply_outcome(&mut self, outcome: InteractionOutcome) {
        match outcome {
            InteractionOutcome::None => {}
            InteractionOutcome::Prompt(prompts) => {
                if let PromptSet::Box(ref b) = prompts {
                    if b.is_degenerate() {
                        log::debug!("Forwarding zero-area box at ({:.1}, {:.1})", b.x, b.y);
                    }
                }
                self.clear_mask_next_frame = false;
                self.state.set_prompts(prompts);
                self.run_model();
            }
            InteractionOutcome::ClearMask => {
                self.requests.invalidate();
                self.pending_generation = None;
                self.state.set_prompts(PromptSet::Empty);
                self.clear_mask_next_frame = true;
            }
        }
    }

    fn change_mode(&mut self, mode: Mode) {
        if self.interaction.set_mode(mode) {
            self.state.set_mode(mode);
            self.requests.invalidate();
            self.pending_generation = None;
            self.clear_mask_next_frame = false;
        }
    }

    fn apply_deferred_clear(&mut self) {
        if self.clear_mask_next_frame {
            self.clear_mask_next_frame = false;
            self.state.set_mask(None);
        }
    }

    fn has_pending_work(&self) -> bool {
        self.model_loader.is_some()
            || self.resource_loader.is_some()
            || self.pending_generation.is_some()
            || self.clear_mask_next_frame
    }

    /// Upload image and mask textures when their data changed.
    fn sync_textures(&mut self, ctx: &egui::Context) {
        if self.image_dirty {
            self.image_dirty = false;
            self.image_texture = self.state.image().map(|image_state| {
                let image = &image_state.image;
                let size = [image.width as usize, image.height as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &image.pixels);
                ctx.load_texture("loaded_image", color_image, egui::TextureOptions::LINEAR)
            });
        }

        if self.mask_texture_revision != self.state.mask_revision() {
            self.mask_texture_revision = self.state.mask_revision();
            self.mask_texture = self.state.mask().map(|mask| {
                let size = [mask.width() as usize, mask.height() as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, mask.pixels());
                ctx.load_texture("segmentation_mask", color_image, egui::TextureOptions::LINEAR)
            });
        }
    }
}

impl eframe::App for SamViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_model_loader();
        self.poll_resource_loader();
        self.apply_deferred_clear();
        self.poll_inference();
        self.flush_pending_hover(Instant::now());
        self.sync_textures(ctx);

        if self.has_pending_work() {
            ctx.request_repaint();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Image...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Images", &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"])
                            .pick_file()
                        {
                            self.open_image_file(path);
                        }
                        ui.close_menu();
                    }
                    let has_image = self.state.image().is_some();
                    if ui.add_enabled(has_image, egui::Button::new("Open Embedding...")).clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("NumPy array", &["npy"])
                            .pick_file()
                        {
                            self.open_embedding_file(path);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });

        // Image source
        let source_action = egui::TopBottomPanel::top("source")
            .show(ctx, |ui| source::show(ui, &mut self.image_url, &self.state))
            .inner;
        if let source::SourceAction::Process(url) = source_action {
            self.process_image_url(url);
        }

        // Toolbar
        let mut mode = self.interaction.mode();
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            toolbar::show(ui, &mut mode);
        });
        self.change_mode(mode);

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.interaction.cancel_drawing();
        }

        // Main canvas (center)
        let events = egui::CentralPanel::default()
            .show(ctx, |ui| {
                canvas::show(
                    ui,
                    &self.state,
                    canvas::CanvasTextures {
                        image: self.image_texture.as_ref(),
                        mask: self.mask_texture.as_ref(),
                    },
                    &self.interaction,
                    &mut self.pointer,
                    self.settings.mask_opacity,
                )
            })
            .inner;

        let now = Instant::now();
        self.handle_pointer_events(events, now);
        if let Some(delay) = self.interaction.pending_flush_in(now) {
            ctx.request_repaint_after(delay);
        }
    }
}
