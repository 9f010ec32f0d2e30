// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image canvas with mask overlay.
//!
//! This module draws the loaded image fitted to the available space, the
//! current mask on top of it and the live box preview, and translates raw
//! egui pointer input into [`PointerEvent`]s in natural image pixels.

use crate::interaction::{Interaction, PointerEvent};
use crate::models::prompt::{BoxPrompt, PromptSet};
use crate::models::state::{AppState, Status};
use crate::util::geometry::{display_to_natural, to_natural};

/// Pointer state carried between frames.
#[derive(Debug, Default)]
pub struct PointerTracker {
    inside: bool,
    last: Option<(f32, f32)>,
}

/// Pointer input for one frame, already in natural image coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerFrame {
    /// Pointer position while it is over the image
    pub hover: Option<(f32, f32)>,
    /// Latest pointer position clamped to the image, wherever the pointer is
    pub latest: Option<(f32, f32)>,
    pub pressed: bool,
    pub released: bool,
}

impl PointerTracker {
    /// Turn one frame of pointer input into events, in press/move/release order.
    pub fn collect(&mut self, frame: PointerFrame, drawing: bool) -> Vec<PointerEvent> {
        let mut events = Vec::new();

        let pressed_inside = frame.pressed && frame.hover.is_some();
        if pressed_inside {
            if let Some((x, y)) = frame.hover {
                events.push(PointerEvent::Pressed(x, y));
            }
        }

        // An active drag keeps tracking the pointer outside the image
        let tracking = drawing || pressed_inside;
        let position = if tracking { frame.latest } else { frame.hover };
        if let Some((x, y)) = position {
            if self.last != position {
                events.push(PointerEvent::Moved(x, y));
            }
        }

        if frame.released && tracking {
            if let Some((x, y)) = frame.latest {
                events.push(PointerEvent::Released(x, y));
            }
        }

        if self.inside && frame.hover.is_none() && !tracking {
            events.push(PointerEvent::Left);
        }

        self.inside = frame.hover.is_some();
        self.last = position;
        events
    }
}

/// Textures the canvas draws.
pub struct CanvasTextures<'a> {
    pub image: Option<&'a egui::TextureHandle>,
    pub mask: Option<&'a egui::TextureHandle>,
}

/// Display the canvas and return the pointer events of this frame.
pub fn show(
    ui: &mut egui::Ui,
    state: &AppState,
    textures: CanvasTextures<'_>,
    interaction: &Interaction,
    tracker: &mut PointerTracker,
    mask_opacity: f32,
) -> Vec<PointerEvent> {
    let mut events = Vec::new();
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available_size = ui.available_size();

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        let (Some(texture), Some(image_state)) = (textures.image, state.image()) else {
            show_placeholder(ui, state);
            return;
        };

        let img_width = image_state.image.width as f32;
        let img_height = image_state.image.height as f32;

        // Fit the image into the available space, keeping its aspect ratio
        let available = ui.available_size();
        let img_aspect = img_width / img_height;
        let available_aspect = available.x / available.y;
        let (display_width, display_height) = if img_aspect > available_aspect {
            (available.x, available.x / img_aspect)
        } else {
            (available.y * img_aspect, available.y)
        };

        let x_offset = (available.x - display_width) / 2.0;
        let y_offset = (available.y - display_height) / 2.0;
        let image_rect = egui::Rect::from_min_size(
            ui.min_rect().min + egui::vec2(x_offset, y_offset),
            egui::vec2(display_width, display_height),
        );
        let full_uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

        ui.painter()
            .image(texture.id(), image_rect, full_uv, egui::Color32::WHITE);

        if let Some(mask) = textures.mask {
            ui.painter().image(
                mask.id(),
                image_rect,
                full_uv,
                egui::Color32::WHITE.gamma_multiply(mask_opacity),
            );
        }

        // Pointer handling
        let response = ui.allocate_rect(image_rect, egui::Sense::click_and_drag());
        let ratio = display_to_natural(img_width, image_rect.width());
        let to_image = |pos: egui::Pos2| {
            let offset = pos - image_rect.min;
            to_natural(offset.x, offset.y, ratio)
        };

        let frame = ui.input(|i| PointerFrame {
            hover: response
                .hover_pos()
                .filter(|pos| image_rect.contains(*pos))
                .map(to_image),
            latest: i
                .pointer
                .latest_pos()
                .map(|pos| to_image(image_rect.clamp(pos))),
            pressed: i.pointer.primary_pressed(),
            released: i.pointer.primary_released(),
        });
        events = tracker.collect(frame, interaction.is_drawing());

        // Prompt markers
        let painter = ui.painter();
        let to_screen = |x: f32, y: f32| image_rect.min + egui::vec2(x / ratio, y / ratio);

        if let Some(preview) = interaction.preview() {
            draw_box(painter, &preview, to_screen, egui::Color32::LIGHT_BLUE);
        }
        if let PromptSet::Box(committed) = state.prompts() {
            if !interaction.is_drawing() {
                draw_box(painter, committed, to_screen, egui::Color32::YELLOW);
            }
        }
    });

    show_status_bar(ui, state);

    events
}

fn draw_box(
    painter: &egui::Painter,
    bbox: &BoxPrompt,
    to_screen: impl Fn(f32, f32) -> egui::Pos2,
    color: egui::Color32,
) {
    let [top_left, bottom_right] = bbox.corner_points();
    let rect = egui::Rect::from_min_max(
        to_screen(top_left.x, top_left.y),
        to_screen(bottom_right.x, bottom_right.y),
    );
    painter.rect_stroke(rect, 0.0, egui::Stroke::new(2.0, color));
    for corner in [rect.min, rect.max] {
        painter.circle_filled(corner, 4.0, egui::Color32::WHITE);
        painter.circle_stroke(corner, 4.0, egui::Stroke::new(1.0, egui::Color32::BLACK));
    }
}

fn show_placeholder(ui: &mut egui::Ui, state: &AppState) {
    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            ui.heading(
                egui::RichText::new("SAMVIEW")
                    .size(32.0)
                    .color(egui::Color32::from_gray(200)),
            );
            ui.label(
                egui::RichText::new("Interactive Segmentation Viewer")
                    .size(14.0)
                    .color(egui::Color32::from_gray(150)),
            );
            ui.add_space(20.0);
            if let Status::Busy(message) = state.status() {
                ui.spinner();
                ui.label(egui::RichText::new(message).color(egui::Color32::from_gray(200)));
            } else {
                ui.label(
                    egui::RichText::new("Enter an image URL or open a local image to begin")
                        .color(egui::Color32::from_gray(180)),
                );
            }
        });
    });
}

fn show_status_bar(ui: &mut egui::Ui, state: &AppState) {
    ui.separator();
    ui.horizontal(|ui| {
        ui.label(format!("Mode: {:?}", state.mode()));
        ui.separator();

        match state.image() {
            Some(image_state) => {
                ui.label(format!(
                    "{}x{} (scale {:.3})",
                    image_state.image.width, image_state.image.height, image_state.scale.sam_scale
                ));
            }
            None => {
                ui.label("No image loaded");
            }
        }
        ui.separator();

        ui.label(if state.model_ready() { "Model ready" } else { "Model not loaded" });
        ui.separator();

        ui.label(if state.embedding().is_some() { "Embedding ready" } else { "No embedding" });

        if let Some(mask) = state.mask() {
            ui.separator();
            ui.label(format!("Mask {:.1}%", mask.coverage() * 100.0));
        }

        match state.status() {
            Status::Busy(message) => {
                ui.separator();
                ui.spinner();
                ui.label(message);
            }
            Status::Error(e) if !e.is_setup_failure() => {
                ui.separator();
                ui.colored_label(egui::Color32::from_rgb(230, 120, 120), e.to_string());
            }
            _ => {}
        }
    });
}
