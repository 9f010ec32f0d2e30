// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image source panel.
//!
//! Holds the image URL field and the button that loads the image and asks
//! the embedding backend for its embedding. Setup errors are shown here.

use crate::models::state::{AppState, Status};

/// Result of source panel interaction.
pub enum SourceAction {
    None,
    Process(String),
}

/// Display the source panel.
pub fn show(ui: &mut egui::Ui, image_url: &mut String, state: &AppState) -> SourceAction {
    let mut action = SourceAction::None;

    ui.horizontal(|ui| {
        ui.label("Image URL:");
        let response = ui.add(
            egui::TextEdit::singleline(image_url)
                .hint_text("Enter image URL")
                .desired_width(480.0),
        );
        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        let busy = state.is_busy();
        let label = if busy { "Loading..." } else { "Process Image" };
        let clicked = ui.add_enabled(!busy, egui::Button::new(label)).clicked();

        if (clicked || submitted) && !busy {
            action = SourceAction::Process(image_url.trim().to_string());
        }
    });

    if let Status::Error(e) = state.status() {
        if e.is_setup_failure() {
            ui.colored_label(egui::Color32::from_rgb(230, 120, 120), e.to_string());
        }
    }

    action
}
