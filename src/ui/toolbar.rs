// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and interaction mode selection UI.

use crate::interaction::Mode;

/// Display the toolbar with mode selection buttons.
pub fn show(ui: &mut egui::Ui, current_mode: &mut Mode) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Mode:");

        ui.separator();

        if ui.selectable_label(*current_mode == Mode::Hover, "⌖ Hover").clicked() {
            *current_mode = Mode::Hover;
        }

        if ui.selectable_label(*current_mode == Mode::Box, "▭ Box").clicked() {
            *current_mode = Mode::Box;
        }

        ui.separator();

        let mode_text = match current_mode {
            Mode::Hover => "Move the pointer over the image to segment the object under it",
            Mode::Box => "Drag a box around an object, press Escape to cancel",
        };

        ui.label(egui::RichText::new(mode_text).italics().weak());
    });
}
