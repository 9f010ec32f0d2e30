// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! SAMVIEW - Interactive Segmentation Viewer
//!
//! A cross-platform desktop application that segments objects in an image
//! as the pointer hovers over them, or inside a box drawn around them.

mod app;
mod config;
mod error;
mod inference;
mod interaction;
mod io;
mod models;
mod ui;
mod util;

use anyhow::{Context, Result};
use app::SamViewApp;
use clap::Parser;
use config::Settings;
use std::path::PathBuf;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "samview", version, about = "Interactive Segmentation Viewer")]
struct Args {
    /// Settings file (YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// ONNX decoder model
    #[arg(long)]
    model: Option<PathBuf>,

    /// Embedding backend endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Minimum milliseconds between hover prompts
    #[arg(long)]
    throttle_ms: Option<u64>,

    /// Image URL to process on start-up
    #[arg(long)]
    image_url: Option<String>,

    /// Write the effective settings to a YAML file and exit
    #[arg(long)]
    save_config: Option<PathBuf>,
}

impl Args {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match self.config {
            Some(ref path) => io::serialization::load_settings(path)?,
            None => Settings::default(),
        };

        if let Some(ref model) = self.model {
            settings.model_path = model.clone();
        }
        if let Some(ref endpoint) = self.endpoint {
            settings.embedding_endpoint = endpoint.clone();
        }
        if let Some(throttle_ms) = self.throttle_ms {
            settings.hover_throttle_ms = throttle_ms;
        }

        Ok(settings.sanitized())
    }
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();
    let settings = args.settings()?;

    if let Some(ref path) = args.save_config {
        io::serialization::export_yaml(&settings, path)
            .with_context(|| format!("Failed to save settings to {}", path.display()))?;
        log::info!("Settings written to {}", path.display());
        return Ok(());
    }

    let mut app = SamViewApp::new(settings.clone())?;
    if let Some(url) = args.image_url {
        app.process_image_url(url);
    }

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(settings.window_size)
            .with_min_inner_size([800.0, 600.0])
            .with_title("SAMVIEW - Interactive Segmentation Viewer"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native("SAMVIEW", options, Box::new(move |_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
