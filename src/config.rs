// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Viewer settings.
//!
//! Settings start from defaults, are optionally replaced by a YAML or JSON
//! file, and finally overridden by command line flags.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// ONNX decoder model
    pub model_path: PathBuf,

    /// Embedding backend endpoint (multipart POST with `image_url`)
    pub embedding_endpoint: String,

    /// Minimum time between two hover prompts
    pub hover_throttle_ms: u64,

    /// Opacity of the mask overlay (0.0 - 1.0)
    pub mask_opacity: f32,

    /// Timeout for image and embedding requests
    pub request_timeout_secs: u64,

    /// Initial window size
    pub window_size: [f32; 2],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model/sam_onnx_example.onnx"),
            embedding_endpoint: "http://localhost:8000/embed".to_string(),
            hover_throttle_ms: 15,
            mask_opacity: 0.4,
            request_timeout_secs: 30,
            window_size: [1280.0, 720.0],
        }
    }
}

impl Settings {
    pub fn hover_interval(&self) -> Duration {
        Duration::from_millis(self.hover_throttle_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Clamp values that would make the viewer misbehave.
    pub fn sanitized(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.mask_opacity) {
            log::warn!("mask_opacity {} out of range, clamping", self.mask_opacity);
            self.mask_opacity = self.mask_opacity.clamp(0.0, 1.0);
        }
        if self.request_timeout_secs == 0 {
            log::warn!("request_timeout_secs must be positive, using default");
            self.request_timeout_secs = Settings::default().request_timeout_secs;
        }
        self
    }
}
