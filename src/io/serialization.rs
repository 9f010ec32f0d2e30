// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Settings serialization and deserialization.
//!
//! This module handles reading and writing viewer settings in YAML
//! and JSON formats.

use crate::config::Settings;
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Export settings to YAML format.
pub fn export_yaml(settings: &Settings, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(settings)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Import settings from YAML format.
pub fn import_yaml(path: &Path) -> Result<Settings> {
    let yaml = std::fs::read_to_string(path)?;
    let settings = serde_yaml::from_str(&yaml)?;
    Ok(settings)
}

/// Import settings from JSON format.
pub fn import_json(path: &Path) -> Result<Settings> {
    let json = std::fs::read_to_string(path)?;
    let settings = serde_json::from_str(&json)?;
    Ok(settings)
}

/// Import settings, picking the format from the file extension.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let extension = path.extension().and_then(|s| s.to_str());
    let settings = match extension {
        Some("yaml") | Some("yml") => import_yaml(path),
        Some("json") => import_json(path),
        _ => bail!("Unsupported settings file extension: {:?}", extension),
    }
    .with_context(|| format!("Failed to load settings from {}", path.display()))?;

    log::info!("Loaded settings from {}", path.display());
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_export_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samview.yaml");
        let settings = Settings {
            hover_throttle_ms: 25,
            embedding_endpoint: "http://embed.local/embed".to_string(),
            ..Settings::default()
        };

        export_yaml(&settings, &path).unwrap();
        assert_eq!(load_settings(&path).unwrap(), settings);
    }

    #[test]
    fn test_json_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samview.json");
        std::fs::write(&path, r#"{"model_path": "weights/decoder.onnx", "mask_opacity": 0.6}"#)
            .unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.model_path, std::path::PathBuf::from("weights/decoder.onnx"));
        assert_eq!(settings.mask_opacity, 0.6);
        assert_eq!(settings.hover_throttle_ms, 15);
    }

    #[test]
    fn test_unknown_extension() {
        let err = load_settings(Path::new("settings.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("Unsupported"));
    }

    #[test]
    fn test_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yml");
        std::fs::write(&path, "hover_throttle_ms: [not, a, number]").unwrap();
        assert!(load_settings(&path).is_err());
    }
}
