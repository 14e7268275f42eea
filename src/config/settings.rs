// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node settings, read from environment variables with defaults

use std::env;
use std::path::PathBuf;

use tracing::warn;

/// Knobs for the reconstruction stages.
///
/// These are the only configuration the pipeline core consumes.
#[derive(Debug, Clone, Copy)]
pub struct ReconstructionConfig {
    /// Integer shrink factor for the height field (both axes)
    pub downsample_factor: u32,
    /// Voxel edge length for point cloud reduction
    pub voxel_size: f32,
    /// Drop exactly-black points instead of keeping background geometry
    pub drop_background: bool,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            downsample_factor: 4,
            voxel_size: 0.08,
            drop_background: false,
        }
    }
}

/// Full node configuration
#[derive(Debug, Clone)]
pub struct NodeSettings {
    /// HTTP API port
    pub api_port: u16,
    /// Shared directory for uploads and artifacts
    pub upload_dir: PathBuf,
    /// Captioning sidecar endpoint (OpenAI-compatible)
    pub captioner_endpoint: String,
    /// Captioning model name
    pub captioner_model: String,
    /// Segmentation sidecar endpoint
    pub segmenter_endpoint: String,
    /// Segmentation model name
    pub segmenter_model: String,
    /// Reconstruction knobs
    pub reconstruction: ReconstructionConfig,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            api_port: 8080,
            upload_dir: PathBuf::from("./static/uploads"),
            captioner_endpoint: "http://localhost:8081".to_string(),
            captioner_model: "paligemma-3b".to_string(),
            segmenter_endpoint: "http://localhost:8082".to_string(),
            segmenter_model: "sam-vit-b".to_string(),
            reconstruction: ReconstructionConfig::default(),
        }
    }
}

impl NodeSettings {
    /// Build settings from environment variables, falling back to defaults.
    ///
    /// Unparseable numeric values fall back with a warning rather than
    /// aborting startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_port = parse_env("API_PORT", defaults.api_port);
        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.upload_dir);

        let downsample_factor =
            parse_env("DOWNSAMPLE_FACTOR", defaults.reconstruction.downsample_factor).max(1);

        let mut voxel_size = parse_env("VOXEL_SIZE", defaults.reconstruction.voxel_size);
        if voxel_size <= 0.0 {
            warn!("VOXEL_SIZE must be positive, using default");
            voxel_size = defaults.reconstruction.voxel_size;
        }

        let drop_background = env::var("DROP_BACKGROUND")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(defaults.reconstruction.drop_background);

        Self {
            api_port,
            upload_dir,
            captioner_endpoint: env::var("CAPTIONER_ENDPOINT")
                .unwrap_or(defaults.captioner_endpoint),
            captioner_model: env::var("CAPTIONER_MODEL").unwrap_or(defaults.captioner_model),
            segmenter_endpoint: env::var("SEGMENTER_ENDPOINT")
                .unwrap_or(defaults.segmenter_endpoint),
            segmenter_model: env::var("SEGMENTER_MODEL").unwrap_or(defaults.segmenter_model),
            reconstruction: ReconstructionConfig {
                downsample_factor,
                voxel_size,
                drop_background,
            },
        }
    }
}

fn parse_env<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!("Invalid {} value '{}', using default", name, value);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconstruction_defaults() {
        let config = ReconstructionConfig::default();
        assert_eq!(config.downsample_factor, 4);
        assert!((config.voxel_size - 0.08).abs() < 1e-6);
        assert!(!config.drop_background);
    }

    #[test]
    fn test_node_defaults() {
        let settings = NodeSettings::default();
        assert_eq!(settings.api_port, 8080);
        assert_eq!(settings.upload_dir, PathBuf::from("./static/uploads"));
        assert_eq!(settings.captioner_endpoint, "http://localhost:8081");
        assert_eq!(settings.segmenter_model, "sam-vit-b");
    }
}
