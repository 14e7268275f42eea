// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Segmentation sidecar client
//!
//! Sends an image plus a single positive seed point and receives candidate
//! foreground masks. The wire contract is explicit about ranking: every
//! mask carries a confidence score, and this client returns the list
//! sorted by descending score regardless of the order the sidecar used.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use tracing::{debug, info};

use crate::vision::capabilities::{RankedMask, Segmenter};
use crate::vision::mask::SeedPoint;

// --- Wire types ---

#[derive(serde::Serialize)]
struct SegmentRequest {
    model: String,
    /// Base64-encoded image
    image: String,
    /// Image format hint (png, jpg, ...)
    format: String,
    point: WirePoint,
    /// 1 = positive (foreground) point
    label: u8,
}

#[derive(serde::Serialize)]
struct WirePoint {
    x: u32,
    y: u32,
}

#[derive(serde::Deserialize)]
struct SegmentResponse {
    masks: Vec<WireMask>,
}

#[derive(serde::Deserialize)]
struct WireMask {
    /// Base64-encoded single-channel PNG, 255 = foreground
    mask: String,
    score: f32,
}

/// Client for calling a segmentation sidecar service
pub struct SegmentationClient {
    client: Client,
    endpoint: String,
    model_name: String,
}

impl SegmentationClient {
    /// Create a new segmentation client
    pub fn new(endpoint: &str, model_name: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "Segmentation client configured: endpoint={}, model={}",
            endpoint, model_name
        );

        Ok(Self {
            client,
            endpoint,
            model_name: model_name.to_string(),
        })
    }

    /// Get the model name
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn decode_mask(encoded: &str) -> Result<image::GrayImage> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| anyhow!("invalid base64 mask: {}", e))?;
        let img = image::load_from_memory(&bytes)
            .map_err(|e| anyhow!("failed to decode mask image: {}", e))?;
        Ok(img.into_luma8())
    }
}

#[async_trait]
impl Segmenter for SegmentationClient {
    async fn segment(
        &self,
        image_bytes: &[u8],
        format: &str,
        seed: SeedPoint,
    ) -> Result<Vec<RankedMask>> {
        let start = std::time::Instant::now();

        let request = SegmentRequest {
            model: self.model_name.clone(),
            image: STANDARD.encode(image_bytes),
            format: format.to_string(),
            point: WirePoint {
                x: seed.x,
                y: seed.y,
            },
            label: 1,
        };

        let response = self
            .client
            .post(format!("{}/v1/segment", self.endpoint))
            .json(&request)
            .send()
            .await?;

        let segment_response: SegmentResponse = response.json().await?;

        let mut masks = Vec::with_capacity(segment_response.masks.len());
        for wire in &segment_response.masks {
            masks.push(RankedMask {
                mask: Self::decode_mask(&wire.mask)?,
                score: wire.score,
            });
        }

        // Enforce the documented contract: highest confidence first
        masks.sort_by(|a, b| b.score.total_cmp(&a.score));

        info!(
            "Segmentation complete: {} masks, {}ms (model: {})",
            masks.len(),
            start.elapsed().as_millis(),
            self.model_name
        );

        Ok(masks)
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.endpoint))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("Segmentation health check failed: {}", e);
                false
            }
        }
    }
}
