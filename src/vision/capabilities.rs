// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Capability seam for the two inference collaborators
//!
//! The pipeline never talks to a model directly; it is handed a
//! [`VisionCapabilities`] built once at process start and shared read-only
//! across requests. Tests substitute the traits with in-process fakes.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use image::GrayImage;

use crate::config::NodeSettings;
use crate::vision::caption::CaptionClient;
use crate::vision::mask::SeedPoint;
use crate::vision::segmentation::SegmentationClient;

/// A single predicted foreground mask with its confidence score.
///
/// Masks are aligned 1:1 with the source image: same width and height,
/// one 8-bit channel where 255 marks foreground and 0 background.
#[derive(Debug, Clone)]
pub struct RankedMask {
    pub mask: GrayImage,
    pub score: f32,
}

/// Captioning capability: image in, free-text description out.
#[async_trait]
pub trait Captioner: Send + Sync {
    /// Generate a short description for the given encoded image.
    ///
    /// An empty description is treated as a capability failure by the
    /// implementation, not by callers.
    async fn caption(&self, image_bytes: &[u8], format: &str) -> Result<String>;

    /// Check whether the capability is reachable.
    async fn health_check(&self) -> bool;
}

/// Segmentation capability: image plus one positive seed point in, a
/// confidence-ranked list of candidate foreground masks out.
///
/// The returned list is sorted by descending score; callers that take the
/// first element are selecting the highest-confidence mask, not an
/// arbitrary one.
#[async_trait]
pub trait Segmenter: Send + Sync {
    async fn segment(
        &self,
        image_bytes: &[u8],
        format: &str,
        seed: SeedPoint,
    ) -> Result<Vec<RankedMask>>;

    /// Check whether the capability is reachable.
    async fn health_check(&self) -> bool;
}

/// The node's inference collaborators, constructed once at startup.
#[derive(Clone)]
pub struct VisionCapabilities {
    captioner: Arc<dyn Captioner>,
    segmenter: Arc<dyn Segmenter>,
}

impl VisionCapabilities {
    pub fn new(captioner: Arc<dyn Captioner>, segmenter: Arc<dyn Segmenter>) -> Self {
        Self {
            captioner,
            segmenter,
        }
    }

    /// Build sidecar-backed capabilities from node settings.
    pub fn from_settings(settings: &NodeSettings) -> Result<Self> {
        let captioner = CaptionClient::new(&settings.captioner_endpoint, &settings.captioner_model)?;
        let segmenter =
            SegmentationClient::new(&settings.segmenter_endpoint, &settings.segmenter_model)?;

        Ok(Self {
            captioner: Arc::new(captioner),
            segmenter: Arc::new(segmenter),
        })
    }

    pub fn captioner(&self) -> Arc<dyn Captioner> {
        self.captioner.clone()
    }

    pub fn segmenter(&self) -> Arc<dyn Segmenter> {
        self.segmenter.clone()
    }

    /// Probe both sidecars, returning (captioner, segmenter) reachability.
    pub async fn health_check(&self) -> (bool, bool) {
        (
            self.captioner.health_check().await,
            self.segmenter.health_check().await,
        )
    }
}
