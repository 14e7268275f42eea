// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module
//!
//! This module provides:
//! - Image loading and format detection
//! - Captioning via an OpenAI-compatible sidecar
//! - Seed-point segmentation via a sidecar returning ranked masks
//!
//! Both capabilities are behind traits so the pipeline can be tested
//! without network access.

pub mod capabilities;
pub mod caption;
pub mod image_utils;
pub mod mask;
pub mod segmentation;

pub use capabilities::{Captioner, RankedMask, Segmenter, VisionCapabilities};
pub use caption::CaptionClient;
pub use image_utils::{
    decode_image_bytes, detect_format, format_to_extension, load_image, read_image_bytes,
    ImageError, ImageInfo,
};
pub use mask::{apply_mask, MaskExtractor, SeedPoint, SegmentationError};
pub use segmentation::SegmentationClient;
