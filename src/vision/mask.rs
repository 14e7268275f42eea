// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Background removal: seed-point segmentation and mask application
//!
//! The seed heuristic is fixed: one positive point at the geometric center
//! of the image. Of the candidate masks returned by the capability, the
//! highest-confidence one is selected (the list is score-sorted, see
//! [`crate::vision::capabilities::Segmenter`]).

use std::sync::Arc;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use thiserror::Error;
use tracing::debug;

use crate::vision::capabilities::Segmenter;

/// Errors from the mask extraction stage
#[derive(Debug, Error)]
pub enum SegmentationError {
    #[error("Segmentation capability failed: {0}")]
    Capability(String),

    #[error("Segmentation returned no masks")]
    EmptyMaskSet,

    #[error("Mask dimensions {mask_width}x{mask_height} do not match image {width}x{height}")]
    DimensionMismatch {
        mask_width: u32,
        mask_height: u32,
        width: u32,
        height: u32,
    },
}

/// The single pixel coordinate handed to the segmentation capability.
///
/// Invariant: `0 <= x < width`, `0 <= y < height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedPoint {
    pub x: u32,
    pub y: u32,
}

impl SeedPoint {
    /// Geometric center of a `width x height` image (integer division).
    pub fn center(width: u32, height: u32) -> Self {
        Self {
            x: width / 2,
            y: height / 2,
        }
    }
}

/// Extracts the foreground of a photograph via seed-point segmentation.
pub struct MaskExtractor {
    segmenter: Arc<dyn Segmenter>,
}

impl MaskExtractor {
    pub fn new(segmenter: Arc<dyn Segmenter>) -> Self {
        Self { segmenter }
    }

    /// Segment the image and zero every pixel outside the foreground mask.
    ///
    /// Returns the masked image and the mask itself, both the same size as
    /// the input. An all-background mask is a valid result (the masked
    /// image is then fully black); only an empty candidate list or a
    /// capability failure is an error.
    pub async fn extract(
        &self,
        image: &DynamicImage,
    ) -> Result<(RgbImage, GrayImage), SegmentationError> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let seed = SeedPoint::center(width, height);

        let png = encode_png(image)
            .map_err(|e| SegmentationError::Capability(format!("failed to encode image: {}", e)))?;

        let masks = self
            .segmenter
            .segment(&png, "png", seed)
            .await
            .map_err(|e| SegmentationError::Capability(e.to_string()))?;

        // Highest-confidence candidate; the list is sorted by the client
        let best = masks.first().ok_or(SegmentationError::EmptyMaskSet)?;

        let (mask_width, mask_height) = best.mask.dimensions();
        if (mask_width, mask_height) != (width, height) {
            return Err(SegmentationError::DimensionMismatch {
                mask_width,
                mask_height,
                width,
                height,
            });
        }

        debug!(
            "Selected mask with score {:.3} of {} candidates (seed: {},{})",
            best.score,
            masks.len(),
            seed.x,
            seed.y
        );

        let masked = apply_mask(&rgb, &best.mask);
        Ok((masked, best.mask.clone()))
    }
}

/// Zero every channel of every pixel where the mask is background.
///
/// Panics in debug builds if dimensions differ; callers validate first.
pub fn apply_mask(image: &RgbImage, mask: &GrayImage) -> RgbImage {
    debug_assert_eq!(image.dimensions(), mask.dimensions());

    let mut out = image.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        if mask.get_pixel(x, y).0[0] == 0 {
            pixel.0 = [0, 0, 0];
        }
    }
    out
}

fn encode_png(image: &DynamicImage) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::capabilities::RankedMask;
    use anyhow::Result;
    use async_trait::async_trait;
    use image::{Luma, Rgb};

    struct StaticSegmenter {
        masks: Vec<RankedMask>,
    }

    #[async_trait]
    impl Segmenter for StaticSegmenter {
        async fn segment(
            &self,
            _image_bytes: &[u8],
            _format: &str,
            _seed: SeedPoint,
        ) -> Result<Vec<RankedMask>> {
            Ok(self.masks.clone())
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn half_mask(width: u32, height: u32) -> GrayImage {
        // Left half foreground, right half background
        GrayImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn test_seed_point_center() {
        assert_eq!(SeedPoint::center(640, 480), SeedPoint { x: 320, y: 240 });
        assert_eq!(SeedPoint::center(7, 5), SeedPoint { x: 3, y: 2 });
        assert_eq!(SeedPoint::center(1, 1), SeedPoint { x: 0, y: 0 });
    }

    #[test]
    fn test_apply_mask_zeroes_background() {
        let image = RgbImage::from_pixel(4, 4, Rgb([200, 100, 50]));
        let mask = half_mask(4, 4);
        let masked = apply_mask(&image, &mask);

        assert_eq!(masked.dimensions(), image.dimensions());
        assert_eq!(masked.get_pixel(0, 0).0, [200, 100, 50]);
        assert_eq!(masked.get_pixel(3, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_apply_mask_all_background() {
        let image = RgbImage::from_pixel(3, 3, Rgb([10, 20, 30]));
        let mask = GrayImage::from_pixel(3, 3, Luma([0]));
        let masked = apply_mask(&image, &mask);
        assert!(masked.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[tokio::test]
    async fn test_extract_selects_highest_score() {
        let good = RankedMask {
            mask: GrayImage::from_pixel(4, 4, Luma([255])),
            score: 0.9,
        };
        let bad = RankedMask {
            mask: GrayImage::from_pixel(4, 4, Luma([0])),
            score: 0.1,
        };
        let extractor = MaskExtractor::new(Arc::new(StaticSegmenter {
            masks: vec![good, bad],
        }));

        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([50, 60, 70])));
        let (masked, mask) = extractor.extract(&image).await.unwrap();

        // Full-frame foreground mask keeps every pixel
        assert!(masked.pixels().all(|p| p.0 == [50, 60, 70]));
        assert!(mask.pixels().all(|p| p.0[0] == 255));
    }

    #[tokio::test]
    async fn test_extract_empty_mask_set_fails() {
        let extractor = MaskExtractor::new(Arc::new(StaticSegmenter { masks: vec![] }));
        let image = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let err = extractor.extract(&image).await.unwrap_err();
        assert!(matches!(err, SegmentationError::EmptyMaskSet));
    }

    #[tokio::test]
    async fn test_extract_all_background_mask_is_not_an_error() {
        let empty = RankedMask {
            mask: GrayImage::from_pixel(2, 2, Luma([0])),
            score: 0.5,
        };
        let extractor = MaskExtractor::new(Arc::new(StaticSegmenter { masks: vec![empty] }));
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([9, 9, 9])));

        let (masked, _mask) = extractor.extract(&image).await.unwrap();
        assert!(masked.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[tokio::test]
    async fn test_extract_dimension_mismatch_fails() {
        let wrong = RankedMask {
            mask: GrayImage::from_pixel(8, 8, Luma([255])),
            score: 0.7,
        };
        let extractor = MaskExtractor::new(Arc::new(StaticSegmenter { masks: vec![wrong] }));
        let image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));

        let err = extractor.extract(&image).await.unwrap_err();
        assert!(matches!(err, SegmentationError::DimensionMismatch { .. }));
    }
}
