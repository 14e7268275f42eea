// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Height-field reconstruction: one point per downsampled pixel
//!
//! This is a single-image approximation, not geometric reconstruction:
//! pixel intensity is the elevation. The image is shrunk by an integer
//! factor first; that factor is the dominant cost-control knob of the
//! whole pipeline.

use image::imageops::FilterType;
use image::RgbImage;
use tracing::debug;

use crate::reconstruction::point_cloud::PointCloud;

/// Builds a colored point cloud from a (typically masked) image.
#[derive(Debug, Clone, Copy)]
pub struct HeightFieldBuilder {
    /// Integer shrink factor applied to both axes before reconstruction.
    pub downsample_factor: u32,
    /// When set, pixels whose resized color is exactly black are skipped.
    /// Off by default: background pixels become points near z = 0, matching
    /// the artifacts this node historically produced.
    pub drop_background: bool,
}

impl Default for HeightFieldBuilder {
    fn default() -> Self {
        Self {
            downsample_factor: 4,
            drop_background: false,
        }
    }
}

impl HeightFieldBuilder {
    pub fn new(downsample_factor: u32, drop_background: bool) -> Self {
        Self {
            downsample_factor: downsample_factor.max(1),
            drop_background,
        }
    }

    /// Convert the image into a point cloud.
    ///
    /// Geometry: `x` is the column index, `y` is `new_height - row` (image
    /// top is up; downstream renderers rely on this inversion), `z` is the
    /// pixel intensity mapped into `[0, 1]`.
    ///
    /// Colors: the resized pixel values normalized to `[0, 1]`, stored
    /// blue-first (b, g, r) to match the node's existing artifacts. Points
    /// and colors are both emitted in raster order, so index `i` in either
    /// slice refers to the same source pixel.
    pub fn build(&self, image: &RgbImage) -> PointCloud {
        let factor = self.downsample_factor.max(1);
        let new_width = (image.width() / factor).max(1);
        let new_height = (image.height() / factor).max(1);

        let resized = image::imageops::resize(image, new_width, new_height, FilterType::Triangle);

        let mut cloud = PointCloud::with_capacity((new_width * new_height) as usize);
        for row in 0..new_height {
            for col in 0..new_width {
                let [r, g, b] = resized.get_pixel(col, row).0;

                if self.drop_background && r == 0 && g == 0 && b == 0 {
                    continue;
                }

                // Rec. 601 luma, same weighting the legacy grayscale used
                let intensity =
                    0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);

                cloud.push(
                    [col as f32, (new_height - row) as f32, intensity / 255.0],
                    // Blue-first channel order, see DESIGN.md D4
                    [
                        f32::from(b) / 255.0,
                        f32::from(g) / 255.0,
                        f32::from(r) / 255.0,
                    ],
                );
            }
        }

        debug!(
            "Height field: {}x{} -> {}x{} grid, {} points",
            image.width(),
            image.height(),
            new_width,
            new_height,
            cloud.len()
        );

        cloud
    }
}
