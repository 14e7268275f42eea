// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image-to-3D reconstruction
//!
//! The pipeline's algorithmic core: a masked photograph becomes a colored
//! height-field point cloud, the cloud is voxel-reduced, and the result is
//! exported as PLY (lossless) and GLB (8-bit color) artifacts.

pub mod error;
pub mod export;
pub mod glb;
pub mod height_field;
pub mod ply;
pub mod point_cloud;
pub mod voxel;

pub use error::{ExportError, ExportResult};
pub use export::{AssetExporter, ExportedAssets};
pub use glb::{load_point_cloud_glb, save_point_cloud_glb};
pub use height_field::HeightFieldBuilder;
pub use ply::{load_point_cloud_ply, save_point_cloud_ply};
pub use point_cloud::PointCloud;
pub use voxel::voxel_down_sample;
