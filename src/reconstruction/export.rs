// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Dual-format asset export
//!
//! Every pipeline run produces two artifacts from the same reduced cloud:
//! a lossless PLY (`{base}_3d.ply`) and a web-renderable GLB
//! (`{base}_3d.glb`). Both files carry the identical point ordering and
//! pairing; they differ only in color precision.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::reconstruction::error::{ExportError, ExportResult};
use crate::reconstruction::glb::save_point_cloud_glb;
use crate::reconstruction::ply::save_point_cloud_ply;
use crate::reconstruction::point_cloud::PointCloud;

/// Artifact suffix shared by both exports
const ASSET_SUFFIX: &str = "_3d";

/// The two files written for one pipeline run
#[derive(Debug, Clone)]
pub struct ExportedAssets {
    pub ply_path: PathBuf,
    pub glb_path: PathBuf,
}

impl ExportedAssets {
    /// File name of the PLY artifact
    pub fn ply_filename(&self) -> String {
        file_name(&self.ply_path)
    }

    /// File name of the GLB artifact
    pub fn glb_filename(&self) -> String {
        file_name(&self.glb_path)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Writes reduced point clouds to the shared output directory.
pub struct AssetExporter {
    output_dir: PathBuf,
}

impl AssetExporter {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Export `cloud` as `{base_name}_3d.ply` and `{base_name}_3d.glb`.
    ///
    /// A rerun with the same base name overwrites the prior artifacts;
    /// there is no versioning.
    ///
    /// # Errors
    ///
    /// * [`ExportError::EmptyCloud`] - zero points
    /// * [`ExportError::DirectoryNotWritable`] - output directory missing
    /// * [`ExportError::Io`] - write failure
    pub fn export(&self, cloud: &PointCloud, base_name: &str) -> ExportResult<ExportedAssets> {
        if cloud.is_empty() {
            return Err(ExportError::EmptyCloud);
        }
        if !self.output_dir.is_dir() {
            return Err(ExportError::DirectoryNotWritable {
                path: self.output_dir.clone(),
            });
        }

        let ply_path = self
            .output_dir
            .join(format!("{base_name}{ASSET_SUFFIX}.ply"));
        let glb_path = self
            .output_dir
            .join(format!("{base_name}{ASSET_SUFFIX}.glb"));

        save_point_cloud_ply(cloud, &ply_path)?;
        save_point_cloud_glb(cloud, &glb_path)?;

        info!(
            "Exported {} points: {} / {}",
            cloud.len(),
            ply_path.display(),
            glb_path.display()
        );

        Ok(ExportedAssets { ply_path, glb_path })
    }
}
