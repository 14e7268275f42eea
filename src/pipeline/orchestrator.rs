// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pipeline orchestration
//!
//! One upload, one synchronous chain:
//! loaded -> captioned -> masked -> reconstructed -> exported -> completed.
//! A failure at any stage aborts the run (no retries, no cleanup of
//! artifacts written by earlier stages) and surfaces as one
//! [`PipelineError`]. All intermediate values (mask, masked image, clouds)
//! live and die inside [`PipelineOrchestrator::process`]; only artifacts
//! and the result record are externally visible.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ReconstructionConfig;
use crate::pipeline::error::{PipelineError, PipelineStage};
use crate::reconstruction::{voxel_down_sample, AssetExporter, ExportError, HeightFieldBuilder};
use crate::storage::UploadStore;
use crate::vision::{
    decode_image_bytes, format_to_extension, read_image_bytes, Captioner, MaskExtractor,
    VisionCapabilities,
};

/// Terminal output of a successful pipeline run.
///
/// `model_file` references the GLB artifact only; the PLY artifact is
/// written alongside it but not part of the result record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// Free-text caption of the uploaded photograph
    pub description: String,
    /// File name of the foreground-only image artifact
    pub segmented_image: String,
    /// File name of the renderable 3D artifact
    pub model_file: String,
}

/// Sequences the five pipeline stages over one uploaded image.
pub struct PipelineOrchestrator {
    captioner: Arc<dyn Captioner>,
    mask_extractor: MaskExtractor,
    height_field: HeightFieldBuilder,
    voxel_size: f32,
    exporter: AssetExporter,
    store: UploadStore,
}

impl PipelineOrchestrator {
    pub fn new(
        capabilities: &VisionCapabilities,
        config: ReconstructionConfig,
        store: UploadStore,
    ) -> Self {
        Self {
            captioner: capabilities.captioner(),
            mask_extractor: MaskExtractor::new(capabilities.segmenter()),
            height_field: HeightFieldBuilder::new(
                config.downsample_factor,
                config.drop_background,
            ),
            voxel_size: config.voxel_size,
            exporter: AssetExporter::new(store.root()),
            store,
        }
    }

    /// Run the full pipeline over a file already persisted in the upload
    /// directory.
    pub async fn process(
        &self,
        source_filename: &str,
    ) -> Result<ProcessingResult, PipelineError> {
        // Stage 1: load
        let source_path = self.store.path_for(source_filename);
        let bytes = read_image_bytes(&source_path)?;
        let (image, image_info) = decode_image_bytes(&bytes)?;
        self.enter(PipelineStage::Loaded, source_filename);

        // Stage 2: caption the raw photograph
        let format = format_to_extension(image_info.format);
        let description = self
            .captioner
            .caption(&bytes, format)
            .await
            .map_err(|e| PipelineError::Caption(e.to_string()))?;
        self.enter(PipelineStage::Captioned, source_filename);

        // Stage 3: segment and persist the foreground-only image
        let (masked, _mask) = self.mask_extractor.extract(&image).await?;
        let segmented_filename = UploadStore::segmented_filename(source_filename);
        let segmented_path = self.store.path_for(&segmented_filename);
        masked.save(&segmented_path).map_err(|e| {
            PipelineError::Export(ExportError::ArtifactWrite {
                path: segmented_path.clone(),
                message: e.to_string(),
            })
        })?;
        self.enter(PipelineStage::Masked, source_filename);

        // Stage 4: height field + voxel reduction
        let cloud = self.height_field.build(&masked);
        let reduced = voxel_down_sample(&cloud, self.voxel_size);
        if reduced.is_empty() {
            return Err(PipelineError::Geometry);
        }
        self.enter(PipelineStage::Reconstructed, source_filename);

        // Stage 5: dual-format export
        let base_name = UploadStore::base_name(source_filename);
        let assets = self.exporter.export(&reduced, &base_name)?;
        self.enter(PipelineStage::Exported, source_filename);

        self.enter(PipelineStage::Completed, source_filename);
        Ok(ProcessingResult {
            description,
            segmented_image: segmented_filename,
            model_file: assets.glb_filename(),
        })
    }

    fn enter(&self, stage: PipelineStage, source: &str) {
        info!("Pipeline stage '{}' reached for {}", stage.name(), source);
    }
}
