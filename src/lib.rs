// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod pipeline;
pub mod reconstruction;
pub mod storage;
pub mod version;
pub mod vision;

// Re-export main types
pub use api::{start_server, ApiError, AppState, ErrorResponse, HealthResponse, UploadResponse};
pub use config::{NodeSettings, ReconstructionConfig};
pub use pipeline::{
    ErrorKind, PipelineError, PipelineOrchestrator, PipelineStage, ProcessingResult,
};
pub use reconstruction::{
    load_point_cloud_glb, load_point_cloud_ply, save_point_cloud_glb, save_point_cloud_ply,
    AssetExporter, ExportedAssets, ExportError, HeightFieldBuilder, PointCloud,
};
pub use storage::UploadStore;
pub use vision::{
    Captioner, CaptionClient, MaskExtractor, RankedMask, SeedPoint, SegmentationClient, Segmenter,
    VisionCapabilities,
};
