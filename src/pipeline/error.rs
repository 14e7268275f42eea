// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pipeline error taxonomy
//!
//! Stage failures keep their kind and originating stage internally; the
//! HTTP boundary still surfaces a single stringified message, so the wire
//! contract stays a one-line failure indication.

use thiserror::Error;

use crate::reconstruction::ExportError;
use crate::vision::{ImageError, SegmentationError};

/// States of the processing pipeline, in order. `Failed` is absorbing and
/// reachable from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Loaded,
    Captioned,
    Masked,
    Reconstructed,
    Exported,
    Completed,
    Failed,
}

impl PipelineStage {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::Loaded => "loaded",
            PipelineStage::Captioned => "captioned",
            PipelineStage::Masked => "masked",
            PipelineStage::Reconstructed => "reconstructed",
            PipelineStage::Exported => "exported",
            PipelineStage::Completed => "completed",
            PipelineStage::Failed => "failed",
        }
    }
}

/// The four error kinds of the processing contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Load,
    Inference,
    Geometry,
    Export,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Load => "load",
            ErrorKind::Inference => "inference",
            ErrorKind::Geometry => "geometry",
            ErrorKind::Export => "export",
        }
    }
}

/// A stage failure, wrapped once at the orchestrator boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to load image: {0}")]
    Load(#[from] ImageError),

    #[error("Captioning failed: {0}")]
    Caption(String),

    #[error("Segmentation failed: {0}")]
    Segmentation(#[from] SegmentationError),

    #[error("Empty point cloud after reduction")]
    Geometry,

    #[error("Failed to export artifacts: {0}")]
    Export(#[from] ExportError),
}

impl PipelineError {
    /// The stage the pipeline failed to complete.
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Load(_) => PipelineStage::Loaded,
            PipelineError::Caption(_) => PipelineStage::Captioned,
            PipelineError::Segmentation(_) => PipelineStage::Masked,
            PipelineError::Geometry => PipelineStage::Reconstructed,
            PipelineError::Export(_) => PipelineStage::Exported,
        }
    }

    /// The contract-level error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Load(_) => ErrorKind::Load,
            PipelineError::Caption(_) | PipelineError::Segmentation(_) => ErrorKind::Inference,
            PipelineError::Geometry => ErrorKind::Geometry,
            PipelineError::Export(_) => ErrorKind::Export,
        }
    }
}
