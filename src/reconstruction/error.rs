// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for point-cloud export and import

use std::path::PathBuf;

use thiserror::Error;

/// Errors from writing or reading 3D asset files
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Output directory does not exist or is not writable: {path}")]
    DirectoryNotWritable { path: PathBuf },

    #[error("Cannot export an empty point cloud")]
    EmptyCloud,

    #[error("Failed to write artifact {path}: {message}")]
    ArtifactWrite { path: PathBuf, message: String },

    #[error("Invalid file content: {0}")]
    InvalidContent(String),
}

impl ExportError {
    pub fn invalid_content(msg: impl Into<String>) -> Self {
        ExportError::InvalidContent(msg.into())
    }
}

pub type ExportResult<T> = Result<T, ExportError>;
