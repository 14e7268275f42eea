// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload endpoint response types

use serde::{Deserialize, Serialize};

use crate::pipeline::ProcessingResult;

/// Response from a successful upload-and-process run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Human-readable status message
    pub message: String,
    /// The pipeline's result record
    pub result: ProcessingResult,
}

impl UploadResponse {
    pub fn new(result: ProcessingResult) -> Self {
        Self {
            message: "Image processed successfully!".to_string(),
            result,
        }
    }
}
