// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! API boundary tests: error mapping and response shapes

use fabstir_photo3d_node::api::{ApiError, UploadResponse};
use fabstir_photo3d_node::pipeline::ProcessingResult;

#[test]
fn test_upload_response_matches_wire_contract() {
    let response = UploadResponse::new(ProcessingResult {
        description: "A wooden chair.".to_string(),
        segmented_image: "chair_segmented.jpg".to_string(),
        model_file: "chair_3d.glb".to_string(),
    });

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["message"], "Image processed successfully!");

    // The result record has exactly three string fields
    let result = json["result"].as_object().unwrap();
    assert_eq!(result.len(), 3);
    assert!(result["description"].is_string());
    assert!(result["segmented_image"].is_string());
    assert!(result["model_file"].is_string());
}

#[test]
fn test_model_file_references_glb_only() {
    let response = UploadResponse::new(ProcessingResult {
        description: "x".to_string(),
        segmented_image: "x_segmented.png".to_string(),
        model_file: "x_3d.glb".to_string(),
    });
    // The PLY artifact exists on disk but never appears in the result
    let json = serde_json::to_string(&response).unwrap();
    assert!(!json.contains("_3d.ply"));
    assert!(json.contains("x_3d.glb"));
}

#[test]
fn test_pipeline_failure_maps_to_single_500_message() {
    let error =
        ApiError::ProcessingFailed("Segmentation failed: Segmentation returned no masks".into());
    assert_eq!(error.status_code(), 500);

    let response = error.to_response(Some("req-42".into()));
    assert_eq!(response.error_type, "processing_failed");
    // One flat message; stage identity is not part of the wire contract
    assert_eq!(
        response.message,
        "Segmentation failed: Segmentation returned no masks"
    );
    assert!(response.details.is_none());
}

#[test]
fn test_validation_error_is_bad_request() {
    let error = ApiError::ValidationError {
        field: "file".to_string(),
        message: "file is required".to_string(),
    };
    assert_eq!(error.status_code(), 400);
    let response = error.to_response(None);
    assert_eq!(response.error_type, "validation_error");
}
