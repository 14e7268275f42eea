// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::upload::upload_handler;
use crate::config::NodeSettings;
use crate::pipeline::PipelineOrchestrator;
use crate::storage::UploadStore;
use crate::vision::VisionCapabilities;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<PipelineOrchestrator>,
    pub capabilities: VisionCapabilities,
    pub store: UploadStore,
}

/// Node health, including reachability of both sidecars
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub captioner_available: bool,
    pub segmenter_available: bool,
}

pub async fn start_server(
    settings: NodeSettings,
    capabilities: VisionCapabilities,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = UploadStore::new(settings.upload_dir.clone());
    store.ensure_root()?;

    let orchestrator = Arc::new(PipelineOrchestrator::new(
        &capabilities,
        settings.reconstruction,
        store.clone(),
    ));

    let state = AppState {
        orchestrator,
        capabilities,
        store: store.clone(),
    };

    let app = Router::new()
        // Liveness
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        // Upload + processing endpoint
        .route("/upload", post(upload_handler))
        // Uploaded sources and generated artifacts
        .nest_service("/static/uploads", ServeDir::new(store.root().to_path_buf()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.api_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({ "message": "Photo3D node is running!" }))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (captioner_available, segmenter_available) = state.capabilities.health_check().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        captioner_available,
        segmenter_available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let health = HealthResponse {
            status: "ok".to_string(),
            captioner_available: true,
            segmenter_available: false,
        };
        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["captioner_available"], true);
        assert_eq!(json["segmenter_available"], false);
    }
}
