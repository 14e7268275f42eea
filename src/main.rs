// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use fabstir_photo3d_node::{
    api::start_server,
    config::NodeSettings,
    version,
    vision::VisionCapabilities,
};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("🚀 Starting {}...\n", version::get_version_string());

    let settings = NodeSettings::from_env();
    println!("📁 Upload directory: {}", settings.upload_dir.display());
    println!(
        "🔧 Reconstruction: downsample x{}, voxel size {}",
        settings.reconstruction.downsample_factor, settings.reconstruction.voxel_size
    );

    // Capabilities are built once and shared read-only across requests
    let capabilities = VisionCapabilities::from_settings(&settings)?;

    let (captioner_ok, segmenter_ok) = capabilities.health_check().await;
    if !captioner_ok {
        tracing::warn!(
            "Captioning sidecar not reachable at {} (uploads will fail until it is)",
            settings.captioner_endpoint
        );
    }
    if !segmenter_ok {
        tracing::warn!(
            "Segmentation sidecar not reachable at {} (uploads will fail until it is)",
            settings.segmenter_endpoint
        );
    }

    let api_port = settings.api_port;
    println!("\nAPI Endpoints:");
    println!("  Health:       http://localhost:{}/health", api_port);
    println!("  Upload:       POST http://localhost:{}/upload", api_port);
    println!(
        "  Artifacts:    http://localhost:{}/static/uploads/<file>",
        api_port
    );
    println!("\nTest with curl:");
    println!("  curl -X POST http://localhost:{}/upload \\", api_port);
    println!("    -F 'file=@photo.png'");
    println!("\nPress Ctrl+C to shutdown...\n");

    start_server(settings, capabilities)
        .await
        .map_err(|e| anyhow::anyhow!("server error: {}", e))?;

    Ok(())
}
