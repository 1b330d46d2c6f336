use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod detection;

use api::AppState;
use config::Config;
use detection::{CategoryTable, OnnxDetector, OrtProbe};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("framelabel=debug".parse()?))
        .init();

    let config = Config::load()?;

    let categories = match &config.model.categories_path {
        Some(path) => CategoryTable::from_file(path)?,
        None => CategoryTable::coco(),
    };
    tracing::info!(count = categories.len(), "loaded category table");

    let device = config.model.device.resolve(&OrtProbe)?;
    tracing::info!(requested = ?config.model.device, device = %device, "selected compute device");

    let detector = tokio::task::spawn_blocking({
        let model = config.model.clone();
        move || OnnxDetector::load(&model, device)
    })
    .await??;
    tracing::info!(device = %detector.device(), "model ready");

    let state = AppState::new(Arc::new(detector), categories);
    api::start_server(state, &config.http).await?;

    tracing::info!("shutdown complete");

    Ok(())
}
