//! Binary entrypoint for the quality API.

use axum::{routing::get, routing::post, Router};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quality_api::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).init();

  let port: u16 = match std::env::var("PORT") {
    Ok(p) => p.parse()?,
    Err(_) => 5005,
  };
  let state = match std::env::var("QUALITY_CONFIG") {
    Ok(path) => AppState::from_file(Path::new(&path))?,
    Err(_) => AppState::default(),
  };
  let state = Arc::new(state);

  let app = Router::new()
    .route("/health", get(quality_api::health))
    .route("/report", post(quality_api::report))
    .layer(CorsLayer::permissive())
    .with_state(state);

  let addr = SocketAddr::from(([127, 0, 0, 1], port));
  info!("quality-api listening on http://{}", addr);

  let listener = tokio::net::TcpListener::bind(addr).await?;
  axum::serve(listener, app).await?;

  Ok(())
}
