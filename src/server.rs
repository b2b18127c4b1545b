use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use std::{net::SocketAddr, sync::Arc};
use tracing::info;

use crate::api::{ApiDiscoveryRequest, ApiError};
use opportunity_scout::error::DiscoveryError;
use opportunity_scout::opportunity::{DiscoveryPipeline, ProductCatalogEntry};
use opportunity_scout::OpportunityReport;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<DiscoveryPipeline>,
}

pub async fn serve(args: crate::ServeArgs, pipeline: DiscoveryPipeline) -> Result<(), DiscoveryError> {
    let state = AppState {
        pipeline: Arc::new(pipeline),
    };

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/catalog", get(catalog_handler))
        .route("/api/discover", post(discover_handler))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|err| DiscoveryError::InvalidInput(format!("invalid bind address: {}", err)))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| DiscoveryError::Server(format!("failed to bind server: {}", err)))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .await
        .map_err(|err| DiscoveryError::Server(err.to_string()))?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn catalog_handler(State(state): State<AppState>) -> Json<Vec<ProductCatalogEntry>> {
    Json(state.pipeline.catalog().entries().to_vec())
}

async fn discover_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiDiscoveryRequest>,
) -> Result<Json<OpportunityReport>, ApiError> {
    let k = request.clusters.unwrap_or_else(|| state.pipeline.k());
    let seed = request.seed;
    let items = request.into_items()?;

    let pipeline = state.pipeline.clone();
    let report = tokio::task::spawn_blocking(move || {
        let mut rng = pipeline.rng(seed);
        pipeline.run_with_rng(&items, k, &mut rng, Utc::now())
    })
    .await
    .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(Json(report))
}
