//! 搜索接口
//!
//! - `GET /search?q=<逗号分隔的搜索词>` → 200 + 聚合结果
//! - `GET /health` → 200 `{"status":"ok"}`

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::AppResult;
use crate::models::AggregatedResponse;
use crate::orchestrator::QueryOrchestrator;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// 构建路由
pub fn router(orchestrator: Arc<QueryOrchestrator>) -> Router {
    Router::new()
        .route("/search", get(search_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(orchestrator)
}

async fn search_handler(
    State(orchestrator): State<Arc<QueryOrchestrator>>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Arc<AggregatedResponse>>> {
    let query = params.q.unwrap_or_default();
    let response = orchestrator.handle(&query).await?;
    Ok(Json(response))
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
