//! HTTP handlers for the quality API.

use axum::{
  extract::{rejection::JsonRejection, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use pr_quality_engine::types::ErrorOutput;
use pr_quality_engine::{EngineError, ReportRequest};

use crate::state::AppState;

pub async fn health() -> &'static str {
  "ok"
}

pub async fn report(
  State(state): State<Arc<AppState>>,
  body: Result<Json<ReportRequest>, JsonRejection>,
) -> Response {
  let mut request = match body {
    Ok(Json(request)) => request,
    Err(rejection) => {
      warn!("report: unreadable body: {}", rejection.body_text());
      let body = ErrorOutput::new(rejection.body_text()).with_field("body");
      return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }
  };
  if request.config.is_none() {
    request.config = Some(state.defaults.clone());
  }

  match pr_quality_engine::run(&request, Utc::now()) {
    Ok(outcome) => {
      info!(
        repo = %request.repo,
        scored = outcome.payload.prs.len(),
        failed = outcome.failures.len(),
        "report built"
      );
      (StatusCode::OK, Json(outcome)).into_response()
    }
    Err(e) => {
      warn!("report: rejected: {}", e);
      let (status, body) = match &e {
        EngineError::Validation { field, reason } => (
          StatusCode::BAD_REQUEST,
          ErrorOutput::new(reason.clone()).with_field(field.clone()),
        ),
        EngineError::Config(_) => (StatusCode::BAD_REQUEST, ErrorOutput::new(e.to_string())),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, ErrorOutput::new(e.to_string())),
      };
      (status, Json(body)).into_response()
    }
  }
}
