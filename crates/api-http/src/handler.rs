//! HTTP Route Handlers

use crate::error::ApiError;
use crate::rate_limiter::RateLimiter;
use crate::types::{FieldError, SubmitBody, SubmitResponse};
use crate::validation::validate_submit;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;
use tracing::{debug, warn};
use ytflow_core::application::constants::SUBMIT_ACK_MESSAGE;
use ytflow_core::application::SubmissionService;
use ytflow_core::domain::{job_key, JobRecord};

/// Shared handler state with injected dependencies
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SubmissionService>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(service: Arc<SubmissionService>, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            service,
            rate_limiter,
        }
    }
}

/// POST /yt
pub async fn submit(
    State(state): State<AppState>,
    body: Result<Json<SubmitBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.rate_limiter.try_acquire() {
        warn!("Submission rejected by rate limiter");
        return Err(ApiError::RateLimited);
    }

    let Json(body) = body.map_err(|rejection| {
        debug!(error = %rejection, "Undecodable submit body");
        ApiError::Validation(vec![FieldError::new("body", rejection.body_text())])
    })?;

    let req = validate_submit(body).map_err(ApiError::Validation)?;
    let outcome = state.service.submit(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            job_id: outcome.job_id,
            message: SUBMIT_ACK_MESSAGE.to_string(),
        }),
    ))
}

/// GET /yt/{job_id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobRecord>, ApiError> {
    state
        .service
        .store()
        .get(&job_key(&job_id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}
