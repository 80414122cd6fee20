//! Relay request handlers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::response::Html;
use axum::Json;
use sift_core::{AnalysisError, AnalysisService, Endpoint, ProviderKind, VERSION};

use super::types::{
    AnalyzeResponse, ApiError, AskData, AskRequest, AskResponse, CompareResponse, StatusResponse,
};

pub type AppState = Arc<AnalysisService>;

/// Fields read from an upload form.
#[derive(Debug, Default)]
struct Upload {
    image: Option<Vec<u8>>,
    model: Option<String>,
}

/// Count the request, then apply the per-caller cap.
fn admit(state: &AnalysisService, endpoint: Endpoint, caller: SocketAddr) -> Result<(), ApiError> {
    state.counters().record(endpoint);
    state.limiter().check(caller.ip()).map_err(|retry| {
        tracing::warn!(caller = %caller.ip(), ?endpoint, "Rate limit exceeded");
        ApiError::rate_limited(retry.as_secs_ceil())
    })
}

async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Upload, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let mut upload = Upload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()).with_status(e.status()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()).with_status(e.status()))?;
                upload.image = Some(bytes.to_vec());
            }
            "model" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()).with_status(e.status()))?;
                upload.model = Some(text.trim().to_string());
            }
            other => tracing::debug!(field = other, "Ignoring form field"),
        }
    }

    Ok(upload)
}

/// Selector from the request, or the first served provider when absent.
fn selector(state: &AnalysisService, model: Option<String>) -> String {
    model
        .filter(|m| !m.is_empty())
        .or_else(|| state.provider_kinds().first().map(ProviderKind::to_string))
        .unwrap_or_default()
}

/// POST /analyze - extract label fields with one provider
pub async fn analyze(
    State(state): State<AppState>,
    ConnectInfo(caller): ConnectInfo<SocketAddr>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    admit(&state, Endpoint::Analyze, caller)?;

    let upload = read_upload(multipart).await?;
    let image = upload.image.ok_or(AnalysisError::MissingImage)?;
    let model = selector(&state, upload.model);

    let start = Instant::now();
    let data = state.analyze(&model, image).await?;
    tracing::info!(
        provider = %model,
        latency_ms = start.elapsed().as_millis() as u64,
        "Analyzed upload"
    );

    Ok(Json(AnalyzeResponse { status: 200, data }))
}

/// POST /compareAnalyze - run every served provider on the same upload
pub async fn compare_analyze(
    State(state): State<AppState>,
    ConnectInfo(caller): ConnectInfo<SocketAddr>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CompareResponse>, ApiError> {
    admit(&state, Endpoint::CompareAnalyze, caller)?;

    let upload = read_upload(multipart).await?;
    let image = upload.image.ok_or(AnalysisError::MissingImage)?;

    let start = Instant::now();
    let results = state.compare(image).await?;
    tracing::info!(
        providers = results.len(),
        failed = results.iter().filter(|r| r.error.is_some()).count(),
        latency_ms = start.elapsed().as_millis() as u64,
        "Compared upload"
    );

    let (models, datas): (Vec<_>, Vec<_>) = results.into_iter().map(|r| (r.provider, r.result)).unzip();
    Ok(Json(CompareResponse {
        status: 200,
        datas,
        models,
    }))
}

/// POST /ask - relay a free-text prompt
pub async fn ask(
    State(state): State<AppState>,
    ConnectInfo(caller): ConnectInfo<SocketAddr>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    admit(&state, Endpoint::Ask, caller)?;

    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let prompt = request.prompt.ok_or(AnalysisError::MissingPrompt)?;
    let model = selector(&state, request.model);

    let start = Instant::now();
    let response = state.ask(&model, &prompt).await?;
    tracing::info!(
        provider = %model,
        latency_ms = start.elapsed().as_millis() as u64,
        "Answered prompt"
    );

    Ok(Json(AskResponse {
        status: 200,
        data: AskData { response },
    }))
}

/// GET /status - liveness and usage counters
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    state.counters().record(Endpoint::Status);
    Json(StatusResponse {
        status: 200,
        models: state.provider_kinds(),
        version: VERSION.to_string(),
        requests: state.counters().snapshot(),
    })
}

/// GET /check - manual upload form
pub async fn check() -> Html<&'static str> {
    Html(include_str!("check.html"))
}
