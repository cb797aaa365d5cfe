//! Tonie chapter endpoints: overview, remote delete, local delete
//!
//! Bodies are read as free-form JSON because `tonie_id` / `track_id` accept
//! several shapes; the resolver normalizes them.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tam_common::models::Track;

use crate::error::{ApiError, ApiResult};
use crate::services::reconciler::TargetDefault;
use crate::services::{extract_ids, IdentifierKind};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub status: &'static str,
    pub tracks: BTreeMap<String, Vec<Track>>,
}

#[derive(Debug, Serialize)]
pub struct DeleteTrackResponse {
    pub status: &'static str,
    pub tonie_id: String,
    pub track_id: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// POST /tonie_overview
///
/// Without `tonie_id` every tonie on the account is listed.
pub async fn tonie_overview(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<OverviewResponse>> {
    let Json(payload) = body?;
    let raw = extract_ids(&payload, IdentifierKind::TargetId)?;

    let targets = state
        .reconciler
        .resolve_targets(&raw, TargetDefault::AllTonies)
        .await?;
    let tracks = state.reconciler.overview(targets).await?;

    Ok(Json(OverviewResponse {
        status: "success",
        tracks,
    }))
}

/// POST /delete_track
pub async fn delete_track(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<DeleteTrackResponse>> {
    let Json(payload) = body?;
    let raw_tonies = extract_ids(&payload, IdentifierKind::TargetId)?;
    let raw_tracks = extract_ids(&payload, IdentifierKind::TrackId)?;

    let targets = state
        .reconciler
        .resolve_targets(&raw_tonies, TargetDefault::Nothing)
        .await?;
    let outcome = state.reconciler.delete_track(targets, &raw_tracks).await?;

    Ok(Json(DeleteTrackResponse {
        status: "success",
        tonie_id: outcome.tonie_id,
        track_id: outcome.track_ids,
    }))
}

/// POST /delete_local_track
///
/// Succeeds whether or not the file was still on disk.
pub async fn delete_local_track(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let Json(payload) = body?;
    let file = payload
        .get("file")
        .and_then(Value::as_str)
        .filter(|f| !f.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| ApiError::InvalidRequest("file is required".to_string()))?;

    let outcomes = state.reconciler.delete_local_track(&file).await;
    tracing::info!(file = %file.display(), outcomes = ?outcomes, "Handled local track delete");

    Ok(Json(StatusResponse { status: "success" }))
}

pub fn tonie_routes() -> Router<AppState> {
    Router::new()
        .route("/tonie_overview", post(tonie_overview))
        .route("/delete_track", post(delete_track))
        .route("/delete_local_track", post(delete_local_track))
}
