//! Album upload endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tam_common::models::Track;

use crate::error::ApiResult;
use crate::services::upload::UploadSummary;
use crate::services::{extract_ids, IdentifierKind};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub upload: UploadSummary,
    pub tracks: Vec<Track>,
}

/// POST /upload
///
/// Body: `{"tonie_id": <id>, "audiobook_id": <id>}`. Responds 201 once the
/// chapters are on the tonie.
pub async fn upload_album_to_tonie(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let Json(payload) = body?;
    let tonie_id = extract_ids(&payload, IdentifierKind::TargetId)?;
    let audiobook_id = extract_ids(&payload, IdentifierKind::AudiobookId)?;

    let outcome = state.reconciler.upload_album(&tonie_id, &audiobook_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            status: "success",
            upload: outcome.upload,
            tracks: outcome.tracks,
        }),
    ))
}

pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/upload", post(upload_album_to_tonie))
}
