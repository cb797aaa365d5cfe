//! Listing endpoints for the local library and the account's tonies

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tam_common::models::{Audiobook, Song, Tonie};

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AudiobooksResponse {
    pub status: &'static str,
    pub audiobooks: Vec<Audiobook>,
}

#[derive(Debug, Serialize)]
pub struct SongsResponse {
    pub status: &'static str,
    pub songs: Vec<Song>,
}

#[derive(Debug, Serialize)]
pub struct CreativeToniesResponse {
    pub status: &'static str,
    pub creativetonies: Vec<Tonie>,
}

/// GET /audiobooks
pub async fn all_audiobooks(State(state): State<AppState>) -> ApiResult<Json<AudiobooksResponse>> {
    let audiobooks = state.reconciler.library().audiobooks().await?;
    Ok(Json(AudiobooksResponse {
        status: "success",
        audiobooks,
    }))
}

/// GET /songs
pub async fn all_songs(State(state): State<AppState>) -> ApiResult<Json<SongsResponse>> {
    let songs = state.reconciler.library().songs().await?;
    Ok(Json(SongsResponse {
        status: "success",
        songs,
    }))
}

/// GET /creativetonies
pub async fn all_creative_tonies(
    State(state): State<AppState>,
) -> ApiResult<Json<CreativeToniesResponse>> {
    let creativetonies = state.reconciler.remote().list_targets().await?;
    Ok(Json(CreativeToniesResponse {
        status: "success",
        creativetonies,
    }))
}

pub fn library_routes() -> Router<AppState> {
    Router::new()
        .route("/audiobooks", get(all_audiobooks))
        .route("/songs", get(all_songs))
        .route("/creativetonies", get(all_creative_tonies))
}
