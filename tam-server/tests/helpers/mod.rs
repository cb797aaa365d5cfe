//! Shared test fixtures: in-memory cloud and library collaborators

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use tam_common::models::{Audiobook, AudiobookTrack, Song, Tonie, Track};
use tam_server::cloud::{CloudError, RemoteContent};
use tam_server::services::{LibraryError, LocalLibrary, Reconciler};
use tam_server::{build_router, AppState};

pub fn tonie(id: &str) -> Tonie {
    Tonie {
        id: id.to_string(),
        name: format!("Tonie {}", id),
        household_id: "household_1".to_string(),
        image_url: None,
    }
}

pub fn track(id: &str, title: &str) -> Track {
    Track {
        id: id.to_string(),
        title: title.to_string(),
        file: format!("file-{}", id),
        seconds: 60.0,
        transcoding: false,
        extra: Map::new(),
    }
}

pub fn audiobook(id: &str, folder: &Path, titles: &[&str]) -> Audiobook {
    Audiobook {
        id: id.to_string(),
        album: format!("Album {}", id),
        artist: Some("Narrator".to_string()),
        folder: folder.to_path_buf(),
        tracks: titles
            .iter()
            .enumerate()
            .map(|(i, title)| AudiobookTrack {
                title: title.to_string(),
                file: folder.join(format!("{:02}.mp3", i + 1)),
                track_number: Some(i as u32 + 1),
            })
            .collect(),
    }
}

pub fn song(id: &str, title: &str, file: &Path) -> Song {
    Song {
        id: id.to_string(),
        title: title.to_string(),
        artist: None,
        album: None,
        file: file.to_path_buf(),
        file_original: None,
    }
}

/// Cloud stand-in holding chapter lists in memory and recording mutations
#[derive(Default)]
pub struct MockCloud {
    pub tonies: Vec<Tonie>,
    pub chapters: Mutex<HashMap<String, Vec<Track>>>,
    /// Every `replace_track_list` call: (tonie id, submitted list)
    pub replaced: Mutex<Vec<(String, Vec<Track>)>>,
    /// Every `put_album_on_target` call: (tonie id, audiobook id)
    pub puts: Mutex<Vec<(String, String)>>,
    pub fail_replace: bool,
}

impl MockCloud {
    /// tonie_1 with [track_1, track_2] and tonie_2 with [track_3]
    pub fn standard() -> Self {
        let cloud = Self {
            tonies: vec![tonie("tonie_1"), tonie("tonie_2")],
            ..Self::default()
        };
        cloud.set_chapters(
            "tonie_1",
            vec![track("track_1", "Track 1"), track("track_2", "Track 2")],
        );
        cloud.set_chapters("tonie_2", vec![track("track_3", "Track 3")]);
        cloud
    }

    pub fn failing_replace() -> Self {
        Self {
            fail_replace: true,
            ..Self::standard()
        }
    }

    pub fn set_chapters(&self, tonie_id: &str, tracks: Vec<Track>) {
        self.chapters
            .lock()
            .unwrap()
            .insert(tonie_id.to_string(), tracks);
    }

    pub fn chapters_of(&self, tonie_id: &str) -> Vec<Track> {
        self.chapters
            .lock()
            .unwrap()
            .get(tonie_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn replace_calls(&self) -> Vec<(String, Vec<Track>)> {
        self.replaced.lock().unwrap().clone()
    }

    pub fn put_calls(&self) -> Vec<(String, String)> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteContent for MockCloud {
    async fn list_targets(&self) -> Result<Vec<Tonie>, CloudError> {
        Ok(self.tonies.clone())
    }

    async fn fetch_track_list(&self, target: &Tonie) -> Result<Vec<Track>, CloudError> {
        self.chapters
            .lock()
            .unwrap()
            .get(&target.id)
            .cloned()
            .ok_or_else(|| CloudError::NotFound(target.id.clone()))
    }

    async fn replace_track_list(&self, target: &Tonie, tracks: &[Track]) -> Result<(), CloudError> {
        self.replaced
            .lock()
            .unwrap()
            .push((target.id.clone(), tracks.to_vec()));
        if self.fail_replace {
            return Err(CloudError::Api(500, "replace rejected".to_string()));
        }
        self.set_chapters(&target.id, tracks.to_vec());
        Ok(())
    }

    async fn put_album_on_target(
        &self,
        target: &Tonie,
        album: &Audiobook,
    ) -> Result<Vec<Track>, CloudError> {
        self.puts
            .lock()
            .unwrap()
            .push((target.id.clone(), album.id.clone()));

        let added: Vec<Track> = album
            .tracks
            .iter()
            .enumerate()
            .map(|(i, t)| {
                Track::from_upload(format!("{}-{}-{}", album.id, target.id, i), t.title.clone())
            })
            .collect();
        let mut chapters = self.chapters_of(&target.id);
        chapters.extend(added.iter().cloned());
        self.set_chapters(&target.id, chapters);
        Ok(added)
    }
}

/// Library stand-in with fixed listings rooted at `roots`
#[derive(Default)]
pub struct MockLibrary {
    pub audiobooks: Vec<Audiobook>,
    pub songs: Vec<Song>,
    pub roots: Vec<PathBuf>,
}

#[async_trait]
impl LocalLibrary for MockLibrary {
    async fn audiobooks(&self) -> Result<Vec<Audiobook>, LibraryError> {
        Ok(self.audiobooks.clone())
    }

    async fn songs(&self) -> Result<Vec<Song>, LibraryError> {
        Ok(self.songs.clone())
    }

    fn contains(&self, path: &Path) -> bool {
        !path.components().any(|c| matches!(c, Component::ParentDir))
            && self.roots.iter().any(|root| path.starts_with(root))
    }
}

pub fn setup_app(cloud: Arc<MockCloud>, library: Arc<MockLibrary>) -> axum::Router {
    build_router(AppState::new(Reconciler::new(cloud, library)))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn extract_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
