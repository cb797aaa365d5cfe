//! Domain models shared between the service and its collaborators

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// A creative tonie: the remote content slot of a physical figurine
///
/// Owned by the cloud service. The service only holds this handle for the
/// duration of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tonie {
    pub id: String,
    pub name: String,
    /// Household the tonie belongs to (part of its remote address)
    pub household_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// One chapter in a tonie's ordered track list
///
/// Fields the service does not model are kept in `extra` and written back
/// unchanged on full-list replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Remote file reference
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub seconds: f64,
    #[serde(default)]
    pub transcoding: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Track {
    /// Chapter for a freshly uploaded file, before the cloud has transcoded it
    pub fn from_upload(file_id: impl Into<String>, title: impl Into<String>) -> Self {
        let file_id = file_id.into();
        Self {
            id: file_id.clone(),
            title: title.into(),
            file: file_id,
            seconds: 0.0,
            transcoding: false,
            extra: Map::new(),
        }
    }
}

/// A folder of audio files uploaded to a tonie as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audiobook {
    pub id: String,
    pub album: String,
    pub artist: Option<String>,
    pub folder: PathBuf,
    pub tracks: Vec<AudiobookTrack>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudiobookTrack {
    pub title: String,
    pub file: PathBuf,
    pub track_number: Option<u32>,
}

/// A single audio file in the songs folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub file: PathBuf,
    /// Lossless source kept next to the playable file (`x.flac` beside `x.mp3`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_original: Option<PathBuf>,
}

impl Song {
    /// Every file on disk this record references
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.file.as_path()).chain(self.file_original.as_deref())
    }
}

/// Stable identifier for a library record derived from its path
///
/// The same path always yields the same id across rescans.
pub fn stable_id(path: &Path) -> String {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    digest.iter().take(8).map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_track_preserves_unknown_fields() {
        let raw = json!({
            "id": "chapter-1",
            "title": "Intro",
            "file": "file-1",
            "seconds": 12.5,
            "transcoding": false,
            "position": 3
        });

        let track: Track = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(track.id, "chapter-1");
        assert_eq!(track.extra.get("position"), Some(&json!(3)));
        assert_eq!(serde_json::to_value(&track).unwrap(), raw);
    }

    #[test]
    fn test_track_minimal_payload() {
        let track: Track = serde_json::from_value(json!({"id": "track_1"})).unwrap();
        assert_eq!(track.title, "");
        assert_eq!(track.seconds, 0.0);
        assert!(track.extra.is_empty());
    }

    #[test]
    fn test_stable_id_is_deterministic() {
        let a = stable_id(Path::new("/music/audiobooks/Gruffalo"));
        let b = stable_id(Path::new("/music/audiobooks/Gruffalo"));
        let c = stable_id(Path::new("/music/audiobooks/Pettersson"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_song_files_include_original() {
        let song = Song {
            id: "s1".to_string(),
            title: "Song".to_string(),
            artist: None,
            album: None,
            file: PathBuf::from("/music/songs/a.mp3"),
            file_original: Some(PathBuf::from("/music/songs/a.flac")),
        };
        let files: Vec<&Path> = song.files().collect();
        assert_eq!(files, vec![Path::new("/music/songs/a.mp3"), Path::new("/music/songs/a.flac")]);
    }
}
