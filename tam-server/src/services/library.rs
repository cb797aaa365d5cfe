//! Local media library listing
//!
//! The reconciler reads audiobooks and songs through [`LocalLibrary`]. The
//! directory implementation rescans on every call so the listing is always
//! the current state of the disk.

use async_trait::async_trait;
use lofty::file::TaggedFileExt;
use lofty::prelude::*;
use lofty::probe::Probe;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tam_common::models::{stable_id, Audiobook, AudiobookTrack, Song};
use thiserror::Error;
use walkdir::WalkDir;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "mp4", "aac", "ogg", "oga", "opus", "flac", "wav"];

/// Lossless formats kept next to a transcoded copy of the same song
const SOURCE_EXTENSIONS: &[&str] = &["flac", "wav"];

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Library scan failed: {0}")]
    Scan(String),
}

#[async_trait]
pub trait LocalLibrary: Send + Sync {
    async fn audiobooks(&self) -> Result<Vec<Audiobook>, LibraryError>;

    async fn songs(&self) -> Result<Vec<Song>, LibraryError>;

    /// Whether `path` lies inside one of the library folders
    fn contains(&self, path: &Path) -> bool;
}

/// Every file a library listing references, with the owning record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    pub record_id: String,
    pub title: String,
    pub file: PathBuf,
}

/// Flatten audiobook tracks and songs into per-file references
pub fn file_references(audiobooks: &[Audiobook], songs: &[Song]) -> Vec<FileReference> {
    let book_files = audiobooks.iter().flat_map(|book| {
        book.tracks.iter().map(move |track| FileReference {
            record_id: book.id.clone(),
            title: track.title.clone(),
            file: track.file.clone(),
        })
    });
    let song_files = songs.iter().flat_map(|song| {
        song.files().map(move |file| FileReference {
            record_id: song.id.clone(),
            title: song.title.clone(),
            file: file.to_path_buf(),
        })
    });
    book_files.chain(song_files).collect()
}

/// Library backed by an audiobooks folder and a songs folder
pub struct DirectoryLibrary {
    audiobooks_dir: PathBuf,
    songs_dir: PathBuf,
}

impl DirectoryLibrary {
    pub fn new(audiobooks_dir: impl Into<PathBuf>, songs_dir: impl Into<PathBuf>) -> Self {
        Self {
            audiobooks_dir: audiobooks_dir.into(),
            songs_dir: songs_dir.into(),
        }
    }
}

#[async_trait]
impl LocalLibrary for DirectoryLibrary {
    async fn audiobooks(&self) -> Result<Vec<Audiobook>, LibraryError> {
        let root = self.audiobooks_dir.clone();
        tokio::task::spawn_blocking(move || scan_audiobooks(&root))
            .await
            .map_err(|e| LibraryError::Scan(e.to_string()))
    }

    async fn songs(&self) -> Result<Vec<Song>, LibraryError> {
        let root = self.songs_dir.clone();
        tokio::task::spawn_blocking(move || scan_songs(&root))
            .await
            .map_err(|e| LibraryError::Scan(e.to_string()))
    }

    fn contains(&self, path: &Path) -> bool {
        !path
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
            && (path.starts_with(&self.audiobooks_dir) || path.starts_with(&self.songs_dir))
    }
}

fn is_audio_file(path: &Path) -> bool {
    has_extension(path, AUDIO_EXTENSIONS)
}

/// Audio files below `root`, sorted by path
fn audio_files(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        tracing::warn!("Library folder {} does not exist", root.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Error accessing entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_audio_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

#[derive(Debug, Default)]
struct FileTags {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    track_number: Option<u32>,
}

fn read_tags(path: &Path) -> FileTags {
    let tagged_file = match Probe::open(path).and_then(|probe| probe.read()) {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!(file = %path.display(), "No readable tags: {}", e);
            return FileTags::default();
        }
    };

    match tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        Some(tag) => FileTags {
            title: tag.title().map(|s| s.to_string()),
            artist: tag.artist().map(|s| s.to_string()),
            album: tag.album().map(|s| s.to_string()),
            track_number: tag.track(),
        },
        None => FileTags::default(),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn scan_audiobooks(root: &Path) -> Vec<Audiobook> {
    let mut by_folder: BTreeMap<PathBuf, Vec<(PathBuf, FileTags)>> = BTreeMap::new();
    for file in audio_files(root) {
        let folder = file.parent().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
        let tags = read_tags(&file);
        by_folder.entry(folder).or_default().push((file, tags));
    }

    by_folder
        .into_iter()
        .map(|(folder, mut files)| {
            files.sort_by(|(a_path, a), (b_path, b)| {
                a.track_number
                    .unwrap_or(u32::MAX)
                    .cmp(&b.track_number.unwrap_or(u32::MAX))
                    .then_with(|| a_path.cmp(b_path))
            });

            let album = files
                .iter()
                .find_map(|(_, tags)| tags.album.clone())
                .unwrap_or_else(|| {
                    folder
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default()
                });
            let artist = files.iter().find_map(|(_, tags)| tags.artist.clone());

            let tracks = files
                .into_iter()
                .map(|(file, tags)| AudiobookTrack {
                    title: tags.title.unwrap_or_else(|| file_stem(&file)),
                    track_number: tags.track_number,
                    file,
                })
                .collect();

            Audiobook {
                id: stable_id(&folder),
                album,
                artist,
                folder,
                tracks,
            }
        })
        .collect()
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Split same-stem files into (playable, lossless source) pairs
///
/// `Lullaby.mp3` next to `Lullaby.flac` is one song owning both files. Any
/// other grouping yields one song per file.
fn pair_song_files(files: Vec<PathBuf>) -> Vec<(PathBuf, Option<PathBuf>)> {
    let mut by_stem: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        by_stem.entry(file.with_extension("")).or_default().push(file);
    }

    let mut songs = Vec::new();
    for (_, group) in by_stem {
        let (sources, playable): (Vec<PathBuf>, Vec<PathBuf>) = group
            .into_iter()
            .partition(|file| has_extension(file, SOURCE_EXTENSIONS));
        if let ([file], [original]) = (playable.as_slice(), sources.as_slice()) {
            songs.push((file.clone(), Some(original.clone())));
        } else {
            songs.extend(playable.into_iter().chain(sources).map(|file| (file, None)));
        }
    }
    songs
}

fn scan_songs(root: &Path) -> Vec<Song> {
    pair_song_files(audio_files(root))
        .into_iter()
        .map(|(file, file_original)| {
            let tags = read_tags(&file);
            Song {
                id: stable_id(&file),
                title: tags.title.unwrap_or_else(|| file_stem(&file)),
                artist: tags.artist,
                album: tags.album,
                file,
                file_original,
            }
        })
        .collect()
}
