//! Tonie chapter reconciliation
//!
//! The cloud only supports replacing a tonie's whole chapter list. Every
//! mutation therefore runs as: lock the tonie, fetch a fresh snapshot, build
//! the new list from it, replace. Snapshots are never cached across
//! requests. Identifier and single-tonie checks happen before the first
//! remote mutation, and a failed remote call is reported as-is without
//! retries or compensation.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tam_common::models::{Tonie, Track};
use tracing::{debug, info, warn};

use super::backing_files::BackingFiles;
use super::library::{file_references, FileReference, LocalLibrary};
use super::pruner::{LocalTrackPruner, PruneOutcome};
use super::resolver::{resolve, RawIds, Resolution};
use super::target_locks::TargetLocks;
use super::upload::{Upload, UploadSummary};
use super::{ReconcileError, MULTIPLE_TONIES, NO_MATCHING_TONIE, NO_MATCHING_TRACK};
use crate::cloud::RemoteContent;

/// What an absent `tonie_id` stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetDefault {
    /// Absent means not provided
    Nothing,
    /// Absent means every tonie on the account
    AllTonies,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub tonie_id: String,
    /// Removed chapter ids in request order, each once
    pub track_ids: Vec<String>,
    /// Chapters left on the tonie
    pub remaining: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub upload: UploadSummary,
    /// Chapters appended to the tonie
    pub tracks: Vec<Track>,
}

/// Orchestrates identifier resolution, remote edits and local cleanup
pub struct Reconciler {
    remote: Arc<dyn RemoteContent>,
    library: Arc<dyn LocalLibrary>,
    pruner: LocalTrackPruner,
    locks: TargetLocks,
    backing: BackingFiles,
    prune_on_delete: bool,
}

impl Reconciler {
    pub fn new(remote: Arc<dyn RemoteContent>, library: Arc<dyn LocalLibrary>) -> Self {
        Self {
            remote,
            library,
            pruner: LocalTrackPruner::new(),
            locks: TargetLocks::new(),
            backing: BackingFiles::new(),
            prune_on_delete: true,
        }
    }

    /// Enable or disable removing local backing files after remote deletes
    pub fn with_local_pruning(mut self, enabled: bool) -> Self {
        self.prune_on_delete = enabled;
        self
    }

    pub fn remote(&self) -> &Arc<dyn RemoteContent> {
        &self.remote
    }

    pub fn library(&self) -> &Arc<dyn LocalLibrary> {
        &self.library
    }

    /// Local source files of the chapters uploaded through this reconciler
    pub fn backing_files(&self) -> &BackingFiles {
        &self.backing
    }

    /// Resolve a `tonie_id` field against the account's tonie catalog
    pub async fn resolve_targets(
        &self,
        raw: &RawIds,
        default: TargetDefault,
    ) -> Result<Resolution<Tonie>, ReconcileError> {
        let catalog = self.remote.list_targets().await?;
        let all_ids: Vec<String>;
        let default_ids = match default {
            TargetDefault::Nothing => None,
            TargetDefault::AllTonies => {
                all_ids = catalog.iter().map(|t| t.id.clone()).collect();
                Some(all_ids.as_slice())
            }
        };
        Ok(resolve(raw, default_ids, &catalog))
    }

    /// Current chapters of every resolved tonie, keyed by tonie id
    pub async fn overview(
        &self,
        targets: Resolution<Tonie>,
    ) -> Result<BTreeMap<String, Vec<Track>>, ReconcileError> {
        let targets = match targets {
            Resolution::Resolved(targets) => targets,
            Resolution::NotFound | Resolution::NotProvided => {
                return Err(ReconcileError::NotFound(NO_MATCHING_TONIE.to_string()))
            }
        };

        let mut overview = BTreeMap::new();
        for target in targets {
            if overview.contains_key(&target.id) {
                continue;
            }
            let tracks = self.remote.fetch_track_list(&target).await?;
            debug!(tonie_id = %target.id, chapters = tracks.len(), "Fetched chapters");
            overview.insert(target.id, tracks);
        }
        Ok(overview)
    }

    /// Remove chapters from exactly one tonie
    ///
    /// Every requested id must be present in the freshly fetched list,
    /// otherwise nothing is submitted and `NotFound` is returned.
    pub async fn delete_track(
        &self,
        targets: Resolution<Tonie>,
        track_ids: &RawIds,
    ) -> Result<DeleteOutcome, ReconcileError> {
        let target = single_target(targets)?;
        if *track_ids == RawIds::Absent {
            return Err(ReconcileError::InvalidRequest("track_id is required".to_string()));
        }

        let guard = self.locks.acquire(&target.id).await;

        let snapshot = self.remote.fetch_track_list(&target).await?;
        let removed = match resolve(track_ids, None, &snapshot) {
            Resolution::Resolved(tracks) => unique_by_id(tracks),
            Resolution::NotFound | Resolution::NotProvided => {
                return Err(ReconcileError::NotFound(NO_MATCHING_TRACK.to_string()))
            }
        };

        let removed_ids: BTreeSet<&str> = removed.iter().map(|t| t.id.as_str()).collect();
        let remaining: Vec<Track> = snapshot
            .iter()
            .filter(|t| !removed_ids.contains(t.id.as_str()))
            .cloned()
            .collect();

        self.remote.replace_track_list(&target, &remaining).await?;
        drop(guard);

        info!(
            tonie_id = %target.id,
            removed = removed.len(),
            remaining = remaining.len(),
            "Deleted chapters from tonie"
        );

        if self.prune_on_delete {
            self.prune_removed(&removed, &remaining).await;
        }

        Ok(DeleteOutcome {
            tonie_id: target.id,
            track_ids: removed.into_iter().map(|t| t.id).collect(),
            remaining: remaining.len(),
        })
    }

    /// Upload an audiobook from the local library onto one tonie
    pub async fn upload_album(
        &self,
        tonie_id: &RawIds,
        audiobook_id: &RawIds,
    ) -> Result<UploadOutcome, ReconcileError> {
        let tonies = self.remote.list_targets().await?;
        let audiobooks = self.library.audiobooks().await?;
        let upload = Upload::from_ids(tonie_id, audiobook_id, &tonies, &audiobooks)?;

        let _guard = self.locks.acquire(&upload.tonie.id).await;
        let tracks = self
            .remote
            .put_album_on_target(&upload.tonie, &upload.audiobook)
            .await?;
        for (chapter, source) in tracks.iter().zip(&upload.audiobook.tracks) {
            self.backing.record(&chapter.file, &source.file);
        }

        info!(
            tonie_id = %upload.tonie.id,
            audiobook_id = %upload.audiobook.id,
            tracks = tracks.len(),
            "Uploaded audiobook to tonie"
        );

        Ok(UploadOutcome {
            upload: upload.summary(),
            tracks,
        })
    }

    /// Remove a library file and any sibling files its record owns
    ///
    /// Files still referenced by another library record are kept. Never
    /// fails: problems are logged and the affected file is skipped.
    pub async fn delete_local_track(&self, file: &Path) -> Vec<(PathBuf, PruneOutcome)> {
        if !self.library.contains(file) {
            warn!(file = %file.display(), "Refusing to delete file outside the library folders");
            return Vec::new();
        }

        let references = match self.library_references().await {
            Some(references) => references,
            None => {
                warn!(file = %file.display(), "Library listing unavailable, deleting only the requested file");
                return self.prune_all(&[file.to_path_buf()], &[], &BTreeSet::new()).await;
            }
        };

        let owners: BTreeSet<String> = references
            .iter()
            .filter(|r| r.file == file)
            .map(|r| r.record_id.clone())
            .collect();

        let mut candidates = vec![file.to_path_buf()];
        let songs = match self.library.songs().await {
            Ok(songs) => songs,
            Err(e) => {
                warn!("Failed to list songs: {}", e);
                Vec::new()
            }
        };
        for song in songs.iter().filter(|s| owners.contains(&s.id)) {
            for owned in song.files() {
                if !candidates.iter().any(|c| c == owned) {
                    candidates.push(owned.to_path_buf());
                }
            }
        }

        self.prune_all(&candidates, &references, &owners).await
    }

    /// Prune each candidate unless a record outside `owners` references it
    async fn prune_all(
        &self,
        candidates: &[PathBuf],
        references: &[FileReference],
        owners: &BTreeSet<String>,
    ) -> Vec<(PathBuf, PruneOutcome)> {
        let mut outcomes = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let outcome = if referenced_elsewhere(candidate, owners, references) {
                info!(file = %candidate.display(), "Keeping file still referenced by another record");
                PruneOutcome::StillReferenced
            } else {
                match self.pruner.prune(candidate).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("{}", e);
                        continue;
                    }
                }
            };
            outcomes.push((candidate.clone(), outcome));
        }
        outcomes
    }

    async fn library_references(&self) -> Option<Vec<FileReference>> {
        let audiobooks = self.library.audiobooks().await;
        let songs = self.library.songs().await;
        match (audiobooks, songs) {
            (Ok(audiobooks), Ok(songs)) => Some(file_references(&audiobooks, &songs)),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Failed to list local library: {}", e);
                None
            }
        }
    }

    /// Best-effort removal of the local files behind deleted chapters
    ///
    /// Only chapters whose local source was recorded at upload time are
    /// considered. A file is kept while a remaining chapter on the tonie
    /// still points at the same remote file.
    async fn prune_removed(&self, removed: &[Track], remaining: &[Track]) {
        for track in removed {
            if track.file.is_empty() || remaining.iter().any(|t| t.file == track.file) {
                continue;
            }

            let Some(file) = self.backing.release(&track.file) else {
                debug!(chapter = %track.id, "No known local file for removed chapter");
                continue;
            };
            if !self.library.contains(&file) {
                warn!(file = %file.display(), "Backing file is outside the library folders, keeping it");
                continue;
            }

            self.prune_all(&[file], &[], &BTreeSet::new()).await;
        }
    }
}

fn single_target(targets: Resolution<Tonie>) -> Result<Tonie, ReconcileError> {
    match targets {
        Resolution::Resolved(mut targets) if targets.len() == 1 => Ok(targets.remove(0)),
        Resolution::Resolved(_) => Err(ReconcileError::InvalidRequest(MULTIPLE_TONIES.to_string())),
        Resolution::NotFound | Resolution::NotProvided => {
            Err(ReconcileError::NotFound(NO_MATCHING_TONIE.to_string()))
        }
    }
}

fn unique_by_id(tracks: Vec<Track>) -> Vec<Track> {
    let mut seen = BTreeSet::new();
    tracks
        .into_iter()
        .filter(|t| seen.insert(t.id.clone()))
        .collect()
}

fn referenced_elsewhere(
    file: &Path,
    owners: &BTreeSet<String>,
    references: &[FileReference],
) -> bool {
    references
        .iter()
        .any(|r| r.file == file && !owners.contains(&r.record_id))
}
