//! Tonie/audiobook pairing for album uploads

use serde::Serialize;
use tam_common::models::{Audiobook, Tonie};

use super::resolver::{resolve, IdentifierKind, RawIds, Resolution};
use super::ReconcileError;

/// A validated pairing: exactly one tonie, exactly one audiobook
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub tonie: Tonie,
    pub audiobook: Audiobook,
}

/// Compact description of an upload for responses
#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    pub tonie_id: String,
    pub tonie_name: String,
    pub audiobook_id: String,
    pub album: String,
    pub artist: Option<String>,
}

impl Upload {
    /// Pair the tonie and audiobook named by the request
    ///
    /// Fails when either id is missing, names more than one item, or does
    /// not match anything.
    pub fn from_ids(
        tonie_id: &RawIds,
        audiobook_id: &RawIds,
        tonies: &[Tonie],
        audiobooks: &[Audiobook],
    ) -> Result<Self, ReconcileError> {
        let tonie = exactly_one(resolve(tonie_id, None, tonies), IdentifierKind::TargetId)?;
        let audiobook = exactly_one(
            resolve(audiobook_id, None, audiobooks),
            IdentifierKind::AudiobookId,
        )?;

        if audiobook.tracks.is_empty() {
            return Err(ReconcileError::InvalidRequest(format!(
                "Audiobook {} has no tracks",
                audiobook.id
            )));
        }

        Ok(Self { tonie, audiobook })
    }

    pub fn summary(&self) -> UploadSummary {
        UploadSummary {
            tonie_id: self.tonie.id.clone(),
            tonie_name: self.tonie.name.clone(),
            audiobook_id: self.audiobook.id.clone(),
            album: self.audiobook.album.clone(),
            artist: self.audiobook.artist.clone(),
        }
    }
}

fn exactly_one<T>(resolution: Resolution<T>, kind: IdentifierKind) -> Result<T, ReconcileError> {
    let key = kind.key();
    match resolution {
        Resolution::Resolved(mut items) if items.len() == 1 => Ok(items.remove(0)),
        Resolution::Resolved(_) => Err(ReconcileError::InvalidRequest(format!(
            "{} must name exactly one item",
            key
        ))),
        Resolution::NotFound => Err(ReconcileError::InvalidRequest(format!(
            "{} does not match any known item",
            key
        ))),
        Resolution::NotProvided => Err(ReconcileError::InvalidRequest(format!("{} is required", key))),
    }
}
