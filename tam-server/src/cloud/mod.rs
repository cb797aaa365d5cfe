//! Remote content service boundary
//!
//! The reconciler depends only on [`RemoteContent`]. The cloud offers no
//! partial update: a tonie's chapters can only be replaced as a whole list,
//! so callers must fetch, edit and replace.

pub mod client;
pub mod types;

pub use client::TonieCloudClient;

use async_trait::async_trait;
use tam_common::models::{Audiobook, Tonie, Track};
use thiserror::Error;

/// Remote content service errors
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Local file error: {0}")]
    File(String),
}

/// Operations the reconciler needs from the remote content service
///
/// None of these are atomic with each other. `replace_track_list` and
/// `put_album_on_target` are not idempotent and must never be retried
/// blindly.
#[async_trait]
pub trait RemoteContent: Send + Sync {
    /// All creative tonies across the account's households
    async fn list_targets(&self) -> Result<Vec<Tonie>, CloudError>;

    /// Current ordered chapter list of a tonie
    async fn fetch_track_list(&self, target: &Tonie) -> Result<Vec<Track>, CloudError>;

    /// Replace the tonie's chapter list with `tracks`
    async fn replace_track_list(&self, target: &Tonie, tracks: &[Track]) -> Result<(), CloudError>;

    /// Upload every track of `album` and append them to the tonie
    ///
    /// Returns the chapters that were appended, in album track order.
    async fn put_album_on_target(
        &self,
        target: &Tonie,
        album: &Audiobook,
    ) -> Result<Vec<Track>, CloudError>;
}
