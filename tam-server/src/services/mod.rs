//! Track reconciliation services
//!
//! - [`resolver`]: request identifiers to tonie / track handles
//! - [`reconciler`]: fetch, edit and replace tonie chapter lists
//! - [`upload`]: pairing of a tonie with an audiobook
//! - [`pruner`]: local file removal
//! - [`backing_files`]: local source files of uploaded chapters
//! - [`library`]: local media library listing
//! - [`target_locks`]: per-tonie serialization

pub mod backing_files;
pub mod library;
pub mod pruner;
pub mod reconciler;
pub mod resolver;
pub mod target_locks;
pub mod upload;

pub use backing_files::BackingFiles;
pub use library::{DirectoryLibrary, LibraryError, LocalLibrary};
pub use pruner::{LocalTrackPruner, PruneError, PruneOutcome};
pub use reconciler::{DeleteOutcome, Reconciler, UploadOutcome};
pub use resolver::{extract_ids, IdentifierKind, RawIds, Resolution};
pub use target_locks::{TargetGuard, TargetLocks};
pub use upload::Upload;

use crate::cloud::CloudError;
use thiserror::Error;

pub const NO_MATCHING_TONIE: &str = "No matching tonie found";
pub const MULTIPLE_TONIES: &str = "Multiple tonies provided, can only handle one";
pub const NO_MATCHING_TRACK: &str = "No matching track found";

/// Reconciliation failures, in the order they can occur during a request
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Identifiers resolved to nothing
    #[error("{0}")]
    NotFound(String),

    /// Well-formed request that cannot be carried out as asked
    #[error("{0}")]
    InvalidRequest(String),

    /// Remote call failed after being issued; not retried
    #[error("Remote content service failure: {0}")]
    RemoteFailure(#[from] CloudError),

    #[error(transparent)]
    Library(#[from] LibraryError),
}
