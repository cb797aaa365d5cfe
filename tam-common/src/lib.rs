//! # Tonie Audio Match Common Library
//!
//! Shared code for the tonie-audio-match service:
//! - Error types
//! - Bootstrap configuration loading
//! - Domain models (creative tonies, chapters, library records)

pub mod config;
pub mod error;
pub mod models;

pub use error::{Error, Result};
