//! Tonie cloud wire types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tam_common::models::{Tonie, Track};

/// OAuth token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct Household {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Creative tonie as listed under a household
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeTonie {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub chapters: Vec<Track>,
}

impl CreativeTonie {
    pub fn into_tonie(self, household_id: &str) -> Tonie {
        Tonie {
            id: self.id,
            name: self.name,
            household_id: household_id.to_string(),
            image_url: self.image_url,
        }
    }
}

/// Body of the chapter replacement PATCH
#[derive(Debug, Serialize)]
pub struct ChapterPatch<'a> {
    pub chapters: &'a [Track],
}

/// Response of `POST /file`: where to put the bytes and the id to reference
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadTicket {
    pub file_id: String,
    pub request: PresignedRequest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PresignedRequest {
    pub url: String,
    #[serde(default)]
    pub fields: HashMap<String, String>,
}
