//! Tonie cloud REST client
//!
//! Thin wrapper over the cloud API: household and creative tonie listing,
//! chapter fetch, full chapter replacement, and file upload through the
//! pre-signed storage request handed out by `POST /file`.

use super::types::{ChapterPatch, CreativeTonie, FileUploadTicket, Household, TokenResponse};
use super::{CloudError, RemoteContent};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::{Duration, Instant};
use tam_common::config::CloudConfig;
use tam_common::models::{Audiobook, Tonie, Track};
use tokio::sync::Mutex;

const USER_AGENT: &str = concat!("tonie-audio-match/", env!("CARGO_PKG_VERSION"));

/// Refresh this long before the token actually expires
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Tonie cloud API client
pub struct TonieCloudClient {
    http_client: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    credentials: Option<(String, String)>,
    token: Mutex<Option<CachedToken>>,
}

impl TonieCloudClient {
    pub fn new(config: &CloudConfig) -> Result<Self, CloudError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CloudError::Network(e.to_string()))?;

        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(pass)) if !user.is_empty() => Some((user.clone(), pass.clone())),
            _ => None,
        };

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            credentials,
            token: Mutex::new(None),
        })
    }

    /// Bearer token, fetched with the password grant on first use and
    /// refreshed when close to expiry
    async fn access_token(&self) -> Result<String, CloudError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_EXPIRY_MARGIN < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let (username, password) = self
            .credentials
            .as_ref()
            .ok_or_else(|| CloudError::Auth("no cloud credentials configured".to_string()))?;

        tracing::debug!(url = %self.token_url, "Requesting cloud access token");

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "password"),
                ("client_id", self.client_id.as_str()),
                ("scope", "openid"),
                ("username", username.as_str()),
                ("password", password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CloudError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CloudError::Auth(format!("token request returned {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CloudError::Parse(e.to_string()))?;

        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });

        tracing::info!("Obtained cloud access token");
        Ok(access_token)
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<Response, CloudError> {
        let token = self.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CloudError::Network(e.to_string()))?;
        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CloudError> {
        tracing::debug!(url = %url, "GET");
        let response = self.authorized(self.http_client.get(url)).await?;
        response
            .json()
            .await
            .map_err(|e| CloudError::Parse(e.to_string()))
    }

    fn tonie_url(&self, target: &Tonie) -> String {
        format!(
            "{}/households/{}/creativetonies/{}",
            self.base_url, target.household_id, target.id
        )
    }

    /// Push one local file to cloud storage, returning its remote file id
    async fn upload_file(&self, path: &Path) -> Result<String, CloudError> {
        let ticket: FileUploadTicket = self
            .authorized(self.http_client.post(format!("{}/file", self.base_url)).json(&serde_json::json!({})))
            .await?
            .json()
            .await
            .map_err(|e| CloudError::Parse(e.to_string()))?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CloudError::File(format!("{}: {}", path.display(), e)))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| ticket.file_id.clone());

        let mut form = Form::new();
        for (key, value) in &ticket.request.fields {
            form = form.text(key.clone(), value.clone());
        }
        form = form.part("file", Part::bytes(bytes).file_name(file_name));

        // Pre-signed storage request: no bearer token
        let response = self
            .http_client
            .post(&ticket.request.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CloudError::Network(e.to_string()))?;
        check_status(response).await?;

        tracing::debug!(file = %path.display(), file_id = %ticket.file_id, "Uploaded file");
        Ok(ticket.file_id)
    }
}

async fn check_status(response: Response) -> Result<Response, CloudError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::NOT_FOUND => CloudError::NotFound(url),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CloudError::Auth(format!("{} returned {}", url, status))
        }
        _ => CloudError::Api(status.as_u16(), body),
    })
}

#[async_trait]
impl RemoteContent for TonieCloudClient {
    async fn list_targets(&self) -> Result<Vec<Tonie>, CloudError> {
        let households: Vec<Household> =
            self.get_json(&format!("{}/households", self.base_url)).await?;

        let mut tonies = Vec::new();
        for household in households {
            let url = format!("{}/households/{}/creativetonies", self.base_url, household.id);
            let creative: Vec<CreativeTonie> = self.get_json(&url).await?;
            tonies.extend(creative.into_iter().map(|c| c.into_tonie(&household.id)));
        }

        tracing::debug!(count = tonies.len(), "Listed creative tonies");
        Ok(tonies)
    }

    async fn fetch_track_list(&self, target: &Tonie) -> Result<Vec<Track>, CloudError> {
        let creative: CreativeTonie = self.get_json(&self.tonie_url(target)).await?;
        Ok(creative.chapters)
    }

    async fn replace_track_list(&self, target: &Tonie, tracks: &[Track]) -> Result<(), CloudError> {
        let url = self.tonie_url(target);
        tracing::debug!(
            tonie_id = %target.id,
            chapters = tracks.len(),
            "PATCH full chapter list (last writer wins against other cloud clients)"
        );
        self.authorized(
            self.http_client
                .patch(&url)
                .json(&ChapterPatch { chapters: tracks }),
        )
        .await?;
        Ok(())
    }

    async fn put_album_on_target(
        &self,
        target: &Tonie,
        album: &Audiobook,
    ) -> Result<Vec<Track>, CloudError> {
        let mut added = Vec::with_capacity(album.tracks.len());
        for track in &album.tracks {
            let file_id = self.upload_file(&track.file).await?;
            added.push(Track::from_upload(file_id, track.title.clone()));
        }

        let mut chapters = self.fetch_track_list(target).await?;
        chapters.extend(added.iter().cloned());
        self.replace_track_list(target, &chapters).await?;

        tracing::info!(
            tonie_id = %target.id,
            album = %album.album,
            added = added.len(),
            "Put album on tonie"
        );
        Ok(added)
    }
}
