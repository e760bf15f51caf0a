use super::VideoPlatform;
use crate::classify::HttpError;
use crate::credential::Credential;
use crate::models::Visibility;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::json;
use std::env;

/// Access token obtained by refreshing a borrowed credential. Cached here so
/// the caller's `Credential` is never mutated.
#[derive(Debug, Clone)]
struct RefreshedToken {
    refresh_token: String,
    access_token: String,
    expires_at: i64,
}

/// YouTube Data API v3 backed platform.
/// The API base may be overridden by the YOUTUBE_API_BASE env var or
/// `with_base_url` (useful for tests).
pub struct YouTubeProvider {
    client: Client,
    api_base: String,
    refreshed: tokio::sync::Mutex<Option<RefreshedToken>>,
}

impl Default for YouTubeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl YouTubeProvider {
    pub fn new() -> Self {
        Self::with_base_url(Self::default_api_base())
    }

    pub fn with_base_url(api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            refreshed: tokio::sync::Mutex::new(None),
        }
    }

    fn default_api_base() -> String {
        env::var("YOUTUBE_API_BASE").unwrap_or_else(|_| "https://www.googleapis.com/youtube/v3".into())
    }

    fn name(&self) -> &str {
        "youtube"
    }

    async fn refresh_token_internal(&self, cred: &Credential) -> Result<RefreshedToken> {
        let refresh_token = cred
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("access token expired and no refresh token available"))?;
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", cred.client_id.as_str()),
            ("client_secret", cred.client_secret.as_str()),
        ];
        let resp = self
            .client
            .post(&cred.token_uri)
            .form(&params)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Failed to refresh token: {} - {}", status, body));
        }
        let j: serde_json::Value = resp.json().await?;
        let access_token = j["access_token"]
            .as_str()
            .ok_or_else(|| anyhow!("no access_token"))?
            .to_string();
        let expires_in = j["expires_in"].as_i64().unwrap_or(3600);
        debug!("Refreshed YouTube access token (expires in {}s)", expires_in);
        Ok(RefreshedToken {
            refresh_token,
            access_token,
            expires_at: Utc::now().timestamp() + expires_in,
        })
    }

    /// Bearer header value for `cred`, refreshing when it is near expiry
    /// (or unconditionally when `force_refresh`).
    async fn get_bearer(&self, cred: &Credential, force_refresh: bool) -> Result<String> {
        let mut lock = self.refreshed.lock().await;
        let now = Utc::now().timestamp();
        if !force_refresh {
            if let Some(t) = lock.as_ref() {
                let same_cred = cred.refresh_token.as_deref() == Some(t.refresh_token.as_str());
                if same_cred && now + 30 < t.expires_at {
                    return Ok(format!("Bearer {}", t.access_token));
                }
            }
            if !cred.is_expired(now) {
                return Ok(format!("Bearer {}", cred.access_token));
            }
            debug!("YouTube access token is near expiry, refreshing");
        }
        let fresh = self.refresh_token_internal(cred).await?;
        let bearer = format!("Bearer {}", fresh.access_token);
        *lock = Some(fresh);
        Ok(bearer)
    }

    /// Send an authorized request; on 401 refresh once and retry. Any other
    /// non-2xx status becomes an `HttpError`.
    async fn send_authorized<F>(&self, cred: &Credential, build: F) -> Result<Response>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let bearer = self.get_bearer(cred, false).await?;
        let mut resp = build(&bearer).send().await?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED && cred.can_refresh() {
            warn!("Got 401 from YouTube; attempting token refresh");
            let bearer2 = self.get_bearer(cred, true).await?;
            resp = build(&bearer2).send().await?;
        }
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(HttpError::new(status.as_u16(), body).into());
        }
        Ok(resp)
    }
}

#[async_trait]
impl VideoPlatform for YouTubeProvider {
    fn name(&self) -> &str {
        YouTubeProvider::name(self)
    }

    async fn create_playlist(
        &self,
        cred: &Credential,
        title: &str,
        description: &str,
        visibility: Visibility,
    ) -> Result<String> {
        let url = format!("{}/playlists?part=snippet,status", self.api_base);
        let body = json!({
            "snippet": { "title": title, "description": description },
            "status": { "privacyStatus": visibility.privacy_status() }
        });
        let resp = self
            .send_authorized(cred, |bearer| {
                self.client
                    .post(&url)
                    .header(AUTHORIZATION, bearer)
                    .header(CONTENT_TYPE, "application/json")
                    .json(&body)
            })
            .await?;
        let j: serde_json::Value = resp.json().await?;
        let id = j["id"]
            .as_str()
            .ok_or_else(|| anyhow!("no id in create playlist response"))?
            .to_string();
        Ok(id)
    }

    async fn search_top_video(&self, cred: &Credential, query: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/search?part=snippet&maxResults=1&type=video&q={}",
            self.api_base,
            urlencoding::encode(query)
        );
        let resp = self
            .send_authorized(cred, |bearer| {
                self.client
                    .get(&url)
                    .header(AUTHORIZATION, bearer)
                    .header(ACCEPT, "application/json")
            })
            .await?;
        let j: serde_json::Value = resp.json().await?;
        if let Some(first) = j["items"].as_array().and_then(|a| a.first()) {
            let video_id = first["id"]["videoId"]
                .as_str()
                .ok_or_else(|| anyhow!("search result has no videoId"))?;
            return Ok(Some(video_id.to_string()));
        }
        Ok(None)
    }

    async fn insert_playlist_item(&self, cred: &Credential, playlist_id: &str, video_id: &str) -> Result<()> {
        let url = format!("{}/playlistItems?part=snippet", self.api_base);
        let body = json!({
            "snippet": {
                "playlistId": playlist_id,
                "resourceId": { "kind": "youtube#video", "videoId": video_id }
            }
        });
        self.send_authorized(cred, |bearer| {
            self.client
                .post(&url)
                .header(AUTHORIZATION, bearer)
                .header(CONTENT_TYPE, "application/json")
                .json(&body)
        })
        .await?;
        Ok(())
    }
}
