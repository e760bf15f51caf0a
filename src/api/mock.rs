use super::VideoPlatform;
use crate::classify::HttpError;
use crate::credential::Credential;
use crate::models::Visibility;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tracing::info;

/// Failure injected into a mock call.
#[derive(Debug, Clone)]
pub enum MockFailure {
    Http { status: u16, body: String },
    Transport(String),
}

impl MockFailure {
    pub fn conflict() -> Self {
        MockFailure::Http { status: 409, body: r#"{"error":{"code":409,"errors":[{"reason":"conflict"}]}}"#.into() }
    }

    pub fn quota_exceeded() -> Self {
        MockFailure::Http {
            status: 403,
            body: r#"{"error":{"code":403,"errors":[{"domain":"youtube.quota","reason":"quotaExceeded"}]}}"#.into(),
        }
    }

    pub fn forbidden() -> Self {
        MockFailure::Http {
            status: 403,
            body: r#"{"error":{"code":403,"errors":[{"reason":"forbidden"}]}}"#.into(),
        }
    }

    fn to_error(&self) -> anyhow::Error {
        match self {
            MockFailure::Http { status, body } => HttpError::new(*status, body.clone()).into(),
            MockFailure::Transport(msg) => anyhow!("{}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    CreatePlaylist { title: String, privacy_status: String },
    Search { query: String },
    Insert { playlist_id: String, video_id: String },
}

/// A scripted in-memory platform used in tests and for `--dry-run`.
/// Every search hits unless the query was marked missing; video ids are
/// derived from the query so scripted insert failures can be keyed by query.
#[derive(Default)]
pub struct MockPlatform {
    missing: HashSet<String>,
    search_failures: HashMap<String, MockFailure>,
    insert_failures: HashMap<String, MockFailure>,
    create_failure: Option<MockFailure>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn video_id_for(query: &str) -> String {
        format!("mock-video:{}", query)
    }

    pub fn with_missing(mut self, query: &str) -> Self {
        self.missing.insert(query.to_string());
        self
    }

    pub fn fail_search(mut self, query: &str, failure: MockFailure) -> Self {
        self.search_failures.insert(query.to_string(), failure);
        self
    }

    pub fn fail_insert(mut self, query: &str, failure: MockFailure) -> Self {
        self.insert_failures.insert(Self::video_id_for(query), failure);
        self
    }

    pub fn fail_create(mut self, failure: MockFailure) -> Self {
        self.create_failure = Some(failure);
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn search_count(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, MockCall::Search { .. })).count()
    }

    pub fn insert_count(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, MockCall::Insert { .. })).count()
    }

    fn record(&self, call: MockCall) {
        if let Ok(mut c) = self.calls.lock() {
            c.push(call);
        }
    }

    fn created_count(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, MockCall::CreatePlaylist { .. })).count()
    }
}

#[async_trait]
impl VideoPlatform for MockPlatform {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_playlist(
        &self,
        _cred: &Credential,
        title: &str,
        _description: &str,
        visibility: Visibility,
    ) -> Result<String> {
        info!("MockPlatform: create_playlist {} ({})", title, visibility.privacy_status());
        let n = self.created_count() + 1;
        self.record(MockCall::CreatePlaylist {
            title: title.to_string(),
            privacy_status: visibility.privacy_status().to_string(),
        });
        if let Some(f) = &self.create_failure {
            return Err(f.to_error());
        }
        // every call creates a distinct playlist, like the real platform
        Ok(format!("mock-playlist-{}-{}", n, title))
    }

    async fn search_top_video(&self, _cred: &Credential, query: &str) -> Result<Option<String>> {
        info!("MockPlatform: search {}", query);
        self.record(MockCall::Search { query: query.to_string() });
        if let Some(f) = self.search_failures.get(query) {
            return Err(f.to_error());
        }
        if self.missing.contains(query) {
            return Ok(None);
        }
        Ok(Some(Self::video_id_for(query)))
    }

    async fn insert_playlist_item(&self, _cred: &Credential, playlist_id: &str, video_id: &str) -> Result<()> {
        info!("MockPlatform: insert {} -> {}", video_id, playlist_id);
        self.record(MockCall::Insert {
            playlist_id: playlist_id.to_string(),
            video_id: video_id.to_string(),
        });
        if let Some(f) = self.insert_failures.get(video_id) {
            return Err(f.to_error());
        }
        Ok(())
    }
}
