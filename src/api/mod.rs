pub mod auth;
pub mod mock;
pub mod pkce;
pub mod youtube;

use crate::credential::Credential;
use crate::models::Visibility;
use anyhow::Result;

/// The remote operations the playlist builder needs.
/// Implementations: youtube::YouTubeProvider, mock::MockPlatform.
///
/// HTTP failures must be returned as `crate::classify::HttpError` (inside the
/// `anyhow::Error`) so the builder can classify them.
#[async_trait::async_trait]
pub trait VideoPlatform: Send + Sync {
    /// Create a new playlist and return its remote id.
    async fn create_playlist(
        &self,
        cred: &Credential,
        title: &str,
        description: &str,
        visibility: Visibility,
    ) -> Result<String>;

    /// Search for the top video-type result for `query`.
    async fn search_top_video(&self, cred: &Credential, query: &str) -> Result<Option<String>>;

    /// Append a video to the end of a playlist.
    async fn insert_playlist_item(&self, cred: &Credential, playlist_id: &str, video_id: &str) -> Result<()>;

    /// Return the platform's name (for logging)
    fn name(&self) -> &str;
}
