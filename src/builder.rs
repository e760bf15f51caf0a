//! Playlist build orchestration: create the playlist, then search and insert
//! each song in order, classifying per-song failures.
use crate::api::VideoPlatform;
use crate::classify::{classify, ErrorKind};
use crate::credential::Credential;
use crate::models::{BuildResult, LogEntry, Outcome, PlaylistRequest, SongQuery};
use crate::pacing::Pacing;

/// Failures that end a run before any per-song work is reported.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no credential available; authenticate first")]
    MissingCredential,
    #[error("failed to create playlist: {0:#}")]
    PlaylistCreation(anyhow::Error),
}

/// Build with the default pacing: a fixed 1s pause between songs when
/// `throttle` is set.
pub async fn build(
    platform: &dyn VideoPlatform,
    request: &PlaylistRequest,
    songs: &SongQuery,
    artist: &str,
    throttle: bool,
    credential: Option<&Credential>,
) -> Result<BuildResult, BuildError> {
    let pacing = Pacing::from_throttle(throttle);
    build_with_pacing(platform, request, songs, artist, &pacing, credential).await
}

pub async fn build_with_pacing(
    platform: &dyn VideoPlatform,
    request: &PlaylistRequest,
    songs: &SongQuery,
    artist: &str,
    pacing: &Pacing,
    credential: Option<&Credential>,
) -> Result<BuildResult, BuildError> {
    let cred = credential.ok_or(BuildError::MissingCredential)?;

    pacing.before_request().await;
    let playlist_id = platform
        .create_playlist(cred, &request.title, &request.description, request.visibility)
        .await
        .map_err(BuildError::PlaylistCreation)?;
    log::info!("Playlist created with ID: {} on {}", playlist_id, platform.name());

    let mut result = BuildResult::new(playlist_id);
    let total = songs.len();

    for (i, song) in songs.iter().enumerate() {
        let index = i + 1;
        log::info!("Processing song {}/{}: {}", index, total, song);

        let entry = match process_song(platform, pacing, cred, &result.playlist_id, artist, song).await {
            Ok(true) => {
                result.added_count += 1;
                log_entry(index, song, Outcome::Added, String::new())
            }
            Ok(false) => {
                result.failed_count += 1;
                log_entry(
                    index,
                    song,
                    Outcome::NotFound,
                    format!("no video found for '{} {}'", artist, song),
                )
            }
            Err(kind) => {
                if kind.aborts_run() {
                    let e = log_entry(index, song, kind.outcome(), kind.detail());
                    log::warn!("{}", e);
                    result.log.push(e);
                    result.aborted_early = true;
                    break;
                }
                result.failed_count += 1;
                log_entry(index, song, kind.outcome(), kind.detail())
            }
        };
        log::info!("{}", entry);
        result.log.push(entry);

        if index < total {
            pacing.between_songs().await;
        }
    }

    log::info!("{}", result.summary());
    Ok(result)
}

/// Search then insert one song. `Ok(false)` means the search had no hit.
async fn process_song(
    platform: &dyn VideoPlatform,
    pacing: &Pacing,
    cred: &Credential,
    playlist_id: &str,
    artist: &str,
    song: &str,
) -> Result<bool, ErrorKind> {
    let query = format!("{} {}", artist, song);
    pacing.before_request().await;
    let video_id = match platform.search_top_video(cred, &query).await {
        Ok(Some(v)) => v,
        Ok(None) => return Ok(false),
        Err(e) => return Err(classify(&e)),
    };
    pacing.before_request().await;
    platform
        .insert_playlist_item(cred, playlist_id, &video_id)
        .await
        .map_err(|e| classify(&e))?;
    Ok(true)
}

fn log_entry(index: usize, song: &str, outcome: Outcome, detail: String) -> LogEntry {
    LogEntry {
        sequence_index: index,
        song_text: song.to_string(),
        outcome,
        detail,
    }
}
