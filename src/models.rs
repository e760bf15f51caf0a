use serde::{Deserialize, Serialize};
use std::fmt;

pub const QUOTA_WARNING: &str =
    "YouTube API quota exceeded. Try again tomorrow or reduce the number of songs.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    pub fn from_public_flag(public: bool) -> Self {
        if public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }

    /// Value of the remote `status.privacyStatus` field.
    pub fn privacy_status(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

/// Target playlist descriptor; immutable for the duration of one build run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub visibility: Visibility,
}

impl PlaylistRequest {
    pub fn new(title: &str, description: Option<&str>, visibility: Visibility) -> anyhow::Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            anyhow::bail!("playlist title must not be empty");
        }
        Ok(Self {
            title: title.to_string(),
            description: description.unwrap_or("").to_string(),
            visibility,
        })
    }
}

/// Ordered song titles, one per non-empty input line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongQuery(Vec<String>);

impl SongQuery {
    pub fn new(songs: Vec<String>) -> Self {
        Self(songs)
    }

    /// Split free text on newlines, trimming each line and dropping blanks.
    pub fn from_text(text: &str) -> Self {
        Self(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SongQuery {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Added,
    NotFound,
    Conflict,
    ForbiddenUnknown,
    HttpError,
    QuotaExceeded,
    UnexpectedError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// 1-based position of the song in the input list
    pub sequence_index: usize,
    pub song_text: String,
    pub outcome: Outcome,
    pub detail: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let song = &self.song_text;
        match self.outcome {
            Outcome::Added => write!(f, "✓ Added: {}", song),
            Outcome::NotFound => write!(f, "✗ Not found: {}", song),
            Outcome::Conflict => write!(f, "⚠ Error 409 (conflict) for: {} - continuing...", song),
            Outcome::QuotaExceeded => write!(f, "⚠ YouTube API quota exceeded. Stopping."),
            Outcome::ForbiddenUnknown => write!(f, "⚠ Error 403 for: {} (unknown reason)", song),
            Outcome::HttpError => write!(f, "⚠ HTTP error {} for: {}", self.detail, song),
            Outcome::UnexpectedError => write!(f, "⚠ Unexpected error for {}: {}", song, self.detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
    pub playlist_id: String,
    pub added_count: usize,
    pub failed_count: usize,
    pub aborted_early: bool,
    pub log: Vec<LogEntry>,
}

impl BuildResult {
    pub fn new(playlist_id: String) -> Self {
        Self {
            playlist_id,
            added_count: 0,
            failed_count: 0,
            aborted_early: false,
            log: Vec::new(),
        }
    }

    pub fn summary(&self) -> String {
        format!("Done! {} added, {} failed", self.added_count, self.failed_count)
    }

    /// User-facing warning shown when the run stopped on quota exhaustion.
    pub fn warning(&self) -> Option<&'static str> {
        if self.aborted_early {
            Some(QUOTA_WARNING)
        } else {
            None
        }
    }

    /// Full human-readable log, headed by the created playlist id.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.log.len() + 1);
        lines.push(format!("Playlist created with ID: {}", self.playlist_id));
        lines.extend(self.log.iter().map(|e| e.to_string()));
        lines
    }
}
