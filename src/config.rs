use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // path to database file holding the stored credential
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Google OAuth client secrets (`credentials.json`). When unset the
    /// `GOOGLE_CREDENTIALS` env var is consulted instead.
    #[serde(default)]
    pub client_secrets_file: Option<PathBuf>,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    // Pacing between songs
    #[serde(default = "default_throttle")]
    pub throttle: bool,
    /// One of "fixed", "none", "token_bucket".
    #[serde(default = "default_pacing")]
    pub pacing: String,
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

fn default_db_path() -> PathBuf { "/var/lib/yt-playlist-builder/builder.db".into() }
fn default_log_dir() -> PathBuf { "/var/log/yt-playlist-builder".into() }
fn default_redirect_uri() -> String { "http://localhost:5000/oauth2callback".into() }
fn default_scopes() -> Vec<String> {
    vec!["https://www.googleapis.com/auth/youtube.force-ssl".to_string()]
}
fn default_throttle() -> bool { true }
fn default_pacing() -> String { "fixed".into() }
fn default_throttle_ms() -> u64 { 1000 }
fn default_requests_per_second() -> u32 { 1 }

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_dir: default_log_dir(),
            client_secrets_file: None,
            redirect_uri: default_redirect_uri(),
            scopes: default_scopes(),
            throttle: default_throttle(),
            pacing: default_pacing(),
            throttle_ms: default_throttle_ms(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

impl Config {
    pub fn from_path(path: &std::path::Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the builder cannot act on.
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.pacing.as_str() {
            "fixed" | "none" => {}
            "token_bucket" => {
                if self.requests_per_second == 0 {
                    anyhow::bail!("requests_per_second must be > 0 for token_bucket pacing");
                }
            }
            other => anyhow::bail!("unknown pacing mode '{}'", other),
        }
        if self.scopes.is_empty() {
            anyhow::bail!("at least one OAuth scope is required");
        }
        Ok(())
    }
}
