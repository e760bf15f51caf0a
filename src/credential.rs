use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Bearer credential bundle produced by the authorization-code exchange.
/// Callers own it; the builder and providers only borrow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// epoch seconds; None when the issuer did not report an expiry
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl Credential {
    /// True when the access token is expired or within 30s of expiry.
    pub fn is_expired(&self, now: i64) -> bool {
        match self.expires_at {
            Some(exp) => now + 30 >= exp,
            None => false,
        }
    }

    pub fn is_expired_now(&self) -> bool {
        self.is_expired(Utc::now().timestamp())
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().map_or(false, |t| !t.is_empty())
    }
}

/// OAuth client registration from a Google `credentials.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String { GOOGLE_AUTH_URI.into() }
fn default_token_uri() -> String { GOOGLE_TOKEN_URI.into() }

#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse either the `installed` or the `web` flavour of the secrets JSON.
    pub fn from_json(s: &str) -> Result<Self> {
        let f: SecretsFile = serde_json::from_str(s).context("parse client secrets json")?;
        f.installed
            .or(f.web)
            .ok_or_else(|| anyhow!("client secrets json has neither 'installed' nor 'web' section"))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading client secrets from {}", path.display()))?;
        Self::from_json(&s)
    }

    /// Resolve secrets from the configured file, falling back to the
    /// `GOOGLE_CREDENTIALS` env var holding the same JSON.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(p) = path {
            if p.exists() {
                return Self::from_path(p);
            }
            log::warn!("client secrets file {} not found; trying GOOGLE_CREDENTIALS", p.display());
        }
        let raw = std::env::var("GOOGLE_CREDENTIALS")
            .map_err(|_| anyhow!("no client secrets file and GOOGLE_CREDENTIALS is not set"))?;
        Self::from_json(&raw)
    }
}
