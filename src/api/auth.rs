use super::pkce;
use crate::config::Config;
use crate::credential::{ClientSecrets, Credential};
use crate::db;
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;
use url::Url;

/// Manual OAuth helper for Google:
/// 1. Build the consent URL (offline access, PKCE) and print it.
/// 2. User approves and is redirected to the redirect URI (which may fail to load).
/// 3. User pastes the full redirect URL back into the CLI.
/// 4. The `code` is checked against `state` and exchanged for tokens.
/// 5. The resulting credential is stored in the DB.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    scope: Option<String>,
}

/// Everything needed to finish the flow once the user comes back.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub url: Url,
    pub state: String,
    pub code_verifier: String,
}

pub fn authorization_url(secrets: &ClientSecrets, redirect_uri: &str, scopes: &[String]) -> Result<AuthSession> {
    let state = pkce::generate_state();
    let code_verifier = pkce::generate_code_verifier();
    let mut url = Url::parse(&secrets.auth_uri)?;
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &secrets.client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", &scopes.join(" "))
        .append_pair("access_type", "offline")
        .append_pair("include_granted_scopes", "true")
        .append_pair("prompt", "consent")
        .append_pair("state", &state)
        .append_pair("code_challenge", &pkce::code_challenge_s256(&code_verifier))
        .append_pair("code_challenge_method", "S256");
    Ok(AuthSession { url, state, code_verifier })
}

/// Pull the authorization code out of the pasted redirect URL.
pub fn extract_code(redirect_url: &str, expected_state: &str) -> Result<String> {
    let parsed = Url::parse(redirect_url.trim()).map_err(|e| anyhow!("invalid url pasted: {}", e))?;
    let param = |name: &str| {
        parsed
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    };
    if let Some(err) = param("error") {
        return Err(anyhow!("authorization denied: {}", err));
    }
    match param("state") {
        Some(s) if s == expected_state => {}
        Some(_) => return Err(anyhow!("state mismatch in redirect URL")),
        None => return Err(anyhow!("no state in redirect URL")),
    }
    param("code").ok_or_else(|| anyhow!("no code in redirect URL"))
}

pub async fn exchange_code(
    secrets: &ClientSecrets,
    code: &str,
    code_verifier: &str,
    redirect_uri: &str,
    scopes: &[String],
) -> Result<Credential> {
    let client = Client::new();
    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("code_verifier", code_verifier),
        ("redirect_uri", redirect_uri),
        ("client_id", secrets.client_id.as_str()),
        ("client_secret", secrets.client_secret.as_str()),
    ];
    let resp = client.post(&secrets.token_uri).form(&params).send().await?;
    let status = resp.status();
    if !status.is_success() {
        let txt = resp.text().await.unwrap_or_default();
        return Err(anyhow!("token exchange failed: {} => {}", status, txt));
    }

    let tr: TokenResponse = resp.json().await?;
    let expires_at = tr.expires_in.map(|e| chrono::Utc::now().timestamp() + e);
    let granted = match tr.scope {
        Some(s) => s.split_whitespace().map(String::from).collect(),
        None => scopes.to_vec(),
    };
    Ok(Credential {
        access_token: tr.access_token,
        refresh_token: tr.refresh_token,
        token_uri: secrets.token_uri.clone(),
        client_id: secrets.client_id.clone(),
        client_secret: secrets.client_secret.clone(),
        scopes: granted,
        expires_at,
    })
}

pub async fn run_youtube_auth(cfg: &Config) -> Result<()> {
    let secrets = ClientSecrets::resolve(cfg.client_secrets_file.as_deref())?;
    let session = authorization_url(&secrets, &cfg.redirect_uri, &cfg.scopes)?;

    println!(
        "Open this URL in your browser and authorize the application:\n\n{}\n",
        session.url
    );
    println!("After authorizing, you'll be redirected to your redirect URI. Copy the full redirect URL and paste it here.");
    println!("Paste redirect URL:");
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let code = extract_code(&input, &session.state)?;

    let cred = exchange_code(&secrets, &code, &session.code_verifier, &cfg.redirect_uri, &cfg.scopes).await?;
    if cred.refresh_token.is_none() {
        log::warn!("Google returned no refresh token; the credential will stop working once it expires");
    }

    let db_path = cfg.db_path.clone();
    tokio::task::spawn_blocking(move || -> Result<(), anyhow::Error> {
        let conn = db::open_or_create(&db_path)
            .with_context(|| format!("opening DB at {}", db_path.display()))?;
        db::save_credential(&conn, &cred)?;
        Ok(())
    })
    .await??;

    info!("YouTube credential saved to DB");
    println!("Authenticated successfully. You can now run `build`.");
    Ok(())
}
