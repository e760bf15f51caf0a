use crate::api::mock::MockPlatform;
use crate::api::youtube::YouTubeProvider;
use crate::api::VideoPlatform;
use crate::builder;
use crate::config::Config;
use crate::credential::Credential;
use crate::db;
use crate::models::{BuildResult, PlaylistRequest, SongQuery, Visibility};
use crate::pacing::Pacing;
use anyhow::{anyhow, Context, Result};

/// Raw user input for one build, as collected by the CLI.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub title: String,
    pub description: Option<String>,
    pub artist: String,
    pub public: bool,
    pub throttle: bool,
    pub songs_text: String,
    pub dry_run: bool,
}

/// Validated inputs ready for the builder.
#[derive(Debug, Clone)]
pub struct ValidatedInput {
    pub request: PlaylistRequest,
    pub songs: SongQuery,
    pub artist: String,
}

pub fn validate(opts: &BuildOptions) -> Result<ValidatedInput> {
    let songs = SongQuery::from_text(&opts.songs_text);
    let artist = opts.artist.trim();
    if opts.title.trim().is_empty() || artist.is_empty() || songs.is_empty() {
        return Err(anyhow!("fill in all fields: title, artist and at least one song are required"));
    }
    let request = PlaylistRequest::new(
        &opts.title,
        opts.description.as_deref(),
        Visibility::from_public_flag(opts.public),
    )?;
    Ok(ValidatedInput {
        request,
        songs,
        artist: artist.to_string(),
    })
}

async fn load_stored_credential(cfg: &Config) -> Result<Option<Credential>> {
    let db_path = cfg.db_path.clone();
    tokio::task::spawn_blocking(move || -> Result<Option<Credential>, anyhow::Error> {
        let path_display = db_path.display().to_string();
        let conn = db::open_or_create(&db_path)
            .with_context(|| format!("opening DB for loading credential at {}", path_display))?;
        db::load_credential(&conn)
    })
    .await?
}

fn dry_run_credential() -> Credential {
    Credential {
        access_token: "dry-run".into(),
        refresh_token: None,
        token_uri: String::new(),
        client_id: String::new(),
        client_secret: String::new(),
        scopes: Vec::new(),
        expires_at: None,
    }
}

/// Validate input, pick the platform and credential, and run one build.
pub async fn run_build(cfg: &Config, opts: &BuildOptions) -> Result<BuildResult> {
    let input = validate(opts)?;
    let pacing = Pacing::from_config(cfg, opts.throttle);

    let (platform, credential): (Box<dyn VideoPlatform>, Option<Credential>) = if opts.dry_run {
        log::info!("Dry run: using mock platform");
        (Box::new(MockPlatform::new()) as Box<dyn VideoPlatform>, Some(dry_run_credential()))
    } else {
        let cred = load_stored_credential(cfg).await?;
        if cred.is_none() {
            log::warn!("No stored YouTube credential; run `auth` first");
        }
        (Box::new(YouTubeProvider::new()) as Box<dyn VideoPlatform>, cred)
    };

    log::info!(
        "Building '{}' ({}) with {} songs by {} using {:?}",
        input.request.title,
        input.request.visibility.privacy_status(),
        input.songs.len(),
        input.artist,
        pacing
    );
    let result = builder::build_with_pacing(
        platform.as_ref(),
        &input.request,
        &input.songs,
        &input.artist,
        &pacing,
        credential.as_ref(),
    )
    .await?;
    Ok(result)
}

/// Remove the stored credential. Returns true if one existed.
pub async fn logout(cfg: &Config) -> Result<bool> {
    let db_path = cfg.db_path.clone();
    tokio::task::spawn_blocking(move || -> Result<bool, anyhow::Error> {
        let conn = db::open_or_create(&db_path)?;
        db::delete_credential(&conn)
    })
    .await?
}
