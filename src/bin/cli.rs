use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::subscriber as tracing_subscriber_global;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_log::LogTracer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use yt_playlist_builder as lib;
use lib::config::Config;
use lib::job::BuildOptions;

#[derive(Parser)]
#[command(name = "yt-playlist-builder", version)]
struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize with Google and store the credential in the DB (interactive)
    Auth,
    /// Forget the stored credential
    Logout,
    /// Create a playlist and add each song found for the artist
    Build {
        /// Playlist title
        #[arg(long)]
        title: String,

        /// Playlist description
        #[arg(long)]
        description: Option<String>,

        /// Artist prepended to every song search
        #[arg(long)]
        artist: String,

        /// Make the playlist public (private by default)
        #[arg(long)]
        public: bool,

        /// Do not pause between songs
        #[arg(long)]
        no_delay: bool,

        /// File with one song per line; "-" reads stdin
        #[arg(long, value_name = "FILE", default_value = "-")]
        songs: String,

        /// Run against an in-memory platform instead of YouTube
        #[arg(long)]
        dry_run: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate config file and exit
    ConfigValidate,
}

fn read_songs(source: &str) -> Result<String> {
    if source == "-" {
        let mut s = String::new();
        std::io::stdin().read_to_string(&mut s)?;
        Ok(s)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading songs from {}", source))
    }
}

fn init_logging(cfg: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let _ = LogTracer::init();

    // Honor RUST_LOG if set, otherwise default to info.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Daily-rotated file in cfg.log_dir when the directory is usable.
    let (file_layer, guard) = match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("yt-playlist-builder.log")
        .build(&cfg.log_dir)
    {
        Ok(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(non_blocking)), Some(guard))
        }
        Err(e) => {
            eprintln!("File logging disabled ({}): {}", cfg.log_dir.display(), e);
            (None, None)
        }
    };
    let stdout_layer = fmt::layer().with_writer(std::io::stderr);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer);

    if let Err(e) = tracing_subscriber_global::set_global_default(subscriber) {
        eprintln!("failed to set global tracing subscriber: {}", e);
    }
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // Explicit --config overrides; otherwise prefer the system-wide file and
    // fall back to the repository example config, then built-in defaults.
    let resolved_config_path: Option<PathBuf> = match &cli.config {
        Some(p) => Some(p.clone()),
        None => {
            let etc_path = Path::new("/etc/yt-playlist-builder/config.toml");
            let local_path = Path::new("config/example-config.toml");
            if etc_path.exists() {
                Some(etc_path.to_path_buf())
            } else if local_path.exists() {
                Some(local_path.to_path_buf())
            } else {
                None
            }
        }
    };

    let cfg_result = match &resolved_config_path {
        Some(p) => Config::from_path(p).with_context(|| format!("loading config from {}", p.display())),
        None => Ok(Config::default()),
    };

    if let Commands::ConfigValidate = cli.command {
        match cfg_result {
            Ok(_) if resolved_config_path.is_none() => println!("OK (no config file; using defaults)"),
            Ok(_) => println!("OK"),
            Err(e) => {
                eprintln!("Config validation failed: {:#}", e);
                std::process::exit(2);
            }
        }
        return Ok(());
    }
    let cfg = cfg_result?;

    // Logs go to stderr and, when possible, a daily-rotated file in cfg.log_dir.
    let _guard = init_logging(&cfg);

    match cli.command {
        Commands::Auth => {
            lib::api::auth::run_youtube_auth(&cfg).await?;
        }
        Commands::Logout => {
            if lib::job::logout(&cfg).await? {
                println!("Logged out: stored credential removed.");
            } else {
                println!("No stored credential.");
            }
        }
        Commands::Build {
            title,
            description,
            artist,
            public,
            no_delay,
            songs,
            dry_run,
            json,
        } => {
            let opts = BuildOptions {
                title,
                description,
                artist,
                public,
                throttle: cfg.throttle && !no_delay,
                songs_text: read_songs(&songs)?,
                dry_run,
            };
            let result = lib::job::run_build(&cfg, &opts).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                for line in result.render_lines() {
                    println!("{}", line);
                }
                println!();
                println!("{}", result.summary());
            }
            if let Some(w) = result.warning() {
                eprintln!("{}", w);
            }
        }
        // handled before logging is initialized
        Commands::ConfigValidate => {}
    }
    Ok(())
}
