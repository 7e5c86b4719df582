mod audiobox;
mod config;
mod error;
mod file_hash;
mod library;
mod logging;
mod ports;
mod services;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::{Result, eyre::Context};
use tokio_util::sync::CancellationToken;

use crate::{
    audiobox::{Credentials, DEFAULT_API_URL, parse_api_url},
    config::{Config, LibraryLocation},
    error::SyncError,
    library::{DirectoryLibrary, ItunesXmlLibrary},
    logging::init_tracing,
    ports::library::LibrarySource,
    services::{
        audiobox::AudioBoxHttpAdapter,
        sync::{RunSummary, SyncOptions, Synchronizer},
    },
};

/// Upload a local music library and its playlists to AudioBox.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// AudioBox account email
    #[arg(short, long, env = "AUDIOBOX_EMAIL")]
    email: Option<String>,

    /// AudioBox account password
    #[arg(short, long, env = "AUDIOBOX_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Log debug output (same as --log-level debug)
    #[arg(short, long)]
    verbose: bool,

    /// Console log level or filter directive
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Export spans to this OTLP/gRPC endpoint
    #[arg(long, env = "OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    /// The config file to use
    #[arg(short, long, env = "AUDIOBOX_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// AudioBox API base URL
    #[arg(long, env = "AUDIOBOX_API_URL")]
    api_url: Option<String>,

    /// iTunes library XML export to read tracks and playlists from
    #[arg(long)]
    itunes_library: Option<PathBuf>,

    /// Read tracks (and .m3u playlists) from a music directory instead
    #[arg(long, conflicts_with = "itunes_library")]
    music_directory: Option<PathBuf>,

    /// Report what would be uploaded or created without changing anything
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn tracing_level(&self) -> &str {
        if self.verbose { "debug" } else { &self.log_level }
    }
}

fn resolve_credentials(args: &Args, config: &Config) -> Option<Credentials> {
    let email = args.email.clone().or_else(|| config.email.clone())?;
    let password = args.password.clone().or_else(|| config.password.clone())?;
    if email.trim().is_empty() || password.is_empty() {
        return None;
    }
    Some(Credentials {
        email: email.trim().to_string(),
        password,
    })
}

fn library_location(args: &Args, config: &Config) -> LibraryLocation {
    if let Some(directory) = &args.music_directory {
        LibraryLocation::Directory(directory.clone())
    } else if let Some(xml) = &args.itunes_library {
        LibraryLocation::ItunesXml(xml.clone())
    } else {
        config.library()
    }
}

fn open_library(location: &LibraryLocation) -> Result<Box<dyn LibrarySource>, SyncError> {
    match location {
        LibraryLocation::ItunesXml(path) => {
            tracing::info!("Using iTunes library {}", path.display());
            let library = ItunesXmlLibrary::open(path).map_err(SyncError::library)?;
            Ok(Box::new(library))
        }
        LibraryLocation::Directory(path) => {
            tracing::info!("Using music directory {}", path.display());
            let library = DirectoryLibrary::open(path).map_err(SyncError::library)?;
            Ok(Box::new(library))
        }
    }
}

async fn run(
    args: &Args,
    config: &Config,
    credentials: Credentials,
    cancel: CancellationToken,
) -> Result<RunSummary, SyncError> {
    let raw_url = args
        .api_url
        .as_deref()
        .or(config.api_url.as_deref())
        .unwrap_or(DEFAULT_API_URL);
    let base_url = parse_api_url(raw_url).map_err(|e| SyncError::remote_state("API URL", e))?;

    let remote = AudioBoxHttpAdapter::new(base_url, credentials, config.request_timeout())
        .map_err(|e| SyncError::remote_state("HTTP client", e))?;
    tracing::debug!("Talking to {}", remote.base_url());

    let library = open_library(&library_location(args, config))?;

    Synchronizer::new(
        remote,
        library,
        SyncOptions {
            dry_run: args.dry_run,
        },
        cancel,
    )
    .run()
    .await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let tracer_provider = init_tracing(
        env!("CARGO_PKG_NAME"),
        args.otlp_endpoint.as_deref(),
        args.tracing_level(),
    )?;

    tracing::info!(
        "[AudioBox] {} {} initializing",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let config = {
        if let Some(path) = &args.config {
            Config::from_file(path)
        } else {
            Config::load()
        }
    }
    .wrap_err("Failed to load audiobox-sync config")?;

    let Some(credentials) = resolve_credentials(&args, &config) else {
        eprintln!(
            "Missing email or password. Please run '{} -h' for help.",
            env!("CARGO_BIN_NAME")
        );
        std::process::exit(SyncError::MissingCredentials.exit_code());
    };

    if args.dry_run {
        tracing::info!("Dry run: nothing will be uploaded or created");
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping at the next safe point");
                cancel.cancel();
            }
        }
    });

    let outcome = run(&args, &config, credentials, cancel).await;

    if let Some(provider) = tracer_provider {
        if let Err(e) = provider.shutdown() {
            eprintln!("Failed to flush traces: {}", e);
        }
    }

    match outcome {
        Ok(summary) => {
            println!("{}", summary);
            Ok(())
        }
        Err(err) => {
            tracing::error!("{}", err);
            std::process::exit(err.exit_code());
        }
    }
}
