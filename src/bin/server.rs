//! Server entry point.
//!
//! Usage: `dvorfs-dl-server [CONFIG.json]`
//!
//! The config path may also come from `DVORFS_DL_CONFIG`. Without one the
//! defaults apply. Log verbosity follows `RUST_LOG` (default `info`).

use dvorfs_dl::extractor::{MediaExtractor, NoOpExtractor, YtDlpExtractor};
use dvorfs_dl::{Config, MediaService, run_with_shutdown};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

const CONFIG_ENV: &str = "DVORFS_DL_CONFIG";

#[tokio::main]
async fn main() -> ExitCode {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server exited with error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> dvorfs_dl::Result<()> {
    let config = match config_path() {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            Config::from_json_file(&path)?
        }
        None => Config::default(),
    };

    let extractor: Arc<dyn MediaExtractor> = match YtDlpExtractor::from_config(&config.extractor) {
        Some(ytdlp) => {
            info!(binary = %ytdlp.binary_path().display(), "using yt-dlp provider");
            Arc::new(ytdlp)
        }
        None => {
            warn!("yt-dlp not found in PATH, info and download requests will fail");
            Arc::new(NoOpExtractor)
        }
    };

    let service = MediaService::new(config, extractor)?;
    run_with_shutdown(service).await
}

fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}
