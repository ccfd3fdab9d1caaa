//! Satellite imagery tiling pipeline.
//!
//! Discovers scenes over a search box from the configured catalogs
//! (Sentinel-2 L2A, SRTM elevation, Planet NICFI mosaics), downloads their
//! assets with retry, composites and contrast-stretches them to 8-bit, cuts
//! fixed-size PNG tiles, and writes a JSONL manifest of tile footprints.

mod config;
mod run;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use chip_common::RunContext;
use fetch::nicfi::{NicfiProvider, DEFAULT_NICFI_ENDPOINT};
use fetch::srtm::{SrtmProvider, DEFAULT_SRTM_URL};
use fetch::stac::{StacProvider, DEFAULT_STAC_ENDPOINT};
use fetch::{Downloader, DownloaderConfig, RetryPolicy, SceneProvider};

use config::{Args, Settings, SourceId};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let settings = Settings::from_args(&args)?;
    info!(
        bbox = %settings.run.bbox.to_csv(),
        out_dir = %settings.run.out_dir.display(),
        "Starting tiling run"
    );

    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let mut providers: Vec<Arc<dyn SceneProvider>> = Vec::new();
    for source in &settings.sources {
        match source {
            SourceId::Sentinel2 => {
                providers.push(Arc::new(StacProvider::new(
                    client.clone(),
                    DEFAULT_STAC_ENDPOINT,
                )));
            }
            SourceId::Srtm => {
                providers.push(Arc::new(SrtmProvider::new(DEFAULT_SRTM_URL)));
            }
            SourceId::Nicfi => match &settings.nicfi_api_key {
                Some(key) => {
                    let (year, month) = settings.nicfi_month;
                    providers.push(Arc::new(NicfiProvider::new(
                        client.clone(),
                        DEFAULT_NICFI_ENDPOINT,
                        key.clone(),
                        year,
                        month,
                    )));
                }
                None => warn!("PL_API_KEY not set, skipping NICFI mosaics"),
            },
        }
    }

    let retry = RetryPolicy {
        max_retries: settings.max_retries,
        ..Default::default()
    };
    let downloader = Arc::new(Downloader::new(DownloaderConfig {
        request_timeout: REQUEST_TIMEOUT,
        retry: retry.clone(),
        raw_dir: settings.run.out_dir.join("raw"),
    })?);

    let ctx = Arc::new(RunContext::new(settings.run.clone()));
    let summary = run::run(
        Arc::clone(&ctx),
        &providers,
        downloader,
        &retry,
        settings.concurrency,
    )
    .await?;

    info!(
        scenes = summary.scenes_succeeded,
        tiles = summary.tiles_written,
        failed = summary.scenes_failed(),
        manifest = %settings.run.manifest_path().display(),
        "Run complete"
    );
    for failure in &summary.failures {
        warn!(
            scene_id = %failure.scene_id,
            kind = %failure.kind,
            message = %failure.message,
            "Scene not tiled"
        );
    }

    if summary.scenes_succeeded == 0 && !summary.failures.is_empty() {
        anyhow::bail!("no scenes completed, see failures above");
    }

    Ok(())
}
