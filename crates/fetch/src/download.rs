//! Asset downloader with streaming writes and retry classification.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chip_common::{ChipError, ChipResult, Scene};
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

use crate::provider::SceneDescriptor;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Configuration for the downloader.
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// HTTP request timeout.
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// Directory raw assets are stored under.
    pub raw_dir: PathBuf,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(600),
            retry: RetryPolicy::default(),
            raw_dir: PathBuf::from("data/raw"),
        }
    }
}

/// Downloads scene assets to local storage.
///
/// Re-runs are idempotent: an asset whose destination file already exists is
/// not fetched again. In-flight data streams to a `.partial` sibling and is
/// renamed on completion, so partially downloaded files are never mistaken
/// for complete ones.
pub struct Downloader {
    client: Client,
    config: DownloaderConfig,
}

impl Downloader {
    pub fn new(config: DownloaderConfig) -> ChipResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ChipError::fetch_permanent(format!("HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Resolve every asset of a descriptor to a local file.
    #[instrument(skip(self, descriptor), fields(scene_id = %descriptor.id))]
    pub async fn fetch_scene(&self, descriptor: &SceneDescriptor) -> ChipResult<Scene> {
        fs::create_dir_all(&self.config.raw_dir).await?;

        let mut paths = Vec::with_capacity(descriptor.assets.len());
        for asset in &descriptor.assets {
            let dest = self.config.raw_dir.join(&asset.filename);
            if dest.exists() {
                info!(path = %dest.display(), "Asset already present, skipping download");
            } else {
                retry_with_backoff(&self.config.retry, &asset.filename, || {
                    self.download_to(&asset.url, &dest)
                })
                .await?;
            }
            paths.push(dest);
        }

        Ok(Scene {
            id: descriptor.id.clone(),
            kind: descriptor.kind,
            bbox: descriptor.bbox,
            resolution_m: descriptor.resolution_m,
            acquired: descriptor.acquired,
            paths,
        })
    }

    /// One download attempt: stream the body to `dest.partial`, then rename.
    async fn download_to(&self, url: &str, dest: &Path) -> ChipResult<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, url));
        }

        let partial = dest.with_extension("partial");
        let mut file = fs::File::create(&partial).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(classify_request_error)?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&partial, dest).await?;
        info!(url = %url, path = %dest.display(), "Download completed");
        Ok(())
    }
}

/// HTTP status → error classification. Server-side and throttling failures
/// are transient; client errors (404 missing tiles, auth) are permanent.
pub(crate) fn classify_status(status: StatusCode, url: &str) -> ChipError {
    let retryable = status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT;
    ChipError::Fetch {
        message: format!("HTTP {} fetching {}", status, url),
        retryable,
    }
}

/// Transport error → error classification. Timeouts, refused connections,
/// and interrupted response bodies are transient; request-construction
/// errors (bad URL, builder misuse) can never succeed on retry.
pub(crate) fn classify_request_error(e: reqwest::Error) -> ChipError {
    let retryable = e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode();
    ChipError::Fetch {
        message: e.to_string(),
        retryable,
    }
}
