//! End-to-end run orchestration: discover scenes from every configured
//! provider, then fetch, normalize, and tile each scene concurrently.
//!
//! Scene failures are recorded on the [`RunContext`] and do not abort the
//! run; the manifest at the end covers every scene that made it through.

use std::sync::Arc;

use chip_common::{ChipError, ChipResult, RunConfig, RunContext, Scene, SceneFailure};
use fetch::{retry_with_backoff, CatalogQuery, Downloader, RetryPolicy, SceneDescriptor, SceneProvider};
use tiler::{tile_scene, write_manifest, write_png, ManifestEntry};
use tokio::task::JoinSet;
use tracing::{error, info, instrument};

/// Outcome of a pipeline run.
#[derive(Debug)]
pub struct RunSummary {
    pub scenes_succeeded: usize,
    pub tiles_written: usize,
    /// Provider and scene failures, in the order they were recorded.
    pub failures: Vec<SceneFailure>,
}

impl RunSummary {
    pub fn scenes_failed(&self) -> usize {
        self.failures.len()
    }
}

/// Run the full pipeline over every scene the providers discover.
pub async fn run(
    ctx: Arc<RunContext>,
    providers: &[Arc<dyn SceneProvider>],
    downloader: Arc<Downloader>,
    retry: &RetryPolicy,
    concurrency: usize,
) -> ChipResult<RunSummary> {
    let query = CatalogQuery {
        bbox: ctx.config.bbox,
        date_start: ctx.config.date_start,
        date_end: ctx.config.date_end,
        cloud_cover_max: ctx.config.cloud_cover_max,
    };

    let mut descriptors = Vec::new();
    for provider in providers {
        match retry_with_backoff(retry, provider.name(), || provider.discover(&query)).await {
            Ok(mut found) => {
                info!(
                    provider = provider.name(),
                    scenes = found.len(),
                    "Discovery finished"
                );
                descriptors.append(&mut found);
            }
            Err(e) => {
                error!(provider = provider.name(), error = %e, "Discovery failed");
                ctx.record_failure(provider.name(), e.kind(), e.to_string());
            }
        }
    }

    let concurrency = concurrency.max(1);
    let mut set = JoinSet::new();
    let mut entries: Vec<ManifestEntry> = Vec::new();
    let mut succeeded = 0usize;

    for descriptor in descriptors {
        while set.len() >= concurrency {
            drain_one(&mut set, &ctx, &mut entries, &mut succeeded).await;
        }
        let ctx = Arc::clone(&ctx);
        let downloader = Arc::clone(&downloader);
        set.spawn(async move {
            let id = descriptor.id.clone();
            let result = process_descriptor(&ctx, &downloader, descriptor).await;
            (id, result)
        });
    }
    while !set.is_empty() {
        drain_one(&mut set, &ctx, &mut entries, &mut succeeded).await;
    }

    // Task completion order depends on scheduling; sort so the manifest is
    // stable across runs.
    entries.sort_by(|a, b| {
        (a.scene_id.as_str(), a.row, a.col).cmp(&(b.scene_id.as_str(), b.row, b.col))
    });
    tokio::fs::create_dir_all(&ctx.config.out_dir).await?;
    let manifest = ctx.config.manifest_path();
    write_manifest(&entries, &manifest)?;
    info!(path = %manifest.display(), tiles = entries.len(), "Manifest written");

    Ok(RunSummary {
        scenes_succeeded: succeeded,
        tiles_written: entries.len(),
        failures: ctx.failures(),
    })
}

async fn drain_one(
    set: &mut JoinSet<(String, ChipResult<Vec<ManifestEntry>>)>,
    ctx: &RunContext,
    entries: &mut Vec<ManifestEntry>,
    succeeded: &mut usize,
) {
    match set.join_next().await {
        Some(Ok((id, Ok(mut scene_entries)))) => {
            info!(scene_id = %id, tiles = scene_entries.len(), "Scene tiled");
            entries.append(&mut scene_entries);
            *succeeded += 1;
        }
        Some(Ok((id, Err(e)))) => {
            error!(scene_id = %id, error = %e, "Scene failed");
            ctx.record_failure(&id, e.kind(), e.to_string());
        }
        Some(Err(e)) => {
            error!(error = %e, "Scene task aborted");
            ctx.record_failure("unknown", "task", e.to_string());
        }
        None => {}
    }
}

/// Fetch one scene, then hand the CPU-bound stages to the blocking pool.
#[instrument(skip_all, fields(scene_id = %descriptor.id))]
async fn process_descriptor(
    ctx: &RunContext,
    downloader: &Downloader,
    descriptor: SceneDescriptor,
) -> ChipResult<Vec<ManifestEntry>> {
    let scene = downloader.fetch_scene(&descriptor).await?;
    let config = ctx.config.clone();
    match tokio::task::spawn_blocking(move || process_scene(&config, &scene)).await {
        Ok(result) => result,
        // Re-raise so the join loop records it as a task failure rather
        // than attributing it to a pipeline stage.
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(ChipError::Io(std::io::Error::other(e))),
    }
}

/// Decode, normalize, preview, and tile one fetched scene.
pub fn process_scene(config: &RunConfig, scene: &Scene) -> ChipResult<Vec<ManifestEntry>> {
    let raster = raster::decode_scene(scene, config.resample_method)?;
    let image = raster::normalize(&raster, config.stretch_percentiles)?;

    let preview = image.preview(config.max_preview_dim);
    let preview_dir = config.preview_dir();
    std::fs::create_dir_all(&preview_dir)?;
    write_png(
        &preview_dir.join(format!("{}.png", scene.id)),
        &preview.pixels,
        preview.width,
        preview.height,
        preview.channels,
    )?;

    tile_scene(
        &image,
        &scene.id,
        &config.out_dir,
        config.tile_size_px,
        config.padding_policy,
    )
}
