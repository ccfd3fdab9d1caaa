//! Run-level context: configuration snapshot plus error collection.
//!
//! Every component receives the context explicitly; there is no global
//! mutable state (shared directories, run-wide counters) anywhere in the
//! pipeline.

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Interpolation used when resampling bands onto a common grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResampleMethod {
    /// Nearest-neighbor: fast, preserves exact values.
    Nearest,
    /// Bilinear: smoother, better for visual composites.
    #[default]
    Bilinear,
}

/// How edge tiles smaller than the configured tile size are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaddingPolicy {
    /// Pad edge tiles with the nodata sentinel up to full tile size.
    #[default]
    Pad,
    /// Emit edge tiles at reduced size, recorded in the manifest.
    Truncate,
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Search region in WGS-84.
    pub bbox: BoundingBox,
    /// Inclusive acquisition date range.
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    /// Maximum scene cloud cover, percent.
    pub cloud_cover_max: f32,
    /// Tile edge length in pixels.
    pub tile_size_px: usize,
    /// Maximum linear dimension of normalized preview images.
    pub max_preview_dim: usize,
    pub resample_method: ResampleMethod,
    pub padding_policy: PaddingPolicy,
    /// Root of the output file tree.
    pub out_dir: PathBuf,
    /// Contrast-stretch percentile window (low, high).
    pub stretch_percentiles: (f32, f32),
}

impl RunConfig {
    /// Directory for one scene's tile images.
    pub fn scene_dir(&self, scene_id: &str) -> PathBuf {
        self.out_dir.join(scene_id)
    }

    /// Fixed manifest path for the run.
    pub fn manifest_path(&self) -> PathBuf {
        self.out_dir.join("manifest.jsonl")
    }

    /// Directory for normalized preview images.
    pub fn preview_dir(&self) -> PathBuf {
        self.out_dir.join("previews")
    }
}

/// A scene that failed processing, recorded in the run summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneFailure {
    pub scene_id: String,
    /// Stable error-kind name, see [`ChipError::kind`](crate::ChipError::kind).
    pub kind: String,
    pub message: String,
}

/// Shared context for one pipeline run.
///
/// Failures are collected rather than propagated: one bad scene must not
/// abort tiling of the rest.
#[derive(Debug)]
pub struct RunContext {
    pub config: RunConfig,
    failures: Mutex<Vec<SceneFailure>>,
}

impl RunContext {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Record a scene-level failure for the run summary.
    pub fn record_failure(&self, scene_id: &str, kind: &str, message: String) {
        let mut failures = self.failures.lock().expect("failure sink poisoned");
        failures.push(SceneFailure {
            scene_id: scene_id.to_string(),
            kind: kind.to_string(),
            message,
        });
    }

    /// Snapshot of all failures recorded so far.
    pub fn failures(&self) -> Vec<SceneFailure> {
        self.failures.lock().expect("failure sink poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RunConfig {
        RunConfig {
            bbox: BoundingBox::new(-41.65, -12.80, -40.95, -12.10),
            date_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            date_end: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            cloud_cover_max: 20.0,
            tile_size_px: 100,
            max_preview_dim: 1000,
            resample_method: ResampleMethod::Bilinear,
            padding_policy: PaddingPolicy::Pad,
            out_dir: PathBuf::from("/tmp/geochip-test"),
            stretch_percentiles: (2.0, 98.0),
        }
    }

    #[test]
    fn test_output_paths() {
        let config = test_config();
        assert_eq!(
            config.scene_dir("sceneA"),
            PathBuf::from("/tmp/geochip-test/sceneA")
        );
        assert_eq!(
            config.manifest_path(),
            PathBuf::from("/tmp/geochip-test/manifest.jsonl")
        );
    }

    #[test]
    fn test_failure_collection() {
        let ctx = RunContext::new(test_config());
        ctx.record_failure("sceneA", "empty-raster", "no valid pixels".into());
        ctx.record_failure("sceneB", "fetch", "404".into());

        let failures = ctx.failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].scene_id, "sceneA");
        assert_eq!(failures[1].kind, "fetch");
    }
}
