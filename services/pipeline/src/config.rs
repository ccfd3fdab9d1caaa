//! Run configuration: CLI flags plus optional YAML run files.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use serde::Deserialize;

use chip_common::{BoundingBox, PaddingPolicy, ResampleMethod, RunConfig};

/// Which imagery sources a run draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Sentinel2,
    Srtm,
    Nicfi,
}

impl std::str::FromStr for SourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sentinel2" | "sentinel-2" => Ok(SourceId::Sentinel2),
            "srtm" => Ok(SourceId::Srtm),
            "nicfi" => Ok(SourceId::Nicfi),
            other => Err(format!("unknown source: {}", other)),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "geochip")]
#[command(about = "Acquire, normalize, and tile imagery for a search box")]
pub struct Args {
    /// YAML run file; flags below are ignored when set
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Search box as "west,south,east,north" (WGS-84 degrees)
    #[arg(long, default_value = "-41.65,-12.80,-40.95,-12.10")]
    pub bbox: String,

    /// Earliest acquisition date (inclusive)
    #[arg(long, default_value = "2024-01-01")]
    pub date_start: NaiveDate,

    /// Latest acquisition date (inclusive; default today)
    #[arg(long)]
    pub date_end: Option<NaiveDate>,

    /// Maximum scene cloud cover, percent
    #[arg(long, default_value = "20.0")]
    pub cloud_cover_max: f32,

    /// Tile edge length in pixels
    #[arg(long, default_value = "100")]
    pub tile_size_px: usize,

    /// Maximum linear dimension of preview images
    #[arg(long, default_value = "1000")]
    pub max_preview_dim: usize,

    /// Band resampling: nearest or bilinear
    #[arg(long, default_value = "bilinear")]
    pub resample_method: String,

    /// Edge tile policy: pad or truncate
    #[arg(long, default_value = "pad")]
    pub padding_policy: String,

    /// Output directory root
    #[arg(long, default_value = "data_tiles")]
    pub out_dir: PathBuf,

    /// Comma-separated sources: sentinel2,srtm,nicfi
    #[arg(long, default_value = "sentinel2,srtm,nicfi")]
    pub sources: String,

    /// NICFI mosaic month as YYYY-MM
    #[arg(long, default_value = "2024-03")]
    pub nicfi_month: String,

    /// NICFI API key (skipped when unset)
    #[arg(long, env = "PL_API_KEY", hide_env_values = true)]
    pub nicfi_api_key: Option<String>,

    /// Concurrent scene pipelines
    #[arg(long, default_value = "4")]
    pub concurrency: usize,

    /// Maximum download retry attempts
    #[arg(long, default_value = "5")]
    pub max_retries: u32,

    /// Log level
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// YAML layout mirroring the CLI flags.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RunFile {
    bbox: String,
    date_start: NaiveDate,
    #[serde(default)]
    date_end: Option<NaiveDate>,
    #[serde(default = "default_cloud_cover")]
    cloud_cover_max: f32,
    #[serde(default = "default_tile_size")]
    tile_size_px: usize,
    #[serde(default = "default_preview_dim")]
    max_preview_dim: usize,
    #[serde(default)]
    resample_method: ResampleMethod,
    #[serde(default)]
    padding_policy: PaddingPolicy,
    out_dir: PathBuf,
    #[serde(default = "default_sources")]
    sources: Vec<SourceId>,
}

fn default_cloud_cover() -> f32 {
    20.0
}

fn default_tile_size() -> usize {
    100
}

fn default_preview_dim() -> usize {
    1000
}

fn default_sources() -> Vec<SourceId> {
    vec![SourceId::Sentinel2, SourceId::Srtm, SourceId::Nicfi]
}

/// Fully resolved run settings.
#[derive(Debug)]
pub struct Settings {
    pub run: RunConfig,
    pub sources: Vec<SourceId>,
    pub nicfi_month: (i32, u32),
    pub nicfi_api_key: Option<String>,
    pub concurrency: usize,
    pub max_retries: u32,
}

impl Settings {
    pub fn from_args(args: &Args) -> Result<Self> {
        let (run, sources) = match &args.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let file: RunFile = serde_yaml::from_str(&text)
                    .with_context(|| format!("parsing {}", path.display()))?;
                (run_config_from_file(&file)?, file.sources)
            }
            None => (run_config_from_flags(args)?, parse_sources(&args.sources)?),
        };

        let nicfi_month = parse_month(&args.nicfi_month)?;

        Ok(Settings {
            run,
            sources,
            nicfi_month,
            nicfi_api_key: args.nicfi_api_key.clone(),
            concurrency: args.concurrency.max(1),
            max_retries: args.max_retries,
        })
    }
}

fn run_config_from_flags(args: &Args) -> Result<RunConfig> {
    Ok(RunConfig {
        bbox: BoundingBox::from_csv(&args.bbox).context("invalid --bbox")?,
        date_start: args.date_start,
        date_end: args.date_end.unwrap_or_else(|| Utc::now().date_naive()),
        cloud_cover_max: args.cloud_cover_max,
        tile_size_px: args.tile_size_px,
        max_preview_dim: args.max_preview_dim,
        resample_method: parse_resample(&args.resample_method)?,
        padding_policy: parse_padding(&args.padding_policy)?,
        out_dir: args.out_dir.clone(),
        stretch_percentiles: (2.0, 98.0),
    })
}

fn run_config_from_file(file: &RunFile) -> Result<RunConfig> {
    Ok(RunConfig {
        bbox: BoundingBox::from_csv(&file.bbox).context("invalid bbox in run file")?,
        date_start: file.date_start,
        date_end: file.date_end.unwrap_or_else(|| Utc::now().date_naive()),
        cloud_cover_max: file.cloud_cover_max,
        tile_size_px: file.tile_size_px,
        max_preview_dim: file.max_preview_dim,
        resample_method: file.resample_method,
        padding_policy: file.padding_policy,
        out_dir: file.out_dir.clone(),
        stretch_percentiles: (2.0, 98.0),
    })
}

fn parse_sources(s: &str) -> Result<Vec<SourceId>> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| part.parse().map_err(|e: String| anyhow::anyhow!(e)))
        .collect()
}

fn parse_resample(s: &str) -> Result<ResampleMethod> {
    match s.to_ascii_lowercase().as_str() {
        "nearest" => Ok(ResampleMethod::Nearest),
        "bilinear" => Ok(ResampleMethod::Bilinear),
        other => bail!("unknown resample method: {}", other),
    }
}

fn parse_padding(s: &str) -> Result<PaddingPolicy> {
    match s.to_ascii_lowercase().as_str() {
        "pad" => Ok(PaddingPolicy::Pad),
        "truncate" => Ok(PaddingPolicy::Truncate),
        other => bail!("unknown padding policy: {}", other),
    }
}

fn parse_month(s: &str) -> Result<(i32, u32)> {
    let (year, month) = s
        .split_once('-')
        .with_context(|| format!("invalid month (expected YYYY-MM): {}", s))?;
    let year: i32 = year.parse().context("invalid year")?;
    let month: u32 = month.parse().context("invalid month")?;
    if !(1..=12).contains(&month) {
        bail!("month out of range: {}", month);
    }
    Ok((year, month))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sources() {
        let sources = parse_sources("sentinel2, srtm").unwrap();
        assert_eq!(sources, vec![SourceId::Sentinel2, SourceId::Srtm]);
        assert!(parse_sources("landsat").is_err());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2024-03").unwrap(), (2024, 3));
        assert!(parse_month("2024-13").is_err());
        assert!(parse_month("march").is_err());
    }

    #[test]
    fn test_run_file_parsing() {
        let yaml = r#"
bbox: "-41.65,-12.80,-40.95,-12.10"
date_start: 2024-01-01
date_end: 2024-06-30
out_dir: /data/tiles
padding_policy: truncate
sources: [srtm]
"#;
        let file: RunFile = serde_yaml::from_str(yaml).unwrap();
        let config = run_config_from_file(&file).unwrap();
        assert_eq!(config.tile_size_px, 100);
        assert_eq!(config.padding_policy, PaddingPolicy::Truncate);
        assert_eq!(file.sources, vec![SourceId::Srtm]);
    }
}
