//! Normalizer: percentile-stretched 8-bit rendition of a raster.

use chip_common::{ChipError, ChipResult, GeoTransform};
use rayon::prelude::*;
use tracing::debug;

use crate::Raster;

/// Value an all-NaN (nodata) pixel maps to in the 8-bit output.
pub const NODATA_SENTINEL: u8 = 0;

/// An 8-bit rendition of a raster with georeferencing intact.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub width: usize,
    pub height: usize,
    /// 1 (grayscale) or 3 (RGB).
    pub channels: usize,
    /// Interleaved 8-bit samples, length `width * height * channels`.
    pub pixels: Vec<u8>,
    pub transform: GeoTransform,
}

/// Convert a raster of arbitrary native range into 8-bit at full resolution.
///
/// Each channel is stretched linearly from its percentile window (e.g.
/// 2nd–98th) to 0–255, which keeps a single outlier pixel from collapsing
/// contrast. Out-of-window values clip. Nodata pixels map to pure black and
/// are excluded from the stretch statistics.
///
/// Fails with [`ChipError::EmptyRaster`] when the raster has no valid pixel.
pub fn normalize(raster: &Raster, percentiles: (f32, f32)) -> ChipResult<NormalizedImage> {
    let windows: Vec<(f32, f32)> = (0..raster.bands)
        .map(|band| stretch_window(raster, band, percentiles))
        .collect::<ChipResult<_>>()?;

    debug!(
        width = raster.width,
        height = raster.height,
        windows = ?windows,
        "Stretching raster to 8-bit"
    );

    let bands = raster.bands;
    let mut pixels = vec![0u8; raster.width * raster.height * bands];
    pixels
        .par_chunks_mut(raster.width * bands)
        .zip(raster.data.par_chunks(raster.width * bands))
        .for_each(|(out_row, in_row)| {
            for (out_px, in_px) in out_row
                .chunks_mut(bands)
                .zip(in_row.chunks(bands))
            {
                if in_px.iter().all(|v| v.is_nan()) {
                    out_px.fill(NODATA_SENTINEL);
                    continue;
                }
                for band in 0..bands {
                    out_px[band] = stretch_value(in_px[band], windows[band]);
                }
            }
        });

    Ok(NormalizedImage {
        width: raster.width,
        height: raster.height,
        channels: bands,
        pixels,
        transform: raster.transform,
    })
}

/// Percentile window for one band, excluding NaN samples.
fn stretch_window(raster: &Raster, band: usize, percentiles: (f32, f32)) -> ChipResult<(f32, f32)> {
    let mut values: Vec<f32> = raster
        .data
        .iter()
        .skip(band)
        .step_by(raster.bands)
        .copied()
        .filter(|v| v.is_finite())
        .collect();

    if values.is_empty() {
        return Err(ChipError::EmptyRaster);
    }

    values.par_sort_unstable_by(f32::total_cmp);

    let pick = |p: f32| {
        let idx = ((p / 100.0) * (values.len() - 1) as f32).round() as usize;
        values[idx.min(values.len() - 1)]
    };

    Ok((pick(percentiles.0), pick(percentiles.1)))
}

/// Map one sample through a stretch window to 0–255, clipping.
#[inline]
fn stretch_value(value: f32, (low, high): (f32, f32)) -> u8 {
    if value.is_nan() {
        return NODATA_SENTINEL;
    }
    let range = high - low;
    if range <= 0.0 {
        // Flat band: every valid sample maps to full brightness so it stays
        // distinguishable from the nodata sentinel.
        return 255;
    }
    let scaled = (value - low) / range * 255.0;
    scaled.clamp(0.0, 255.0).round() as u8
}

impl NormalizedImage {
    /// Bounded preview: downscale so the longest side is at most `max_dim`,
    /// preserving aspect ratio. Never upscales. The affine transform is
    /// scaled by the exact resize ratio so geographic lookups stay valid.
    pub fn preview(&self, max_dim: usize) -> NormalizedImage {
        let longest = self.width.max(self.height);
        if longest <= max_dim {
            return self.clone();
        }

        let ratio = max_dim as f64 / longest as f64;
        let new_w = ((self.width as f64 * ratio).round() as usize).max(1);
        let new_h = ((self.height as f64 * ratio).round() as usize).max(1);

        let resized = match self.channels {
            1 => {
                let img = image::GrayImage::from_raw(
                    self.width as u32,
                    self.height as u32,
                    self.pixels.clone(),
                )
                .expect("pixel buffer length matches dimensions");
                image::imageops::resize(
                    &img,
                    new_w as u32,
                    new_h as u32,
                    image::imageops::FilterType::Lanczos3,
                )
                .into_raw()
            }
            _ => {
                let img = image::RgbImage::from_raw(
                    self.width as u32,
                    self.height as u32,
                    self.pixels.clone(),
                )
                .expect("pixel buffer length matches dimensions");
                image::imageops::resize(
                    &img,
                    new_w as u32,
                    new_h as u32,
                    image::imageops::FilterType::Lanczos3,
                )
                .into_raw()
            }
        };

        NormalizedImage {
            width: new_w,
            height: new_h,
            channels: self.channels,
            pixels: resized,
            transform: self.transform.scaled(
                new_w as f64 / self.width as f64,
                new_h as f64 / self.height as f64,
            ),
        }
    }

    /// Flat index of the first sample of pixel (col, row).
    #[inline]
    pub fn pixel_index(&self, col: usize, row: usize) -> usize {
        (row * self.width + col) * self.channels
    }
}
