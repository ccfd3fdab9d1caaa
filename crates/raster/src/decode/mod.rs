//! Raster decoding: heterogeneous source files into the common [`Raster`] model.
//!
//! The loosely-typed metadata carried by source files (arbitrary TIFF tags,
//! filename conventions) is reduced here to the closed set of fields the
//! rest of the pipeline depends on: dimensions, band count, affine
//! transform, nodata. Everything else is ignored.

mod geotiff;
mod hgt;

use std::path::Path;

use chip_common::{ChipError, ChipResult, ResampleMethod, Scene, SceneKind};
use tracing::debug;

use crate::composite::composite_bands;
use crate::Raster;

pub use geotiff::decode_geotiff;
pub use hgt::decode_hgt;

/// Band names required for a Sentinel-2 true-color composite, in priority
/// order. B04 (red) is the finest-resolution visible band and defines the
/// target grid.
pub const TRUE_COLOR_BANDS: [&str; 3] = ["B04", "B03", "B02"];

/// Decode a single raster file, dispatching on extension.
pub fn open_raster(path: &Path) -> ChipResult<Raster> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    debug!(path = %path.display(), "Decoding raster");

    if name.ends_with(".hgt") || name.ends_with(".hgt.gz") {
        decode_hgt(path)
    } else if name.ends_with(".tif") || name.ends_with(".tiff") {
        decode_geotiff(path)
    } else {
        Err(ChipError::Decode(format!(
            "Unrecognized raster format: {}",
            path.display()
        )))
    }
}

/// Decode a scene into one raster, compositing bands when needed.
///
/// Multispectral scenes carry one file per band; the band name is taken from
/// the trailing `_Bnn` component of each filename, and the files are stacked
/// into a true-color composite. Elevation and mosaic scenes are single
/// files decoded directly.
pub fn decode_scene(scene: &Scene, method: ResampleMethod) -> ChipResult<Raster> {
    match scene.kind {
        SceneKind::MultispectralComposite => {
            let mut bands = Vec::with_capacity(scene.paths.len());
            for path in &scene.paths {
                let name = band_name(path).ok_or_else(|| {
                    ChipError::Decode(format!(
                        "Cannot determine band name from {}",
                        path.display()
                    ))
                })?;
                bands.push((name, open_raster(path)?));
            }
            composite_bands(&bands, &TRUE_COLOR_BANDS, method)
        }
        SceneKind::Elevation | SceneKind::MosaicQuad => open_raster(scene.primary_path()),
    }
}

/// Extract the band name from a `{scene_id}_{band}.tif` filename.
fn band_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let band = stem.rsplit('_').next()?;
    if band.is_empty() {
        None
    } else {
        Some(band.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_band_name_extraction() {
        assert_eq!(
            band_name(&PathBuf::from("/data/S2A_MSIL2A_20240301_B04.tif")),
            Some("B04".to_string())
        );
        assert_eq!(band_name(&PathBuf::from("plain.tif")), Some("plain".to_string()));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let err = open_raster(&PathBuf::from("/data/scene.grib2")).unwrap_err();
        assert!(matches!(err, ChipError::Decode(_)));
    }
}
