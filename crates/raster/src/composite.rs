//! Band compositor: stacks single-band rasters into a true-color composite.

use chip_common::{ChipError, ChipResult, ResampleMethod};
use rayon::prelude::*;
use tracing::debug;

use crate::resample::sample_at;
use crate::Raster;

/// Assemble single-band rasters into one multi-band composite.
///
/// `required` lists band names in priority order; the first one defines the
/// target pixel grid and the remaining bands are resampled onto it with
/// `method`. The output covers the geometric intersection of all band
/// extents, so no output pixel is missing a band.
///
/// Fails with [`ChipError::MissingBand`] when a required band is absent from
/// `bands` and with [`ChipError::BandMismatch`] when the bands do not
/// geographically overlap.
pub fn composite_bands(
    bands: &[(String, Raster)],
    required: &[&str],
    method: ResampleMethod,
) -> ChipResult<Raster> {
    let mut ordered: Vec<&Raster> = Vec::with_capacity(required.len());
    for name in required {
        let raster = bands
            .iter()
            .find(|(band_name, _)| band_name == name)
            .map(|(_, raster)| raster)
            .ok_or_else(|| ChipError::MissingBand(name.to_string()))?;
        ordered.push(raster);
    }

    let target = ordered[0];

    // Intersection of all band extents.
    let mut extent = target.bbox();
    for band in &ordered[1..] {
        extent = extent
            .intersection(&band.bbox())
            .ok_or(ChipError::BandMismatch)?;
    }

    // Snap the intersection to the target band's pixel grid, keeping only
    // pixels fully inside it.
    let eps = 1e-9;
    let (c0, r0) = target.transform.geo_to_pixel(extent.west, extent.north);
    let (c1, r1) = target.transform.geo_to_pixel(extent.east, extent.south);
    let col0 = (c0 - eps).ceil().max(0.0) as usize;
    let row0 = (r0 - eps).ceil().max(0.0) as usize;
    let col1 = ((c1 + eps).floor() as usize).min(target.width);
    let row1 = ((r1 + eps).floor() as usize).min(target.height);

    if col1 <= col0 || row1 <= row0 {
        return Err(ChipError::BandMismatch);
    }

    let width = col1 - col0;
    let height = row1 - row0;
    let out_bands = ordered.len();
    let transform = target.transform.window(col0, row0);

    debug!(
        width = width,
        height = height,
        bands = out_bands,
        "Compositing bands onto common grid"
    );

    let mut data = vec![f32::NAN; width * height * out_bands];
    data.par_chunks_mut(width * out_bands)
        .enumerate()
        .for_each(|(row, out_row)| {
            for col in 0..width {
                // Geographic center of the output pixel.
                let (lon, lat) =
                    transform.pixel_to_geo(col as f64 + 0.5, row as f64 + 0.5);
                for (band_idx, band) in ordered.iter().enumerate() {
                    let (x, y) = band.transform.geo_to_pixel(lon, lat);
                    out_row[col * out_bands + band_idx] =
                        sample_at(band, 0, x - 0.5, y - 0.5, method);
                }
            }
        });

    Ok(Raster {
        width,
        height,
        bands: out_bands,
        data,
        transform,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chip_common::GeoTransform;

    fn band(value: f32, west: f64, north: f64, size: usize, res: f64) -> Raster {
        Raster {
            width: size,
            height: size,
            bands: 1,
            data: vec![value; size * size],
            transform: GeoTransform::north_up(west, north, res, res),
        }
    }

    fn named(name: &str, raster: Raster) -> (String, Raster) {
        (name.to_string(), raster)
    }

    #[test]
    fn test_composite_same_grid() {
        let bands = vec![
            named("B04", band(10.0, 0.0, 1.0, 10, 0.1)),
            named("B03", band(20.0, 0.0, 1.0, 10, 0.1)),
            named("B02", band(30.0, 0.0, 1.0, 10, 0.1)),
        ];
        let out =
            composite_bands(&bands, &["B04", "B03", "B02"], ResampleMethod::Nearest).unwrap();
        assert_eq!(out.bands, 3);
        assert_eq!((out.width, out.height), (10, 10));
        assert_eq!(out.sample(5, 5, 0), 10.0);
        assert_eq!(out.sample(5, 5, 1), 20.0);
        assert_eq!(out.sample(5, 5, 2), 30.0);
    }

    #[test]
    fn test_composite_resamples_coarser_band() {
        // Priority band at 0.1 degree pixels, second band at 0.2.
        let bands = vec![
            named("B04", band(1.0, 0.0, 1.0, 10, 0.1)),
            named("B03", band(2.0, 0.0, 1.0, 5, 0.2)),
        ];
        let out = composite_bands(&bands, &["B04", "B03"], ResampleMethod::Bilinear).unwrap();
        // Output adopts the priority band's grid.
        assert_eq!((out.width, out.height), (10, 10));
        assert_eq!(out.sample(4, 4, 0), 1.0);
        assert_eq!(out.sample(4, 4, 1), 2.0);
    }

    #[test]
    fn test_composite_intersection_extent() {
        // Second band shifted east by half the footprint.
        let bands = vec![
            named("B04", band(1.0, 0.0, 1.0, 10, 0.1)),
            named("B03", band(2.0, 0.5, 1.0, 10, 0.1)),
        ];
        let out = composite_bands(&bands, &["B04", "B03"], ResampleMethod::Nearest).unwrap();
        assert_eq!(out.width, 5);
        assert_eq!(out.height, 10);
        // Output origin sits at the intersection's west edge.
        assert!((out.transform.origin_x - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_missing_band() {
        let bands = vec![named("B04", band(1.0, 0.0, 1.0, 10, 0.1))];
        let err = composite_bands(&bands, &["B04", "B03"], ResampleMethod::Nearest).unwrap_err();
        assert!(matches!(err, ChipError::MissingBand(name) if name == "B03"));
    }

    #[test]
    fn test_disjoint_bands() {
        let bands = vec![
            named("B04", band(1.0, 0.0, 1.0, 10, 0.1)),
            named("B03", band(2.0, 50.0, 1.0, 10, 0.1)),
        ];
        let err = composite_bands(&bands, &["B04", "B03"], ResampleMethod::Nearest).unwrap_err();
        assert!(matches!(err, ChipError::BandMismatch));
    }
}
