//! Synthetic raster generators with predictable, verifiable values.

use chip_common::GeoTransform;
use raster::normalize::NormalizedImage;
use raster::Raster;

/// Raster whose value at (col, row) is `col * 1000 + row`, making read
/// paths easy to verify.
pub fn indexed_raster(width: usize, height: usize, transform: GeoTransform) -> Raster {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    Raster {
        width,
        height,
        bands: 1,
        data,
        transform,
    }
}

/// Single-band raster filled with one value.
pub fn constant_raster(width: usize, height: usize, value: f32, transform: GeoTransform) -> Raster {
    Raster {
        width,
        height,
        bands: 1,
        data: vec![value; width * height],
        transform,
    }
}

/// Raster with a rectangular nodata (NaN) region, values elsewhere a ramp.
pub fn raster_with_nodata_block(
    width: usize,
    height: usize,
    block: (usize, usize, usize, usize), // (col, row, block_width, block_height)
    transform: GeoTransform,
) -> Raster {
    let mut raster = indexed_raster(width, height, transform);
    let (bx, by, bw, bh) = block;
    for row in by..(by + bh).min(height) {
        for col in bx..(bx + bw).min(width) {
            raster.data[row * width + col] = f32::NAN;
        }
    }
    raster
}

/// 8-bit grayscale image whose value at (col, row) is
/// `(col * 31 + row * 7) % 256`, distinct enough to catch offset bugs.
pub fn patterned_image(width: usize, height: usize, transform: GeoTransform) -> NormalizedImage {
    let mut pixels = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            pixels.push(((col * 31 + row * 7) % 256) as u8);
        }
    }
    NormalizedImage {
        width,
        height,
        channels: 1,
        pixels,
        transform,
    }
}

/// Default transform over the Chapada Diamantina test bbox.
pub fn test_transform(width: usize, height: usize) -> GeoTransform {
    GeoTransform::from_bbox(
        &chip_common::BoundingBox::new(-41.65, -12.80, -40.95, -12.10),
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_raster_values() {
        let r = indexed_raster(10, 5, test_transform(10, 5));
        assert_eq!(r.sample(0, 0, 0), 0.0);
        assert_eq!(r.sample(1, 0, 0), 1000.0);
        assert_eq!(r.sample(0, 1, 0), 1.0);
        assert_eq!(r.sample(9, 4, 0), 9004.0);
    }

    #[test]
    fn test_nodata_block() {
        let r = raster_with_nodata_block(10, 10, (2, 3, 4, 2), test_transform(10, 10));
        assert!(r.sample(2, 3, 0).is_nan());
        assert!(r.sample(5, 4, 0).is_nan());
        assert!(!r.sample(1, 3, 0).is_nan());
        assert!(!r.sample(2, 5, 0).is_nan());
    }
}
