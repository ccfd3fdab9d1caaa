//! In-memory raster representation.

use chip_common::{BoundingBox, GeoTransform};

/// A decoded raster: interleaved f32 samples plus georeferencing.
///
/// Data is row-major, top-to-bottom, with `bands` samples per pixel
/// (R,G,B,R,G,B,... for three bands). Nodata pixels are NaN regardless of
/// the sentinel the source file declared; decoders perform that mapping so
/// everything downstream only has one convention to handle.
#[derive(Debug, Clone)]
pub struct Raster {
    pub width: usize,
    pub height: usize,
    /// 1 (grayscale/elevation) or 3 (RGB composite).
    pub bands: usize,
    /// Interleaved samples, length `width * height * bands`.
    pub data: Vec<f32>,
    pub transform: GeoTransform,
}

impl Raster {
    /// Create a raster filled with nodata.
    pub fn filled_nodata(width: usize, height: usize, bands: usize, transform: GeoTransform) -> Self {
        Self {
            width,
            height,
            bands,
            data: vec![f32::NAN; width * height * bands],
            transform,
        }
    }

    /// Flat index of the first sample of pixel (col, row).
    #[inline]
    pub fn pixel_index(&self, col: usize, row: usize) -> usize {
        (row * self.width + col) * self.bands
    }

    /// Sample one band of one pixel; out-of-bounds reads are NaN.
    #[inline]
    pub fn sample(&self, col: usize, row: usize, band: usize) -> f32 {
        if col >= self.width || row >= self.height || band >= self.bands {
            return f32::NAN;
        }
        self.data[self.pixel_index(col, row) + band]
    }

    /// A pixel is nodata when every band sample is NaN.
    #[inline]
    pub fn is_nodata(&self, col: usize, row: usize) -> bool {
        let start = self.pixel_index(col, row);
        self.data[start..start + self.bands].iter().all(|v| v.is_nan())
    }

    /// Geographic footprint of the full raster.
    pub fn bbox(&self) -> BoundingBox {
        self.transform.raster_bbox(self.width, self.height)
    }

    /// Count of pixels with at least one valid sample.
    pub fn valid_pixel_count(&self) -> usize {
        let mut count = 0;
        for row in 0..self.height {
            for col in 0..self.width {
                if !self.is_nodata(col, row) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Copy a pixel-space window into a new raster.
    ///
    /// The window may extend past the raster edge; out-of-bounds pixels come
    /// back as nodata. The result carries the correctly shifted transform.
    pub fn window(&self, col: usize, row: usize, width: usize, height: usize) -> Raster {
        let mut out = Raster::filled_nodata(width, height, self.bands, self.transform.window(col, row));

        let copy_w = width.min(self.width.saturating_sub(col));
        let copy_h = height.min(self.height.saturating_sub(row));
        for dy in 0..copy_h {
            let src_start = self.pixel_index(col, row + dy);
            let src_end = src_start + copy_w * self.bands;
            let dst_start = out.pixel_index(0, dy);
            out.data[dst_start..dst_start + copy_w * self.bands]
                .copy_from_slice(&self.data[src_start..src_end]);
        }

        out
    }
}
