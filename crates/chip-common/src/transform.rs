//! Affine pixel↔geographic transforms for north-up rasters.

use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Affine mapping between pixel coordinates and geographic (WGS-84)
/// coordinates, using the GDAL coefficient convention:
///
/// ```text
/// lon = origin_x + col * pixel_width  + row * row_rotation
/// lat = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// `pixel_height` is negative for north-up rasters (row 0 is the northern
/// edge). Rotation terms are carried for completeness but every source this
/// pipeline ingests is axis-aligned, so they are zero in practice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform from an origin (top-left corner) and pixel sizes.
    ///
    /// `pixel_height` must be positive; it is negated internally.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y,
            col_rotation: 0.0,
            pixel_height: -pixel_height,
        }
    }

    /// North-up transform covering `bbox` exactly with a raster of the given
    /// pixel dimensions.
    pub fn from_bbox(bbox: &BoundingBox, width: usize, height: usize) -> Self {
        Self::north_up(
            bbox.west,
            bbox.north,
            bbox.width() / width as f64,
            bbox.height() / height as f64,
        )
    }

    /// Geographic coordinate of the top-left corner of pixel (col, row).
    ///
    /// Fractional pixel coordinates are valid and map linearly, so
    /// `pixel_to_geo(width, height)` yields the bottom-right corner of the
    /// raster.
    pub fn pixel_to_geo(&self, col: f64, row: f64) -> (f64, f64) {
        let lon = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let lat = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (lon, lat)
    }

    /// Fractional pixel coordinate of a geographic point.
    ///
    /// Inverse of [`pixel_to_geo`](Self::pixel_to_geo); only valid for
    /// axis-aligned transforms (zero rotation terms).
    pub fn geo_to_pixel(&self, lon: f64, lat: f64) -> (f64, f64) {
        let col = (lon - self.origin_x) / self.pixel_width;
        let row = (lat - self.origin_y) / self.pixel_height;
        (col, row)
    }

    /// Geographic footprint of a pixel-space rectangle, computed by exact
    /// affine arithmetic on its corners.
    pub fn pixel_rect_bbox(&self, col: usize, row: usize, width: usize, height: usize) -> BoundingBox {
        let corners = [
            self.pixel_to_geo(col as f64, row as f64),
            self.pixel_to_geo((col + width) as f64, row as f64),
            self.pixel_to_geo(col as f64, (row + height) as f64),
            self.pixel_to_geo((col + width) as f64, (row + height) as f64),
        ];

        let mut west = f64::INFINITY;
        let mut south = f64::INFINITY;
        let mut east = f64::NEG_INFINITY;
        let mut north = f64::NEG_INFINITY;
        for (lon, lat) in corners {
            west = west.min(lon);
            south = south.min(lat);
            east = east.max(lon);
            north = north.max(lat);
        }

        BoundingBox::new(west, south, east, north)
    }

    /// Footprint of an entire raster with the given dimensions.
    pub fn raster_bbox(&self, width: usize, height: usize) -> BoundingBox {
        self.pixel_rect_bbox(0, 0, width, height)
    }

    /// Transform for a raster resized by the given ratios (new_dim/old_dim).
    ///
    /// The origin is unchanged; pixel sizes grow by the inverse ratio so the
    /// geographic extent is preserved exactly.
    pub fn scaled(&self, ratio_x: f64, ratio_y: f64) -> Self {
        Self {
            origin_x: self.origin_x,
            pixel_width: self.pixel_width / ratio_x,
            row_rotation: self.row_rotation / ratio_y,
            origin_y: self.origin_y,
            col_rotation: self.col_rotation / ratio_x,
            pixel_height: self.pixel_height / ratio_y,
        }
    }

    /// Transform for a sub-window starting at pixel (col, row) of the parent.
    pub fn window(&self, col: usize, row: usize) -> Self {
        let (origin_x, origin_y) = self.pixel_to_geo(col as f64, row as f64);
        Self {
            origin_x,
            origin_y,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_to_geo_roundtrip() {
        let t = GeoTransform::north_up(-41.65, -12.10, 0.001, 0.001);
        let (lon, lat) = t.pixel_to_geo(350.0, 120.0);
        let (col, row) = t.geo_to_pixel(lon, lat);
        assert!((col - 350.0).abs() < 1e-9);
        assert!((row - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_bbox_covers_extent() {
        let bbox = BoundingBox::new(-41.65, -12.80, -40.95, -12.10);
        let t = GeoTransform::from_bbox(&bbox, 700, 700);
        let full = t.raster_bbox(700, 700);
        assert!((full.west - bbox.west).abs() < 1e-12);
        assert!((full.south - bbox.south).abs() < 1e-9);
        assert!((full.east - bbox.east).abs() < 1e-9);
        assert!((full.north - bbox.north).abs() < 1e-12);
    }

    #[test]
    fn test_scaled_preserves_extent() {
        let bbox = BoundingBox::new(10.0, 40.0, 11.0, 41.0);
        let t = GeoTransform::from_bbox(&bbox, 2000, 1500);
        let shrunk = t.scaled(1000.0 / 2000.0, 750.0 / 1500.0);
        let full = shrunk.raster_bbox(1000, 750);
        assert!((full.west - bbox.west).abs() < 1e-9);
        assert!((full.east - bbox.east).abs() < 1e-9);
        assert!((full.north - bbox.north).abs() < 1e-9);
        assert!((full.south - bbox.south).abs() < 1e-9);
    }

    #[test]
    fn test_window_transform() {
        let t = GeoTransform::north_up(0.0, 10.0, 0.01, 0.01);
        let w = t.window(100, 200);
        assert!((w.origin_x - 1.0).abs() < 1e-12);
        assert!((w.origin_y - 8.0).abs() < 1e-12);
        assert_eq!(w.pixel_width, t.pixel_width);
    }
}
