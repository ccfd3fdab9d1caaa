//! Tile grid layout and addressing.

use chip_common::{BoundingBox, ChipError, ChipResult, GeoTransform, PaddingPolicy};

/// One tile's place in the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSpec {
    pub row: usize,
    pub col: usize,
    /// Pixel offset of the tile's top-left corner in the parent raster.
    pub px_x: usize,
    pub px_y: usize,
    /// Emitted tile dimensions. Equal to the grid's tile size except for
    /// edge tiles under the truncate policy.
    pub width: usize,
    pub height: usize,
}

impl TileSpec {
    /// Deterministic tile identifier, re-derivable from row/col alone.
    pub fn id(&self, scene_id: &str) -> String {
        format!("{}_{}_{}", scene_id, self.row, self.col)
    }

    /// Geographic footprint: the parent transform applied to this tile's
    /// pixel rectangle. Exact affine arithmetic, no re-georeferencing.
    pub fn footprint(&self, parent: &GeoTransform) -> BoundingBox {
        parent.pixel_rect_bbox(self.px_x, self.px_y, self.width, self.height)
    }
}

/// Row-major fixed-size tile layout over a raster, starting at pixel (0,0).
#[derive(Debug, Clone)]
pub struct TileGrid {
    raster_width: usize,
    raster_height: usize,
    tile_size: usize,
    policy: PaddingPolicy,
}

impl TileGrid {
    /// Lay out a grid over a raster of the given pixel dimensions.
    ///
    /// Fails with [`ChipError::RasterTooSmall`] when the raster is smaller
    /// than one tile in either dimension and padding is disabled.
    pub fn new(
        raster_width: usize,
        raster_height: usize,
        tile_size: usize,
        policy: PaddingPolicy,
    ) -> ChipResult<Self> {
        if policy == PaddingPolicy::Truncate
            && (raster_width < tile_size || raster_height < tile_size)
        {
            return Err(ChipError::RasterTooSmall {
                width: raster_width,
                height: raster_height,
                tile_size,
            });
        }

        Ok(Self {
            raster_width,
            raster_height,
            tile_size,
            policy,
        })
    }

    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    pub fn rows(&self) -> usize {
        self.raster_height.div_ceil(self.tile_size)
    }

    pub fn cols(&self) -> usize {
        self.raster_width.div_ceil(self.tile_size)
    }

    /// The tile at (row, col), or None outside the grid.
    pub fn tile(&self, row: usize, col: usize) -> Option<TileSpec> {
        if row >= self.rows() || col >= self.cols() {
            return None;
        }

        let px_x = col * self.tile_size;
        let px_y = row * self.tile_size;
        let (width, height) = match self.policy {
            PaddingPolicy::Pad => (self.tile_size, self.tile_size),
            PaddingPolicy::Truncate => (
                self.tile_size.min(self.raster_width - px_x),
                self.tile_size.min(self.raster_height - px_y),
            ),
        };

        Some(TileSpec {
            row,
            col,
            px_x,
            px_y,
            width,
            height,
        })
    }

    /// Iterate all tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = TileSpec> + '_ {
        let cols = self.cols();
        (0..self.rows() * cols).map(move |i| {
            self.tile(i / cols, i % cols)
                .expect("index within grid bounds")
        })
    }

    /// Which tile contains the given parent-raster pixel.
    pub fn tile_containing(&self, px: usize, py: usize) -> Option<(usize, usize)> {
        if px >= self.raster_width || py >= self.raster_height {
            return None;
        }
        Some((py / self.tile_size, px / self.tile_size))
    }
}
