//! Raster handling for the geochip pipeline.
//!
//! Decodes heterogeneous source rasters (GeoTIFF, SRTM height grids) into a
//! single in-memory representation, composites spectral bands into true-color
//! rasters, and normalizes arbitrary bit depths into bounded 8-bit previews.

pub mod composite;
pub mod decode;
pub mod model;
pub mod normalize;
pub mod resample;

pub use composite::composite_bands;
pub use decode::{decode_scene, open_raster};
pub use model::Raster;
pub use normalize::{normalize, NormalizedImage};
