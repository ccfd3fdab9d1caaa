//! Tiling: partition normalized rasters into fixed-size, stably addressed
//! image chips, and record them in a manifest.

pub mod grid;
pub mod manifest;
pub mod writer;

pub use grid::{TileGrid, TileSpec};
pub use manifest::{read_manifest, write_manifest, ManifestEntry};
pub use writer::{tile_scene, write_png};
