//! On-disk scene fixtures backed by temporary files.

use std::path::{Path, PathBuf};

use chip_common::{BoundingBox, Scene, SceneKind};
use chrono::{TimeZone, Utc};

/// Write a synthetic SRTM `.hgt` tile (raw big-endian i16, `side`×`side`).
///
/// The value at (col, row) is `col + row`, with (0, 0) set to the SRTM void
/// sentinel so nodata handling gets exercised.
pub fn write_hgt_fixture(dir: &Path, cell_name: &str, side: usize) -> PathBuf {
    let mut bytes = Vec::with_capacity(side * side * 2);
    for row in 0..side {
        for col in 0..side {
            let v: i16 = if row == 0 && col == 0 {
                -32768
            } else {
                (col + row) as i16
            };
            bytes.extend_from_slice(&v.to_be_bytes());
        }
    }
    let path = dir.join(format!("{}.hgt", cell_name));
    std::fs::write(&path, bytes).expect("write hgt fixture");
    path
}

/// An elevation scene backed by a synthetic SRTM tile.
pub fn elevation_scene(dir: &Path, cell_name: &str, side: usize) -> Scene {
    let path = write_hgt_fixture(dir, cell_name, side);
    Scene {
        id: cell_name.to_string(),
        kind: SceneKind::Elevation,
        bbox: BoundingBox::new(-42.0, -13.0, -41.0, -12.0),
        resolution_m: 30.0,
        acquired: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        paths: vec![path],
    }
}
