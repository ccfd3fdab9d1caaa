//! SRTM `.hgt` height-grid decoding.
//!
//! SRTM tiles are raw big-endian i16 grids, one per 1°×1° cell, named after
//! the cell's south-west corner (`N12W042.hgt`). SRTM1 tiles are 3601×3601
//! samples, SRTM3 1201×1201; both include the shared edge row/column of the
//! neighboring cell. Voids are -32768.

use std::io::Read;
use std::path::Path;

use chip_common::{ChipError, ChipResult, GeoTransform};
use flate2::read::GzDecoder;

use crate::Raster;

const SRTM_VOID: i16 = -32768;

/// Decode an SRTM height tile (`.hgt` or gzip-compressed `.hgt.gz`).
pub fn decode_hgt(path: &Path) -> ChipResult<Raster> {
    let (lon, lat) = corner_from_name(path).ok_or_else(|| {
        ChipError::Decode(format!(
            "Cannot parse SRTM cell name from {}",
            path.display()
        ))
    })?;

    let bytes = read_maybe_gzip(path)?;

    let n_samples = bytes.len() / 2;
    let side = (n_samples as f64).sqrt() as usize;
    if side * side * 2 != bytes.len() || side < 2 {
        return Err(ChipError::Decode(format!(
            "{}: not a square i16 grid ({} bytes)",
            path.display(),
            bytes.len()
        )));
    }

    let data: Vec<f32> = bytes
        .chunks_exact(2)
        .map(|pair| {
            let v = i16::from_be_bytes([pair[0], pair[1]]);
            if v == SRTM_VOID {
                f32::NAN
            } else {
                v as f32
            }
        })
        .collect();

    // Samples are point measurements spaced 1/(side-1) degrees, row 0 at the
    // northern edge. Shift by half a pixel for the area convention.
    let px = 1.0 / (side - 1) as f64;
    let transform = GeoTransform::north_up(
        lon as f64 - px / 2.0,
        (lat + 1) as f64 + px / 2.0,
        px,
        px,
    );

    Ok(Raster {
        width: side,
        height: side,
        bands: 1,
        data,
        transform,
    })
}

fn read_maybe_gzip(path: &Path) -> ChipResult<Vec<u8>> {
    let raw = std::fs::read(path)?;
    let is_gzip = path
        .to_str()
        .map(|s| s.ends_with(".gz"))
        .unwrap_or(false);
    if !is_gzip {
        return Ok(raw);
    }

    let mut out = Vec::new();
    GzDecoder::new(raw.as_slice())
        .read_to_end(&mut out)
        .map_err(|e| ChipError::Decode(format!("{}: gzip: {}", path.display(), e)))?;
    Ok(out)
}

/// South-west corner (lon, lat) from a cell name like `N12W042`.
fn corner_from_name(path: &Path) -> Option<(i32, i32)> {
    let name = path.file_name()?.to_str()?;
    let cell = name.split('.').next()?;
    // Byte-wise so a stem with multibyte characters cannot slice across a
    // char boundary.
    let bytes = cell.as_bytes();
    if bytes.len() != 7 {
        return None;
    }

    let lat_sign = match bytes[0] {
        b'N' | b'n' => 1,
        b'S' | b's' => -1,
        _ => return None,
    };
    let lat: i32 = cell.get(1..3)?.parse().ok()?;

    let lon_sign = match bytes[3] {
        b'E' | b'e' => 1,
        b'W' | b'w' => -1,
        _ => return None,
    };
    let lon: i32 = cell.get(4..7)?.parse().ok()?;

    Some((lon_sign * lon, lat_sign * lat))
}
