//! Manifest: the durable index mapping tile identifiers to footprints and
//! source provenance.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use chip_common::{BoundingBox, ChipError, ChipResult};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One manifest record per emitted tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Tile identifier, `{scene_id}_{row}_{col}`.
    pub id: String,
    pub scene_id: String,
    pub row: usize,
    pub col: usize,
    /// Geographic footprint in WGS-84.
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
    /// Emitted tile dimensions (differs from the tile size only for edge
    /// tiles under the truncate policy).
    pub width_px: usize,
    pub height_px: usize,
    /// Path of the tile image, relative to the output root.
    pub path: String,
}

impl ManifestEntry {
    pub fn footprint(&self) -> BoundingBox {
        BoundingBox::new(self.west, self.south, self.east, self.north)
    }
}

/// Write the manifest as JSON lines, atomically.
///
/// The file is staged in a temporary sibling and renamed into place on
/// completion, so a crashed run never leaves a manifest that disagrees with
/// the tile files on disk.
pub fn write_manifest(entries: &[ManifestEntry], path: &Path) -> ChipResult<()> {
    let dir = path.parent().ok_or_else(|| {
        ChipError::ManifestWrite(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "manifest path has no parent directory",
        ))
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(ChipError::ManifestWrite)?;
    for entry in entries {
        let line = serde_json::to_string(entry)
            .map_err(|e| ChipError::ManifestWrite(std::io::Error::other(e)))?;
        writeln!(tmp, "{}", line).map_err(ChipError::ManifestWrite)?;
    }
    tmp.flush().map_err(ChipError::ManifestWrite)?;
    tmp.persist(path)
        .map_err(|e| ChipError::ManifestWrite(e.error))?;

    info!(path = %path.display(), entries = entries.len(), "Manifest written");
    Ok(())
}

/// Read a JSON-lines manifest back.
pub fn read_manifest(path: &Path) -> ChipResult<Vec<ManifestEntry>> {
    let file = File::open(path)?;
    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}
