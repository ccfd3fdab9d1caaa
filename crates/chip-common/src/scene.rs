//! Scene descriptors: one downloaded raster asset per source and date.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// The kind of imagery source a scene came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SceneKind {
    /// Multi-band optical imagery composited to true color (Sentinel-2).
    MultispectralComposite,
    /// Single-band elevation data (SRTM).
    Elevation,
    /// Pre-composited basemap mosaic quad (NICFI).
    MosaicQuad,
}

impl SceneKind {
    /// Number of channels a normalized raster of this kind carries.
    pub fn channels(&self) -> usize {
        match self {
            SceneKind::MultispectralComposite | SceneKind::MosaicQuad => 3,
            SceneKind::Elevation => 1,
        }
    }
}

/// One fetched raster asset. Immutable once downloaded.
///
/// For multispectral scenes `paths` holds one file per band in priority
/// order (highest-priority band first); for single-asset scenes it holds
/// exactly one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Stable identifier, unique within a run (catalog item id or tile name).
    pub id: String,
    pub kind: SceneKind,
    /// Geographic footprint of the asset in WGS-84.
    pub bbox: BoundingBox,
    /// Native ground resolution in meters per pixel.
    pub resolution_m: f64,
    /// Acquisition timestamp reported by the catalog.
    pub acquired: DateTime<Utc>,
    /// Local storage paths of the downloaded asset(s).
    pub paths: Vec<PathBuf>,
}

impl Scene {
    pub fn primary_path(&self) -> &PathBuf {
        &self.paths[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_channels() {
        assert_eq!(SceneKind::MultispectralComposite.channels(), 3);
        assert_eq!(SceneKind::MosaicQuad.channels(), 3);
        assert_eq!(SceneKind::Elevation.channels(), 1);
    }
}
