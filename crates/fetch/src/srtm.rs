//! SRTM 1-arc-second elevation provider.
//!
//! SRTM coverage is a fixed grid of 1°×1° cells, so discovery needs no
//! network round trip: the cells overlapping the query bbox are enumerated
//! from integer lat/lon and each resolves to a public bucket URL. Ocean
//! cells simply do not exist upstream and surface as permanent 404s.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tracing::debug;

use chip_common::{BoundingBox, ChipResult, SceneKind};

use crate::provider::{AssetRef, CatalogQuery, SceneDescriptor, SceneProvider};

/// Default tile URL template (AWS terrain tiles, skadi layout); `{dir}` is
/// the latitude band directory and `{cell}` the cell name.
pub const DEFAULT_SRTM_URL: &str =
    "https://elevation-tiles-prod.s3.amazonaws.com/skadi/{dir}/{cell}.hgt.gz";

/// SRTM-1 ground resolution, meters.
const SRTM_RESOLUTION_M: f64 = 30.0;

pub struct SrtmProvider {
    url_template: String,
}

impl SrtmProvider {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
        }
    }
}

impl Default for SrtmProvider {
    fn default() -> Self {
        Self::new(DEFAULT_SRTM_URL)
    }
}

#[async_trait]
impl SceneProvider for SrtmProvider {
    fn name(&self) -> &'static str {
        "srtm"
    }

    async fn discover(&self, query: &CatalogQuery) -> ChipResult<Vec<SceneDescriptor>> {
        let cells = cells_for_bbox(&query.bbox);
        debug!(count = cells.len(), "SRTM cells overlapping bbox");

        Ok(cells
            .into_iter()
            .map(|(lon, lat)| {
                let cell = cell_name(lon, lat);
                let url = self
                    .url_template
                    .replace("{dir}", &cell[..3])
                    .replace("{cell}", &cell);
                SceneDescriptor {
                    id: cell.clone(),
                    kind: SceneKind::Elevation,
                    bbox: BoundingBox::new(
                        lon as f64,
                        lat as f64,
                        (lon + 1) as f64,
                        (lat + 1) as f64,
                    ),
                    resolution_m: SRTM_RESOLUTION_M,
                    // SRTM was flown on a single shuttle mission.
                    acquired: Utc.with_ymd_and_hms(2000, 2, 11, 0, 0, 0).unwrap(),
                    assets: vec![AssetRef {
                        name: "data".to_string(),
                        url,
                        filename: format!("{}.hgt.gz", cell),
                    }],
                }
            })
            .collect())
    }
}

/// South-west corners of the 1°×1° cells overlapping a bbox.
fn cells_for_bbox(bbox: &BoundingBox) -> Vec<(i32, i32)> {
    let lon0 = bbox.west.floor() as i32;
    let lon1 = bbox.east.ceil() as i32;
    let lat0 = bbox.south.floor() as i32;
    let lat1 = bbox.north.ceil() as i32;

    let mut cells = Vec::new();
    for lat in lat0..lat1 {
        for lon in lon0..lon1 {
            cells.push((lon, lat));
        }
    }
    cells
}

/// Canonical cell name from its south-west corner, e.g. `S13W042`.
fn cell_name(lon: i32, lat: i32) -> String {
    format!(
        "{}{:02}{}{:03}",
        if lat >= 0 { "N" } else { "S" },
        lat.abs(),
        if lon >= 0 { "E" } else { "W" },
        lon.abs(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn query(bbox: BoundingBox) -> CatalogQuery {
        CatalogQuery {
            bbox,
            date_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            date_end: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            cloud_cover_max: 20.0,
        }
    }

    #[test]
    fn test_cell_names() {
        assert_eq!(cell_name(-42, -13), "S13W042");
        assert_eq!(cell_name(7, 46), "N46E007");
        assert_eq!(cell_name(0, 0), "N00E000");
    }

    #[test]
    fn test_cells_for_search_box() {
        // The Chapada Diamantina box spans two cells in each axis.
        let cells = cells_for_bbox(&BoundingBox::new(-41.65, -12.80, -40.95, -12.10));
        assert_eq!(cells.len(), 4);
        assert!(cells.contains(&(-42, -13)));
        assert!(cells.contains(&(-41, -13)));
        assert!(cells.contains(&(-42, -12)));
        assert!(cells.contains(&(-41, -12)));
    }

    #[tokio::test]
    async fn test_discover_builds_urls() {
        let provider = SrtmProvider::default();
        let scenes = provider
            .discover(&query(BoundingBox::new(-41.65, -12.80, -41.2, -12.40)))
            .await
            .unwrap();

        assert_eq!(scenes.len(), 1);
        let scene = &scenes[0];
        assert_eq!(scene.id, "S13W042");
        assert_eq!(scene.kind, SceneKind::Elevation);
        assert_eq!(
            scene.assets[0].url,
            "https://elevation-tiles-prod.s3.amazonaws.com/skadi/S13/S13W042.hgt.gz"
        );
        assert_eq!(scene.assets[0].filename, "S13W042.hgt.gz");
    }
}
