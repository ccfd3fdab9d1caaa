//! Catalog provider abstraction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use chip_common::{BoundingBox, ChipResult, SceneKind};

/// What to ask a catalog for.
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    pub bbox: BoundingBox,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    /// Maximum scene cloud cover in percent; ignored by cloud-free sources.
    pub cloud_cover_max: f32,
}

/// One downloadable asset of a scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRef {
    /// Asset name within the scene (band name, or "data" for single assets).
    pub name: String,
    pub url: String,
    /// Filename the asset is stored under locally.
    pub filename: String,
}

/// A discovered scene, not yet downloaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub id: String,
    pub kind: SceneKind,
    pub bbox: BoundingBox,
    pub resolution_m: f64,
    pub acquired: DateTime<Utc>,
    /// Assets in priority order (for multispectral scenes, highest-priority
    /// band first).
    pub assets: Vec<AssetRef>,
}

/// A catalog answering scene discovery queries.
///
/// Implementations return scenes whose footprint intersects the query bbox,
/// sorted by acquisition date.
#[async_trait]
pub trait SceneProvider: Send + Sync {
    /// Provider name, used in logs and error messages.
    fn name(&self) -> &'static str;

    async fn discover(&self, query: &CatalogQuery) -> ChipResult<Vec<SceneDescriptor>>;
}
