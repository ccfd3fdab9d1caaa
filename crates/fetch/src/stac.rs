//! STAC catalog provider for Sentinel-2 L2A true-color bands.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::{debug, info};

use chip_common::{BoundingBox, ChipError, ChipResult, SceneKind};

use crate::download::classify_request_error;
use crate::provider::{AssetRef, CatalogQuery, SceneDescriptor, SceneProvider};

/// Default public STAC endpoint (Microsoft Planetary Computer).
pub const DEFAULT_STAC_ENDPOINT: &str = "https://planetarycomputer.microsoft.com/api/stac/v1";

/// Bands fetched per scene, priority order (red defines the target grid).
const BANDS: [&str; 3] = ["B04", "B03", "B02"];

/// Sentinel-2 ground resolution of the visible bands, meters.
const S2_RESOLUTION_M: f64 = 10.0;

/// Queries a STAC API for Sentinel-2 L2A scenes.
pub struct StacProvider {
    client: reqwest::Client,
    endpoint: String,
    collection: String,
    /// Maximum number of scenes returned per query.
    limit: usize,
}

impl StacProvider {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            collection: "sentinel-2-l2a".to_string(),
            limit: 20,
        }
    }
}

#[async_trait]
impl SceneProvider for StacProvider {
    fn name(&self) -> &'static str {
        "sentinel2"
    }

    async fn discover(&self, query: &CatalogQuery) -> ChipResult<Vec<SceneDescriptor>> {
        let base = json!({
            "collections": [self.collection],
            "bbox": [query.bbox.west, query.bbox.south, query.bbox.east, query.bbox.north],
            "datetime": format!("{}/{}", query.date_start, query.date_end),
            "query": { "eo:cloud_cover": { "lt": query.cloud_cover_max } },
            "limit": self.limit,
        });

        let mut url = format!("{}/search", self.endpoint);
        let mut body = base.clone();
        let mut items = Vec::new();

        // Results come back one page at a time; follow the `next` link until
        // the catalog stops providing one.
        loop {
            debug!(url = %url, "STAC search page");

            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(classify_request_error)?;

            let status = response.status();
            if !status.is_success() {
                return Err(ChipError::Fetch {
                    message: format!("STAC search returned HTTP {}", status),
                    retryable: status.is_server_error(),
                });
            }

            let page: SearchPage = response.json().await.map_err(classify_request_error)?;
            items.extend(page.features);

            match next_request(&page.links, &base) {
                Some((next_url, next_body)) => {
                    url = next_url;
                    body = next_body;
                }
                None => break,
            }
        }

        let mut scenes = items_to_descriptors(items)?;
        scenes.sort_by_key(|s| s.acquired);

        info!(count = scenes.len(), "Sentinel-2 scenes matching criteria");
        Ok(scenes)
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    features: Vec<StacItem>,
    #[serde(default)]
    links: Vec<PageLink>,
}

/// Pagination link attached to a search page. STAC APIs paginate POST
/// searches by handing back a `next` link whose `body` either replaces the
/// request body or, when `merge` is set, is overlaid on it.
#[derive(Debug, Deserialize)]
struct PageLink {
    rel: String,
    href: String,
    #[serde(default)]
    body: Option<serde_json::Value>,
    #[serde(default)]
    merge: bool,
}

/// URL and POST body for the next search page, if the catalog provided one.
fn next_request(
    links: &[PageLink],
    base: &serde_json::Value,
) -> Option<(String, serde_json::Value)> {
    let next = links.iter().find(|link| link.rel == "next")?;
    let body = match &next.body {
        Some(value) if next.merge => {
            let mut merged = base.clone();
            if let (Some(into), Some(from)) = (merged.as_object_mut(), value.as_object()) {
                for (k, v) in from {
                    into.insert(k.clone(), v.clone());
                }
            }
            merged
        }
        Some(value) => value.clone(),
        None => base.clone(),
    };
    Some((next.href.clone(), body))
}

#[derive(Debug, Deserialize)]
struct StacItem {
    id: String,
    bbox: Vec<f64>,
    properties: ItemProperties,
    assets: HashMap<String, ItemAsset>,
}

#[derive(Debug, Deserialize)]
struct ItemProperties {
    datetime: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ItemAsset {
    href: String,
}

fn items_to_descriptors(items: Vec<StacItem>) -> ChipResult<Vec<SceneDescriptor>> {
    items
        .into_iter()
        .map(|item| {
            if item.bbox.len() < 4 {
                return Err(ChipError::Decode(format!(
                    "STAC item {} has malformed bbox",
                    item.id
                )));
            }

            let mut assets = Vec::with_capacity(BANDS.len());
            for band in BANDS {
                let asset = item.assets.get(band).ok_or_else(|| {
                    ChipError::MissingBand(format!("{} in STAC item {}", band, item.id))
                })?;
                assets.push(AssetRef {
                    name: band.to_string(),
                    url: asset.href.clone(),
                    filename: format!("{}_{}.tif", item.id, band),
                });
            }

            Ok(SceneDescriptor {
                id: item.id,
                kind: SceneKind::MultispectralComposite,
                bbox: BoundingBox::new(item.bbox[0], item.bbox[1], item.bbox[2], item.bbox[3]),
                resolution_m: S2_RESOLUTION_M,
                acquired: item.properties.datetime,
                assets,
            })
        })
        .collect()
}
