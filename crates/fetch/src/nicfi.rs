//! Planet NICFI monthly mosaic provider.
//!
//! NICFI basemaps are served as pre-composited mosaic quads. Discovery asks
//! the basemaps API for the monthly mosaic, then lists the quads
//! intersecting the query bbox. The API key is handed in by the caller as
//! an opaque token; this crate never reads credentials itself.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use chip_common::{BoundingBox, ChipError, ChipResult, SceneKind};

use crate::download::classify_request_error;
use crate::provider::{AssetRef, CatalogQuery, SceneDescriptor, SceneProvider};

/// Default Planet basemaps API endpoint.
pub const DEFAULT_NICFI_ENDPOINT: &str = "https://api.planet.com/basemaps/v1";

/// NICFI medium-resolution mosaic ground resolution, meters.
const NICFI_RESOLUTION_M: f64 = 4.77;

pub struct NicfiProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    /// Mosaic month, e.g. (2024, 3).
    year: i32,
    month: u32,
}

impl NicfiProvider {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        year: i32,
        month: u32,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            year,
            month,
        }
    }

    fn mosaic_id(&self) -> String {
        format!("nicfi_monthly_{}_{:02}_mosaic", self.year, self.month)
    }
}

#[async_trait]
impl SceneProvider for NicfiProvider {
    fn name(&self) -> &'static str {
        "nicfi"
    }

    async fn discover(&self, query: &CatalogQuery) -> ChipResult<Vec<SceneDescriptor>> {
        let mosaic_url = format!("{}/mosaics/{}", self.endpoint, self.mosaic_id());
        debug!(mosaic = %self.mosaic_id(), "Fetching NICFI mosaic metadata");

        let mosaic: Mosaic = self
            .get_json(&mosaic_url)
            .await?;

        let acquired = Utc
            .with_ymd_and_hms(self.year, self.month, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| {
                ChipError::fetch_permanent(format!(
                    "Invalid mosaic month {}-{}",
                    self.year, self.month
                ))
            })?;

        // Follow quad listing pages until exhausted.
        let mut scenes = Vec::new();
        let mut next = Some(format!(
            "{}?bbox={}",
            mosaic.links.quads,
            query.bbox.to_csv()
        ));
        while let Some(url) = next.take() {
            let page: QuadPage = self.get_json(&url).await?;
            for quad in page.items {
                scenes.push(quad_to_descriptor(quad, acquired)?);
            }
            next = page.links.and_then(|l| l.next);
        }

        scenes.sort_by(|a, b| a.id.cmp(&b.id));
        info!(count = scenes.len(), "NICFI quads intersecting bbox");
        Ok(scenes)
    }
}

impl NicfiProvider {
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> ChipResult<T> {
        let response = self
            .client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChipError::Fetch {
                message: format!("NICFI API returned HTTP {} for {}", status, url),
                retryable: status.is_server_error(),
            });
        }

        response.json().await.map_err(classify_request_error)
    }
}

#[derive(Debug, Deserialize)]
struct Mosaic {
    #[serde(rename = "_links")]
    links: MosaicLinks,
}

#[derive(Debug, Deserialize)]
struct MosaicLinks {
    quads: String,
}

#[derive(Debug, Deserialize)]
struct QuadPage {
    items: Vec<Quad>,
    #[serde(rename = "_links")]
    links: Option<PageLinks>,
}

#[derive(Debug, Deserialize)]
struct PageLinks {
    #[serde(rename = "_next")]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Quad {
    id: String,
    bbox: Vec<f64>,
    #[serde(rename = "_links")]
    links: QuadLinks,
}

#[derive(Debug, Deserialize)]
struct QuadLinks {
    download: String,
}

fn quad_to_descriptor(
    quad: Quad,
    acquired: chrono::DateTime<Utc>,
) -> ChipResult<SceneDescriptor> {
    if quad.bbox.len() < 4 {
        return Err(ChipError::Decode(format!(
            "NICFI quad {} has malformed bbox",
            quad.id
        )));
    }

    Ok(SceneDescriptor {
        id: quad.id.clone(),
        kind: SceneKind::MosaicQuad,
        bbox: BoundingBox::new(quad.bbox[0], quad.bbox[1], quad.bbox[2], quad.bbox[3]),
        resolution_m: NICFI_RESOLUTION_M,
        acquired,
        assets: vec![AssetRef {
            name: "data".to_string(),
            url: quad.links.download.clone(),
            filename: format!("{}.tif", quad.id),
        }],
    })
}
