//! Scene discovery and acquisition.
//!
//! Catalog providers answer "which scenes intersect this bbox and date
//! range"; the downloader resolves their assets to local files with bounded
//! retry. Everything downstream of this crate works from local paths only.

pub mod download;
pub mod nicfi;
pub mod provider;
pub mod retry;
pub mod srtm;
pub mod stac;

pub use download::{Downloader, DownloaderConfig};
pub use provider::{AssetRef, CatalogQuery, SceneDescriptor, SceneProvider};
pub use retry::{retry_with_backoff, RetryPolicy};
