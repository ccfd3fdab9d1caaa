//! Common types and utilities shared across all geochip crates.

pub mod bbox;
pub mod context;
pub mod error;
pub mod scene;
pub mod transform;

pub use bbox::BoundingBox;
pub use context::{PaddingPolicy, ResampleMethod, RunConfig, RunContext, SceneFailure};
pub use error::{ChipError, ChipResult};
pub use scene::{Scene, SceneKind};
pub use transform::GeoTransform;
