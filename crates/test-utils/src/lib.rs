//! Shared test utilities for the geochip workspace.
//!
//! Provides synthetic raster generators and scene fixtures so tests never
//! depend on downloaded imagery.

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;
