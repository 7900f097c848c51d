//! # Google Photos Catalog Provider
//!
//! Implements the `MediaCatalog` trait against the Google Photos Library
//! API v1: paginated media item listing, batched identity lookup, and
//! download URL derivation.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::GooglePhotosConnector;
pub use error::{GooglePhotosError, Result};
