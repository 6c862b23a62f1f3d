//! Adapters connecting the shapegate domain to real formats and services.
//!
//! Responsibilities:
//! - Parse shapefile components and zip archives into decoded records.
//! - Talk to the CRS lookup, feature submission, and collection registry
//!   services over HTTP.
//!
//! Boundaries:
//! - Do not encode domain rules (live in `shapegate-core`).
//! - Report failures through the core error types; never retry.
//!
//! Invariants:
//! - No global mutable state.
//! - Every HTTP adapter is configured through one [`service::ServiceConfig`].

pub mod decode;
pub mod service;

pub use decode::ShapefileBytesDecoder;
pub use service::{
    HttpCollectionRegistry, HttpCrsLookup, HttpFeatureSubmitter, ProviderBuildError, ServiceConfig,
};
