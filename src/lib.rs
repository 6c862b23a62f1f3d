//! Facade crate for the shapegate ingestion pipeline.
//!
//! This crate re-exports the core domain types and, behind the `data`
//! feature, the shapefile decoder and HTTP service adapters.

#![forbid(unsafe_code)]

pub use shapegate_core::{
    CollectionId, CollectionRegistry, CompatibilityVerdict, CrsDescriptor, CrsLookup,
    CrsResolution, DecodedFeatureSet, FeatureSubmitter, FileSetError, GeometryType,
    IngestionController, IngestionPipeline, IngestionSession, Notice, ProjectCrs, RawFile,
    ShapefileBundle, ShapefileDecoder, SubmitOutcome, TargetCollection,
};

#[cfg(feature = "data")]
pub use shapegate_data::{
    HttpCollectionRegistry, HttpCrsLookup, HttpFeatureSubmitter, ServiceConfig,
    ShapefileBytesDecoder,
};
