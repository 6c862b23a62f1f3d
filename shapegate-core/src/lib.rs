//! Core domain for shapefile ingestion.
//!
//! The crate groups selected files into a [`ShapefileBundle`], decodes and
//! locates it through collaborator traits, judges it against a
//! [`TargetCollection`], and builds the [`SubmissionPayload`] sent to the
//! feature service. [`IngestionController`] sequences those steps for one
//! form and [`IngestionPipeline`] drives the asynchronous parts.
//!
//! Parsing, CRS lookup, and submission are abstracted by
//! [`ShapefileDecoder`], [`CrsLookup`], and [`FeatureSubmitter`]; concrete
//! adapters live in `shapegate-data`.

#![forbid(unsafe_code)]

mod bundle;
mod collection;
mod compatibility;
mod controller;
mod crs;
mod decode;
mod features;
mod file_set;
mod geometry;
mod pipeline;
mod session;
mod submission;

#[doc(hidden)]
pub mod test_support;

pub use bundle::{ARCHIVE_EXTENSION, BundleContents, RawFile, ShapefileBundle, ShapefileComponents};
pub use collection::{
    CollectionId, CollectionRegistry, CollectionScope, ProjectId, RegistryError,
    StaticCollectionRegistry, TargetCollection, find_collection,
};
pub use compatibility::{
    CompatibilityVerdict, EvaluationContext, Notice, ProjectCrs, Severity, evaluate, notices,
};
pub use controller::{
    Generation, IngestionController, PendingSubmission, PendingWork, Phase, Settlement,
    SettlementOutcome, SubmissionTicket, SubmitBlocked, SubmitOutcome,
};
pub use crs::{CrsDescriptor, CrsLookup, CrsLookupError, CrsResolution, resolve_crs};
pub use decode::{DecodeError, DecoderFailure, ShapefileDecoder, decode_bundle};
pub use features::{
    ArchiveDecode, AttributeValue, Attributes, DecodedFeatureSet, DecodedRecord, Feature,
    FeatureCollection,
};
pub use file_set::{FileSetError, REQUIRED_EXTENSIONS, resolve_file_set, split_file_name};
pub use geometry::{GeometryType, ParseGeometryTypeError};
pub use pipeline::IngestionPipeline;
pub use session::IngestionSession;
pub use submission::{
    COMPONENT_FIELDS, FIELD_ARCHIVE, FIELD_DEFAULT_HUB_HEIGHT, FIELD_DEFAULT_ROTOR_DIAMETER,
    FIELD_HUB_HEIGHT, FIELD_NAME, FIELD_ROTOR_DIAMETER, FIELD_TURBINE_NUMBER, FeatureSubmitter,
    GENERIC_SUBMISSION_FAILURE, INTERNAL_SERVER_ERROR, PartValue, PayloadPart, SubmissionError,
    SubmissionPayload, SubmissionReceipt, TurbineParameters, build_payload,
};
