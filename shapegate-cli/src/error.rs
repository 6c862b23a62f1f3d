//! Errors reported by the `shapegate` binary.
//!
//! Domain errors from the core and data crates are wrapped rather than
//! flattened so `main` can print them with their own messages.

use std::sync::Arc;

use camino::Utf8PathBuf;
use shapegate_core::{FileSetError, ParseGeometryTypeError, RegistryError, SubmitBlocked};
use shapegate_data::ProviderBuildError;
use thiserror::Error;

/// Errors emitted by the shapegate CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A geometry type override is not a known GeoJSON type.
    #[error("invalid --geometry-type: {0}")]
    InvalidGeometryType(#[source] ParseGeometryTypeError),
    /// Building the async runtime failed.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// Reading the selected files failed.
    #[error("failed to read {path:?}: {source}")]
    ReadSelection {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The selected files do not form one shapefile.
    #[error(transparent)]
    FileSet(#[from] FileSetError),
    /// Constructing an HTTP adapter failed.
    #[error("failed to build client for {base_url:?}: {source}")]
    BuildClient {
        base_url: String,
        #[source]
        source: ProviderBuildError,
    },
    /// Listing collections failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The requested collection is not visible to the project.
    #[error("collection {id} is not available to this project")]
    UnknownCollection { id: i64 },
    /// The controller refused to submit.
    #[error("not submitted: {0}")]
    SubmitBlocked(#[from] SubmitBlocked),
    /// The service refused or failed the submission.
    #[error("submission failed: {message}")]
    SubmissionFailed { message: String },
    /// Writing the report failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
