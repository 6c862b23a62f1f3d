//! HTTP adapters for the CRS lookup, submission, and collection services.
//!
//! Each adapter owns a `reqwest` client configured from a shared
//! [`ServiceConfig`]. Transport failures are mapped onto the core error
//! types; nothing is retried.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use shapegate_data::service::{HttpCrsLookup, ServiceConfig};
//!
//! let config = ServiceConfig::new("http://localhost:8080/api")
//!     .with_timeout(Duration::from_secs(10));
//! let lookup = HttpCrsLookup::with_config(config)?;
//! # let _ = lookup;
//! # Ok::<(), shapegate_data::service::ProviderBuildError>(())
//! ```

mod config;
mod crs;
mod registry;
mod responses;
mod submit;

pub use config::{DEFAULT_USER_AGENT, ProviderBuildError, ServiceConfig};
pub use crs::HttpCrsLookup;
pub use registry::HttpCollectionRegistry;
pub use responses::{CollectionRecord, CreatedResponse, CrsResponse, ErrorResponse};
pub use submit::{HttpFeatureSubmitter, interpret_submission_response, multipart_form};
