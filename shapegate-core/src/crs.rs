//! Identify the coordinate reference system of a bundle.
//!
//! The [`CrsLookup`] trait abstracts the external lookup service. Callers use
//! [`resolve_crs`], which picks the endpoint matching the bundle form and
//! collapses every failure into [`CrsResolution::Unresolved`].

use std::fmt;

use async_trait::async_trait;
use log::warn;
use thiserror::Error;

use crate::bundle::{BundleContents, ShapefileBundle};

/// A coordinate reference system identified by the lookup service.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CrsDescriptor {
    /// Spatial reference identifier, e.g. an EPSG code.
    pub srid: i32,
    /// Human-readable name, when the service knows one.
    pub name: Option<String>,
}

impl CrsDescriptor {
    /// Construct a descriptor without a name.
    pub const fn from_srid(srid: i32) -> Self {
        Self { srid, name: None }
    }

    /// Attach a human-readable name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Display for CrsDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} (EPSG:{})", self.srid),
            None => write!(f, "EPSG:{}", self.srid),
        }
    }
}

/// State of the CRS lookup for the current bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CrsResolution {
    /// The lookup has not settled yet.
    #[default]
    Pending,
    /// The service identified the CRS.
    Resolved(CrsDescriptor),
    /// The lookup failed; only reselecting files retries it.
    Unresolved,
}

impl CrsResolution {
    /// The resolved descriptor, if any.
    pub const fn descriptor(&self) -> Option<&CrsDescriptor> {
        match self {
            Self::Resolved(descriptor) => Some(descriptor),
            Self::Pending | Self::Unresolved => None,
        }
    }

    /// Whether the lookup has settled, successfully or not.
    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether the lookup failed.
    pub const fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved)
    }
}

/// Errors from [`CrsLookup`] implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrsLookupError {
    /// The request could not be delivered.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Request URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The request exceeded its deadline.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// The service answered with a non-success status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },
    /// The response body did not match the expected shape.
    #[error("failed to parse CRS response: {message}")]
    Parse {
        /// Parser error description.
        message: String,
    },
}

/// External service identifying a CRS from projection text or an archive.
#[async_trait(?Send)]
pub trait CrsLookup {
    /// Identify the CRS described by `.prj` text.
    async fn crs_from_prj(&self, prj: &str) -> Result<CrsDescriptor, CrsLookupError>;

    /// Identify the CRS of the shapefile inside `archive`.
    async fn crs_from_archive(&self, archive: &[u8]) -> Result<CrsDescriptor, CrsLookupError>;
}

/// Look up the CRS of `bundle`.
///
/// Archives are sent whole; component bundles send only their `.prj` text.
/// Failures are logged and reported as [`CrsResolution::Unresolved`] without
/// retrying.
pub async fn resolve_crs<L>(lookup: &L, bundle: &ShapefileBundle) -> CrsResolution
where
    L: CrsLookup + ?Sized,
{
    let outcome = match bundle.contents() {
        BundleContents::Archive(archive) => lookup.crs_from_archive(archive).await,
        BundleContents::Components(components) => {
            lookup.crs_from_prj(&components.prj_text()).await
        }
    };
    match outcome {
        Ok(descriptor) => CrsResolution::Resolved(descriptor),
        Err(err) => {
            warn!("CRS lookup for {:?} failed: {err}", bundle.name());
            CrsResolution::Unresolved
        }
    }
}
