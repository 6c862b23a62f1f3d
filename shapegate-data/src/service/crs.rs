//! HTTP client for the CRS lookup service.

use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Body, Client};
use shapegate_core::{CrsDescriptor, CrsLookup, CrsLookupError};

use super::config::{ProviderBuildError, ServiceConfig, TransportFailure};
use super::responses::CrsResponse;

const PRJ_PATH: &str = "crs/from-prj";
const ARCHIVE_PATH: &str = "crs/from-zip";

/// [`CrsLookup`] backed by the service's `crs/from-prj` and `crs/from-zip`
/// endpoints.
#[derive(Debug, Clone)]
pub struct HttpCrsLookup {
    client: Client,
    config: ServiceConfig,
}

impl HttpCrsLookup {
    /// Create a lookup for the API at `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(ServiceConfig::new(base_url))
    }

    /// Create a lookup with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: ServiceConfig) -> Result<Self, ProviderBuildError> {
        let client = config.build_client()?;
        Ok(Self { client, config })
    }

    async fn identify(
        &self,
        path: &str,
        content_type: &'static str,
        body: impl Into<Body>,
    ) -> Result<CrsDescriptor, CrsLookupError> {
        let url = self.config.endpoint(path);
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        let parsed: CrsResponse = response
            .json()
            .await
            .map_err(|err| CrsLookupError::Parse {
                message: err.to_string(),
            })?;
        debug!("{url} identified EPSG:{}", parsed.srid);
        Ok(parsed.into())
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> CrsLookupError {
        match TransportFailure::classify(error) {
            TransportFailure::Timeout => CrsLookupError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            },
            TransportFailure::Status(status) => CrsLookupError::Http {
                url: url.to_owned(),
                status,
                message: error.to_string(),
            },
            TransportFailure::Network => CrsLookupError::Network {
                url: url.to_owned(),
                message: error.to_string(),
            },
        }
    }
}

#[async_trait(?Send)]
impl CrsLookup for HttpCrsLookup {
    async fn crs_from_prj(&self, prj: &str) -> Result<CrsDescriptor, CrsLookupError> {
        self.identify(PRJ_PATH, "text/plain", prj.to_owned()).await
    }

    async fn crs_from_archive(&self, archive: &[u8]) -> Result<CrsDescriptor, CrsLookupError> {
        self.identify(ARCHIVE_PATH, "application/zip", archive.to_vec())
            .await
    }
}
