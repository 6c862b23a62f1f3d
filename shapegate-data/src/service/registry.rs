//! HTTP client for the collection listing.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use shapegate_core::{CollectionRegistry, ProjectId, RegistryError, TargetCollection};
use url::Url;

use super::config::{ProviderBuildError, ServiceConfig};
use super::responses::CollectionRecord;

const COLLECTIONS_PATH: &str = "feature-collections";

/// [`CollectionRegistry`] backed by `GET feature-collections`.
#[derive(Debug, Clone)]
pub struct HttpCollectionRegistry {
    client: Client,
    config: ServiceConfig,
}

impl HttpCollectionRegistry {
    /// Create a registry for the API at `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(ServiceConfig::new(base_url))
    }

    /// Create a registry with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: ServiceConfig) -> Result<Self, ProviderBuildError> {
        let client = config.build_client()?;
        Ok(Self { client, config })
    }

    /// Listing URL, filtered to `project` when given.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unavailable`] when the base URL is invalid.
    pub fn listing_url(&self, project: Option<ProjectId>) -> Result<Url, RegistryError> {
        let raw = self.config.endpoint(COLLECTIONS_PATH);
        let mut url = Url::parse(&raw).map_err(|err| RegistryError::Unavailable {
            url: raw.clone(),
            message: err.to_string(),
        })?;
        if let Some(project) = project {
            url.query_pairs_mut()
                .append_pair("project_id", &project.to_string());
        }
        Ok(url)
    }
}

#[async_trait(?Send)]
impl CollectionRegistry for HttpCollectionRegistry {
    async fn list_collections(
        &self,
        project: Option<ProjectId>,
    ) -> Result<Vec<TargetCollection>, RegistryError> {
        let url = self.listing_url(project)?;
        let unavailable = |err: reqwest::Error| RegistryError::Unavailable {
            url: url.to_string(),
            message: err.to_string(),
        };
        let records: Vec<CollectionRecord> = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?
            .json()
            .await
            .map_err(|err| RegistryError::Parse {
                message: err.to_string(),
            })?;
        debug!("{url} listed {} collection(s)", records.len());
        Ok(usable_collections(records))
    }
}

/// Convert listed records, skipping those whose geometry type is unsupported.
fn usable_collections(records: Vec<CollectionRecord>) -> Vec<TargetCollection> {
    records
        .into_iter()
        .filter_map(|record| match TargetCollection::try_from(record) {
            Ok(collection) => Some(collection),
            Err(err) => {
                warn!("skipping collection: {err}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, "http://api.example.com/feature-collections")]
    #[case(
        Some(ProjectId::new(42)),
        "http://api.example.com/feature-collections?project_id=42"
    )]
    fn listing_urls_carry_the_project(
        #[case] project: Option<ProjectId>,
        #[case] expected: &str,
    ) {
        let registry =
            HttpCollectionRegistry::new("http://api.example.com/").expect("client builds");
        let url = registry.listing_url(project).expect("valid base URL");
        assert_eq!(url.as_str(), expected);
    }

    #[rstest]
    fn invalid_base_urls_are_unavailable() {
        let registry = HttpCollectionRegistry::new("not a url").expect("client builds");
        let err = registry.listing_url(None).expect_err("invalid base");
        assert!(matches!(err, RegistryError::Unavailable { .. }), "got {err:?}");
    }

    fn record(id: i64, geometry_type: &str) -> CollectionRecord {
        CollectionRecord {
            id,
            title: format!("Collection {id}"),
            geometry_type: geometry_type.into(),
            project_id: None,
        }
    }

    #[rstest]
    fn unsupported_geometry_types_are_skipped() {
        let records = vec![record(1, "Point"), record(2, "Tin"), record(3, "Polygon")];
        let ids: Vec<i64> = usable_collections(records)
            .iter()
            .map(|collection| collection.id.get())
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
