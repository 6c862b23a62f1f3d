//! `collections` command: list the collections a project can submit to.

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use shapegate_core::{CollectionRegistry, CollectionScope, ProjectId, TargetCollection};
use shapegate_data::{HttpCollectionRegistry, ServiceConfig};

use crate::{
    ARG_API_BASE_URL, ARG_PROJECT_ID, ARG_TIMEOUT_SECS, CliError, ENV_COLLECTIONS_API_BASE_URL,
};

/// CLI arguments for the `collections` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "List the collections a project can submit to")]
#[ortho_config(prefix = "SHAPEGATE")]
pub(crate) struct CollectionsArgs {
    /// Base URL of the shapegate API.
    #[arg(long = ARG_API_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) api_base_url: Option<String>,
    /// Project whose own collections are included.
    #[arg(long = ARG_PROJECT_ID, value_name = "id")]
    #[serde(default)]
    pub(crate) project_id: Option<i64>,
    /// Request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
}

/// Resolved `collections` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CollectionsConfig {
    pub(crate) project: Option<ProjectId>,
    pub(crate) service: ServiceConfig,
}

impl TryFrom<CollectionsArgs> for CollectionsConfig {
    type Error = CliError;

    fn try_from(args: CollectionsArgs) -> Result<Self, Self::Error> {
        let base_url = args.api_base_url.ok_or(CliError::MissingArgument {
            field: ARG_API_BASE_URL,
            env: ENV_COLLECTIONS_API_BASE_URL,
        })?;
        let mut service = ServiceConfig::new(base_url);
        if let Some(secs) = args.timeout_secs {
            service = service.with_timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            project: args.project_id.map(ProjectId::new),
            service,
        })
    }
}

/// Merge configuration layers and resolve the `collections` settings.
pub(crate) fn resolve_collections_config(
    args: CollectionsArgs,
) -> Result<CollectionsConfig, CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    CollectionsConfig::try_from(merged)
}

/// Run the `collections` command against the configured registry.
pub(crate) async fn run_collections(
    config: &CollectionsConfig,
    out: &mut impl Write,
) -> Result<Vec<TargetCollection>, CliError> {
    let registry = HttpCollectionRegistry::with_config(config.service.clone()).map_err(|source| {
        CliError::BuildClient {
            base_url: config.service.base_url.clone(),
            source,
        }
    })?;
    list_collections(&registry, config.project, out).await
}

/// List collections from `registry` and write one line per collection.
pub(crate) async fn list_collections<R>(
    registry: &R,
    project: Option<ProjectId>,
    out: &mut impl Write,
) -> Result<Vec<TargetCollection>, CliError>
where
    R: CollectionRegistry + ?Sized,
{
    let collections = registry.list_collections(project).await?;
    for collection in &collections {
        writeln!(out, "{}", describe(collection)).map_err(CliError::WriteOutput)?;
    }
    Ok(collections)
}

fn describe(collection: &TargetCollection) -> String {
    let scope = match collection.scope {
        CollectionScope::Global => "global".to_owned(),
        CollectionScope::Project(project) => format!("project {project}"),
    };
    format!(
        "{}\t{}\t{}\t{scope}",
        collection.id, collection.title, collection.geometry_type
    )
}
