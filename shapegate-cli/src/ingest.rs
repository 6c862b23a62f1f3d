//! `ingest` command: read a selection, check it against a collection, and
//! submit it.

use std::io::Write;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use log::debug;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use shapegate_core::{
    CollectionId, CollectionRegistry, CrsLookup, FeatureSubmitter, GeometryType,
    IngestionController, IngestionPipeline, IngestionSession, Notice, ProjectCrs, ProjectId,
    RawFile, Severity, ShapefileDecoder, SubmissionReceipt, SubmitBlocked, SubmitOutcome,
    TargetCollection, TurbineParameters, find_collection,
};
use shapegate_data::{
    HttpCollectionRegistry, HttpCrsLookup, HttpFeatureSubmitter, ProviderBuildError,
    ServiceConfig, ShapefileBytesDecoder,
};

use crate::{
    ARG_API_BASE_URL, ARG_CHECK, ARG_COLLECTION, ARG_DEFAULT_HUB_HEIGHT,
    ARG_DEFAULT_ROTOR_DIAMETER, ARG_FILES, ARG_GEOMETRY_TYPE, ARG_HUB_HEIGHT_FIELD, ARG_NAME,
    ARG_PROJECT_CRS_NAME, ARG_PROJECT_ID, ARG_PROJECT_SRID, ARG_ROTOR_DIAMETER_FIELD,
    ARG_TIMEOUT_SECS, ARG_TURBINE_NUMBER_FIELD, CliError, ENV_INGEST_API_BASE_URL,
    ENV_INGEST_COLLECTION, ENV_INGEST_FILES, ENV_INGEST_NAME,
};

/// CLI arguments for the `ingest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Read shapefile components or a zip archive, decode the \
                 features, identify their CRS, and check them against the \
                 target collection. Unless --check is given, a compatible \
                 shapefile is submitted. Every option can also come from a \
                 configuration file or SHAPEGATE_ environment variables.",
    about = "Check a shapefile against a collection and submit it"
)]
#[ortho_config(prefix = "SHAPEGATE")]
pub(crate) struct IngestArgs {
    /// Shapefile components, a zip archive, or a directory holding them.
    #[arg(value_name = "path")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) files: Vec<Utf8PathBuf>,
    /// Identifier of the target collection.
    #[arg(long = ARG_COLLECTION, value_name = "id")]
    #[serde(default)]
    pub(crate) collection: Option<i64>,
    /// Geometry type of the target collection; skips the registry lookup.
    #[arg(long = ARG_GEOMETRY_TYPE, value_name = "type")]
    #[serde(default)]
    pub(crate) geometry_type: Option<String>,
    /// Name of the feature to create.
    #[arg(long = ARG_NAME, value_name = "name")]
    #[serde(default)]
    pub(crate) name: Option<String>,
    /// Project whose collections are listed.
    #[arg(long = ARG_PROJECT_ID, value_name = "id")]
    #[serde(default)]
    pub(crate) project_id: Option<i64>,
    /// SRID the project stores features in.
    #[arg(long = ARG_PROJECT_SRID, value_name = "srid")]
    #[serde(default)]
    pub(crate) project_srid: Option<i32>,
    /// Human-readable name of the project CRS.
    #[arg(long = ARG_PROJECT_CRS_NAME, value_name = "name")]
    #[serde(default)]
    pub(crate) project_crs_name: Option<String>,
    /// Base URL of the shapegate API (e.g. "http://localhost:8080/api").
    #[arg(long = ARG_API_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) api_base_url: Option<String>,
    /// Request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// Hub height for turbines without their own value.
    #[arg(long = ARG_DEFAULT_HUB_HEIGHT, value_name = "metres")]
    #[serde(default)]
    pub(crate) default_hub_height: Option<f64>,
    /// Rotor diameter for turbines without their own value.
    #[arg(long = ARG_DEFAULT_ROTOR_DIAMETER, value_name = "metres")]
    #[serde(default)]
    pub(crate) default_rotor_diameter: Option<f64>,
    /// Attribute holding each turbine's number.
    #[arg(long = ARG_TURBINE_NUMBER_FIELD, value_name = "field")]
    #[serde(default)]
    pub(crate) turbine_number_field: Option<String>,
    /// Attribute holding each turbine's hub height.
    #[arg(long = ARG_HUB_HEIGHT_FIELD, value_name = "field")]
    #[serde(default)]
    pub(crate) hub_height_field: Option<String>,
    /// Attribute holding each turbine's rotor diameter.
    #[arg(long = ARG_ROTOR_DIAMETER_FIELD, value_name = "field")]
    #[serde(default)]
    pub(crate) rotor_diameter_field: Option<String>,
    /// Report compatibility without submitting.
    #[arg(long = ARG_CHECK)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) check: bool,
}

impl IngestArgs {
    fn into_config(self) -> Result<IngestConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        IngestConfig::try_from(merged)
    }
}

/// Merge configuration layers and resolve the `ingest` settings.
pub(crate) fn resolve_ingest_config(args: IngestArgs) -> Result<IngestConfig, CliError> {
    args.into_config()
}

/// Resolved `ingest` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IngestConfig {
    /// Paths to read the selection from.
    pub(crate) files: Vec<Utf8PathBuf>,
    /// Target collection.
    pub(crate) collection: CollectionId,
    /// Collection geometry type given on the command line.
    pub(crate) geometry_type: Option<GeometryType>,
    /// Feature name; only optional with `--check`.
    pub(crate) name: Option<String>,
    /// Project used to scope the collection listing.
    pub(crate) project: Option<ProjectId>,
    /// Project CRS compared against the source CRS.
    pub(crate) project_crs: ProjectCrs,
    /// HTTP settings shared by every adapter.
    pub(crate) service: ServiceConfig,
    /// Turbine-layout parameters.
    pub(crate) turbine: TurbineParameters,
    /// Stop after reporting compatibility.
    pub(crate) check: bool,
}

impl IngestConfig {
    /// Build the form state for `collection`.
    pub(crate) fn session(&self, collection: TargetCollection) -> IngestionSession {
        let mut session = IngestionSession::new(self.project_crs.clone());
        session.select_collection(collection);
        if let Some(name) = &self.name {
            session.set_feature_name(name.clone());
        }
        session.set_turbine_parameters(self.turbine.clone());
        session
    }
}

impl TryFrom<IngestArgs> for IngestConfig {
    type Error = CliError;

    fn try_from(args: IngestArgs) -> Result<Self, Self::Error> {
        if args.files.is_empty() {
            return Err(CliError::MissingArgument {
                field: ARG_FILES,
                env: ENV_INGEST_FILES,
            });
        }
        let collection = args.collection.map(CollectionId::new).ok_or(CliError::MissingArgument {
            field: ARG_COLLECTION,
            env: ENV_INGEST_COLLECTION,
        })?;
        let name = args.name.filter(|name| !name.trim().is_empty());
        if name.is_none() && !args.check {
            return Err(CliError::MissingArgument {
                field: ARG_NAME,
                env: ENV_INGEST_NAME,
            });
        }
        let base_url = args.api_base_url.ok_or(CliError::MissingArgument {
            field: ARG_API_BASE_URL,
            env: ENV_INGEST_API_BASE_URL,
        })?;
        let geometry_type = args
            .geometry_type
            .as_deref()
            .map(str::parse::<GeometryType>)
            .transpose()
            .map_err(CliError::InvalidGeometryType)?;

        let mut service = ServiceConfig::new(base_url);
        if let Some(secs) = args.timeout_secs {
            service = service.with_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            files: args.files,
            collection,
            geometry_type,
            name,
            project: args.project_id.map(ProjectId::new),
            project_crs: ProjectCrs {
                srid: args.project_srid,
                name: args.project_crs_name,
            },
            service,
            turbine: TurbineParameters {
                default_hub_height: args.default_hub_height,
                default_rotor_diameter: args.default_rotor_diameter,
                turbine_number_field: args.turbine_number_field,
                hub_height_field: args.hub_height_field,
                rotor_diameter_field: args.rotor_diameter_field,
            },
            check: args.check,
        })
    }
}

/// What one `ingest` run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IngestReport {
    /// Notices shown for the selection.
    pub(crate) notices: Vec<Notice>,
    /// Receipt of the created feature; `None` with `--check`.
    pub(crate) receipt: Option<SubmissionReceipt>,
}

/// Run the `ingest` command against the configured services.
pub(crate) async fn run_ingest(
    config: &IngestConfig,
    out: &mut impl Write,
) -> Result<IngestReport, CliError> {
    let files = read_files(&config.files)?;
    let registry = build_adapter(&config.service, HttpCollectionRegistry::with_config)?;
    let collection = resolve_collection(config, &registry).await?;
    let pipeline = IngestionPipeline::new(
        ShapefileBytesDecoder,
        build_adapter(&config.service, HttpCrsLookup::with_config)?,
        build_adapter(&config.service, HttpFeatureSubmitter::with_config)?,
    );
    drive(&pipeline, config.session(collection), &files, config.check, out).await
}

fn build_adapter<T>(
    service: &ServiceConfig,
    build: fn(ServiceConfig) -> Result<T, ProviderBuildError>,
) -> Result<T, CliError> {
    build(service.clone()).map_err(|source| CliError::BuildClient {
        base_url: service.base_url.clone(),
        source,
    })
}

fn read_files(paths: &[Utf8PathBuf]) -> Result<Vec<RawFile>, CliError> {
    let mut files = Vec::new();
    for path in paths {
        let read = shapegate_fs::read_selection(std::slice::from_ref(path)).map_err(|source| {
            CliError::ReadSelection {
                path: path.clone(),
                source,
            }
        })?;
        files.extend(read);
    }
    debug!("read {} file(s) from {} path(s)", files.len(), paths.len());
    Ok(files)
}

/// Find the target collection, from the command line or the registry.
pub(crate) async fn resolve_collection<R>(
    config: &IngestConfig,
    registry: &R,
) -> Result<TargetCollection, CliError>
where
    R: CollectionRegistry + ?Sized,
{
    if let Some(geometry_type) = config.geometry_type {
        return Ok(TargetCollection::global(
            config.collection,
            format!("collection {}", config.collection),
            geometry_type,
        ));
    }
    let listed = registry.list_collections(config.project).await?;
    find_collection(&listed, config.collection)
        .cloned()
        .ok_or(CliError::UnknownCollection {
            id: config.collection.get(),
        })
}

/// Settle `files` through `pipeline`, report, and submit unless `check`.
pub(crate) async fn drive<D, L, S>(
    pipeline: &IngestionPipeline<D, L, S>,
    mut session: IngestionSession,
    files: &[RawFile],
    check: bool,
    out: &mut impl Write,
) -> Result<IngestReport, CliError>
where
    D: ShapefileDecoder,
    L: CrsLookup,
    S: FeatureSubmitter,
{
    let mut controller = IngestionController::new();
    let work = controller.select_files(files)?;
    pipeline.settle_into(&mut controller, work).await;
    let notices = controller.notices(&session);
    write_summary(&controller, &notices, out).map_err(CliError::WriteOutput)?;

    match controller.submit_blocker(&session) {
        None => {}
        Some(SubmitBlocked::MissingName) if check => {}
        Some(blocker) => return Err(blocker.into()),
    }
    if check {
        writeln!(out, "Ready to submit").map_err(CliError::WriteOutput)?;
        return Ok(IngestReport {
            notices,
            receipt: None,
        });
    }

    match pipeline.submit(&mut controller, &mut session).await? {
        SubmitOutcome::Submitted(receipt) => {
            writeln!(out, "Submitted as feature {}", receipt.id).map_err(CliError::WriteOutput)?;
            Ok(IngestReport {
                notices,
                receipt: Some(receipt),
            })
        }
        SubmitOutcome::Failed(message) => Err(CliError::SubmissionFailed { message }),
        SubmitOutcome::Stale => Err(CliError::SubmissionFailed {
            message: "the selection changed while submitting".to_owned(),
        }),
    }
}

fn write_summary(
    controller: &IngestionController,
    notices: &[Notice],
    out: &mut impl Write,
) -> std::io::Result<()> {
    if let Some(bundle) = controller.bundle() {
        let form = if bundle.is_archive() { "archive" } else { "components" };
        writeln!(out, "Shapefile: {} ({form})", bundle.name())?;
    }
    if let Some(decoded) = controller.decoded() {
        let kind = decoded
            .first_geometry_type()
            .map_or_else(|| "no geometry".to_owned(), |kind| kind.to_string());
        writeln!(out, "Features: {} ({kind})", decoded.len())?;
        if decoded.dropped_null_geometries() > 0 {
            writeln!(
                out,
                "Dropped: {} record(s) without geometry",
                decoded.dropped_null_geometries()
            )?;
        }
    }
    if let Some(err) = controller.decode_error() {
        writeln!(out, "Error: {err}")?;
    }
    match controller.crs().descriptor() {
        Some(descriptor) => writeln!(out, "CRS: {descriptor}")?,
        None => writeln!(out, "CRS: unresolved")?,
    }
    for notice in notices {
        let label = match notice.severity {
            Severity::Blocking => "Error",
            Severity::Advisory => "Note",
        };
        writeln!(out, "{label}: {}", notice.message)?;
    }
    Ok(())
}
