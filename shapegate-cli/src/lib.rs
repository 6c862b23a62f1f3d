//! Command-line interface for validating and submitting shapefiles.
#![forbid(unsafe_code)]

use std::io::{self, Write};

use clap::{Parser, Subcommand};

mod collections;
mod error;
mod ingest;

pub use error::CliError;

use collections::CollectionsArgs;
use ingest::IngestArgs;

const ARG_FILES: &str = "files";
const ARG_COLLECTION: &str = "collection";
const ARG_GEOMETRY_TYPE: &str = "geometry-type";
const ARG_NAME: &str = "name";
const ARG_PROJECT_ID: &str = "project-id";
const ARG_PROJECT_SRID: &str = "project-srid";
const ARG_PROJECT_CRS_NAME: &str = "project-crs-name";
const ARG_API_BASE_URL: &str = "api-base-url";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ARG_DEFAULT_HUB_HEIGHT: &str = "default-hub-height";
const ARG_DEFAULT_ROTOR_DIAMETER: &str = "default-rotor-diameter";
const ARG_TURBINE_NUMBER_FIELD: &str = "turbine-number-field";
const ARG_HUB_HEIGHT_FIELD: &str = "hub-height-field";
const ARG_ROTOR_DIAMETER_FIELD: &str = "rotor-diameter-field";
const ARG_CHECK: &str = "check";

const ENV_INGEST_FILES: &str = "SHAPEGATE_CMDS_INGEST_FILES";
const ENV_INGEST_COLLECTION: &str = "SHAPEGATE_CMDS_INGEST_COLLECTION";
const ENV_INGEST_NAME: &str = "SHAPEGATE_CMDS_INGEST_NAME";
const ENV_INGEST_API_BASE_URL: &str = "SHAPEGATE_CMDS_INGEST_API_BASE_URL";
const ENV_COLLECTIONS_API_BASE_URL: &str = "SHAPEGATE_CMDS_COLLECTIONS_API_BASE_URL";

/// Run the shapegate CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    dispatch(cli.command, &mut out)
}

fn dispatch(command: Command, out: &mut impl Write) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    match command {
        Command::Ingest(args) => {
            let config = ingest::resolve_ingest_config(args)?;
            runtime.block_on(ingest::run_ingest(&config, out))?;
        }
        Command::Collections(args) => {
            let config = collections::resolve_collections_config(args)?;
            runtime.block_on(collections::run_collections(&config, out))?;
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(
    name = "shapegate",
    about = "Validate shapefiles and submit them to feature collections",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check a shapefile selection against a collection and submit it.
    Ingest(IngestArgs),
    /// List the collections a project can submit to.
    Collections(CollectionsArgs),
}

#[cfg(test)]
mod tests;
