//! Behaviour-driven step definitions driving the ingest CLI scenarios.

use super::helpers::{LayerOverrides, ShapefileOnDisk, block_on, merge_layers};
use super::*;
use crate::ingest::{IngestConfig, IngestReport, drive, resolve_ingest_config};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use shapegate_core::test_support::{StubCrsLookup, StubSubmitter};
use shapegate_core::{
    CollectionId, CrsDescriptor, GeometryType, IngestionPipeline, TargetCollection,
};
use shapegate_data::ShapefileBytesDecoder;
use std::cell::RefCell;

const TEST_BASE_URL: &str = "http://127.0.0.1:9/api";

type CheckPipeline = IngestionPipeline<ShapefileBytesDecoder, StubCrsLookup, StubSubmitter>;

/// Aggregates ingest CLI scenario state so each step only needs a single world
/// argument.
struct IngestWorld {
    shapefile: ShapefileOnDisk,
    pipeline: CheckPipeline,
    cli_args: RefCell<Vec<String>>,
    config_layer: RefCell<Option<LayerOverrides>>,
    env_layer: RefCell<Option<LayerOverrides>>,
    cli_result: RefCell<Option<Result<IngestConfig, CliError>>>,
    run_result: RefCell<Option<Result<IngestReport, CliError>>>,
    output: RefCell<Vec<u8>>,
}

impl IngestWorld {
    fn new() -> Self {
        Self {
            shapefile: ShapefileOnDisk::points("layout", &[Some((0.5, 51.2)), Some((0.6, 51.3))]),
            pipeline: IngestionPipeline::new(
                ShapefileBytesDecoder,
                StubCrsLookup::resolving(CrsDescriptor::from_srid(4326)),
                StubSubmitter::accepting(5),
            ),
            cli_args: RefCell::new(Vec::new()),
            config_layer: RefCell::new(None),
            env_layer: RefCell::new(None),
            cli_result: RefCell::new(None),
            run_result: RefCell::new(None),
            output: RefCell::new(Vec::new()),
        }
    }

    fn config(&self) -> IngestConfig {
        self.cli_result
            .borrow()
            .as_ref()
            .expect("configure step ran")
            .as_ref()
            .map(Clone::clone)
            .unwrap_or_else(|err| panic!("expected a config, found {err:?}"))
    }
}

#[fixture]
fn world() -> IngestWorld {
    IngestWorld::new()
}

#[given("a turbine shapefile exists on disk")]
fn shapefile_exists(#[from(world)] world: &IngestWorld) {
    for extension in ["shp", "dbf", "prj", "shx"] {
        let path = world.shapefile.path(&format!("layout.{extension}"));
        assert!(path.is_file(), "expected {path} to exist");
    }
}

#[given("I pass the shapefile directory with collection {id} and name {name}")]
fn cli_provides_everything(#[from(world)] world: &IngestWorld, id: i64, name: String) {
    world.cli_args.borrow_mut().extend([
        world.shapefile.dir().to_string(),
        format!("--{ARG_COLLECTION}"),
        id.to_string(),
        format!("--{ARG_NAME}"),
        name,
        format!("--{ARG_API_BASE_URL}"),
        TEST_BASE_URL.to_owned(),
    ]);
}

#[given("I pass only the shapefile directory")]
fn cli_provides_directory(#[from(world)] world: &IngestWorld) {
    world
        .cli_args
        .borrow_mut()
        .push(world.shapefile.dir().to_string());
}

#[given("I pass the check flag")]
fn cli_check_flag(#[from(world)] world: &IngestWorld) {
    world.cli_args.borrow_mut().push(format!("--{ARG_CHECK}"));
}

#[given("the config file sets collection {id} and name {name}")]
fn provided_via_config(#[from(world)] world: &IngestWorld, id: i64, name: String) {
    *world.config_layer.borrow_mut() = Some(LayerOverrides {
        api_base_url: Some(TEST_BASE_URL.to_owned()),
        collection: Some(id),
        name: Some(name),
    });
}

#[given("the environment sets the name {name}")]
fn name_overridden_by_env(#[from(world)] world: &IngestWorld, name: String) {
    *world.env_layer.borrow_mut() = Some(LayerOverrides {
        name: Some(name),
        ..LayerOverrides::default()
    });
}

#[when("I configure the ingest command")]
fn configure_ingest(#[from(world)] world: &IngestWorld) {
    let mut invocation = vec!["shapegate".to_owned(), "ingest".to_owned()];
    invocation.extend(world.cli_args.borrow().iter().cloned());
    let file_layer = world.config_layer.borrow().clone();
    let env_layer = world.env_layer.borrow().clone();
    let outcome = Cli::try_parse_from(invocation)
        .map_err(CliError::ArgumentParsing)
        .and_then(|cli| match cli.command {
            Command::Ingest(cmd) => {
                if file_layer.is_some() || env_layer.is_some() {
                    merge_layers(cmd, file_layer, env_layer)
                } else {
                    resolve_ingest_config(cmd)
                }
            }
            Command::Collections(_) => panic!("expected the ingest command"),
        });
    world.cli_result.replace(Some(outcome));
}

#[when("I run the configured ingest command")]
fn run_configured(#[from(world)] world: &IngestWorld) {
    let config = world.config();
    let collection = TargetCollection::global(config.collection, "Turbines", GeometryType::Point);
    let files = world.shapefile.read_all();
    let mut output = world.output.borrow_mut();
    let outcome = block_on(drive(
        &world.pipeline,
        config.session(collection),
        &files,
        config.check,
        &mut *output,
    ));
    world.run_result.replace(Some(outcome));
}

#[then("the ingest config reads the shapefile directory")]
fn config_reads_directory(#[from(world)] world: &IngestWorld) {
    assert_eq!(world.config().files, vec![world.shapefile.dir().to_path_buf()]);
}

#[then("the ingest config targets collection {id} named {name}")]
fn config_targets(#[from(world)] world: &IngestWorld, id: i64, name: String) {
    let config = world.config();
    assert_eq!(config.collection, CollectionId::new(id));
    assert_eq!(config.name.as_deref(), Some(name.as_str()));
    assert_eq!(config.service.base_url, TEST_BASE_URL);
}

#[then("the CLI reports that the \"collection\" option is missing")]
fn reports_missing_collection(#[from(world)] world: &IngestWorld) {
    let borrowed = world.cli_result.borrow();
    let error = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect_err("expected error");
    match error {
        CliError::MissingArgument { field, env } => {
            assert_eq!(*field, ARG_COLLECTION);
            assert_eq!(*env, ENV_INGEST_COLLECTION);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[then("the report says the shapefile is ready to submit")]
fn report_ready(#[from(world)] world: &IngestWorld) {
    let borrowed = world.run_result.borrow();
    let report = borrowed
        .as_ref()
        .expect("run recorded")
        .as_ref()
        .unwrap_or_else(|err| panic!("expected a report, found {err:?}"));
    assert_eq!(report.receipt, None);
    let output = String::from_utf8(world.output.borrow().clone()).expect("utf-8 output");
    assert!(output.contains("Features: 2 (Point)"), "{output}");
    assert!(output.ends_with("Ready to submit\n"), "{output}");
}

#[then("nothing was submitted")]
fn nothing_submitted(#[from(world)] world: &IngestWorld) {
    assert!(world.pipeline.submitter().submissions().is_empty());
}

macro_rules! register_ingest_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/ingest_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: IngestWorld) {
            let _ = world;
        }
    };
}

register_ingest_scenario!(cli_flag_selection, "selecting a shapefile via CLI flags");
register_ingest_scenario!(rejecting_missing_collection, "rejecting a missing collection");
register_ingest_scenario!(
    layering_cli_config_env,
    "layering CLI, config file, and environment values"
);
register_ingest_scenario!(check_without_submitting, "checking a shapefile without submitting");
