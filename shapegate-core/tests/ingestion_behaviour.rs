//! Behavioural tests for the ingestion controller and pipeline.
//!
//! CRS answers come from [`DeferredCrsLookup`], so each scenario decides
//! when the lookup service replies.

use futures_util::{FutureExt, StreamExt};
use geo::{Geometry, Point};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use shapegate_core::test_support::{DeferredCrsLookup, StubDecoder, StubSubmitter};
use shapegate_core::{
    CollectionId, CrsDescriptor, IngestionController, IngestionPipeline, IngestionSession,
    PartValue, ProjectCrs, RawFile, SettlementOutcome, Severity, ShapefileBundle,
    TargetCollection,
};
use std::cell::RefCell;
use tokio::runtime::Builder;

type Pipeline = IngestionPipeline<StubDecoder, DeferredCrsLookup, StubSubmitter>;

fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build Tokio runtime")
        .block_on(future)
}

fn component_files(stem: &str) -> Vec<RawFile> {
    ["shp", "dbf", "prj", "shx"]
        .into_iter()
        .map(|ext| RawFile::new(format!("{stem}.{ext}"), format!("{stem} {ext}").into_bytes()))
        .collect()
}

struct IngestionWorld {
    pipeline: Pipeline,
    controller: RefCell<IngestionController>,
    session: RefCell<IngestionSession>,
    late_outcome: RefCell<Option<SettlementOutcome>>,
}

impl IngestionWorld {
    fn new() -> Self {
        Self {
            pipeline: IngestionPipeline::new(
                StubDecoder::with_geometries([Geometry::Point(Point::new(-3.2, 55.9))]),
                DeferredCrsLookup::new(),
                StubSubmitter::accepting(101),
            ),
            controller: RefCell::new(IngestionController::new()),
            session: RefCell::new(IngestionSession::default()),
            late_outcome: RefCell::new(None),
        }
    }
}

#[fixture]
fn world() -> IngestionWorld {
    IngestionWorld::new()
}

// --- Given steps ---

#[given("a project stored in EPSG {srid}")]
fn project_crs(world: &IngestionWorld, srid: i32) {
    world.session.replace(IngestionSession::new(ProjectCrs::new(srid, None)));
}

#[given("a {kind} collection is selected")]
fn collection_selected(world: &IngestionWorld, kind: String) {
    let geometry_type = kind.parse().expect("known geometry type");
    world.session.borrow_mut().select_collection(TargetCollection::global(
        CollectionId::new(12),
        format!("{kind} layer"),
        geometry_type,
    ));
}

#[given("the feature is named {name}")]
fn feature_named(world: &IngestionWorld, name: String) {
    world.session.borrow_mut().set_feature_name(name);
}

#[given("the CRS service identifies EPSG {srid}")]
fn crs_service_answers(world: &IngestionWorld, srid: i32) {
    world
        .pipeline
        .lookup()
        .resolve(0, CrsDescriptor::from_srid(srid));
}

// --- When steps ---

#[when("I select the component files for {stem}")]
fn select_components(world: &IngestionWorld, stem: String) {
    let mut controller = world.controller.borrow_mut();
    let work = controller
        .select_files(&component_files(&stem))
        .expect("complete component set");
    block_on(world.pipeline.settle_into(&mut controller, work));
}

#[when("I submit the feature")]
fn submit(world: &IngestionWorld) {
    let mut controller = world.controller.borrow_mut();
    let mut session = world.session.borrow_mut();
    block_on(world.pipeline.submit(&mut controller, &mut session)).expect("submission allowed");
}

#[when("I reselect the files before the first CRS lookup returns")]
fn reselect_while_pending(world: &IngestionWorld) {
    let mut controller = world.controller.borrow_mut();
    let lookup = world.pipeline.lookup();
    let first = controller
        .select_files(&component_files("first"))
        .expect("complete component set");
    let mut first_settlements = world.pipeline.settle(&first);
    // Decode settles immediately; the CRS request stays outstanding.
    while let Some(Some(settlement)) = first_settlements.next().now_or_never() {
        controller.apply(settlement);
    }
    assert_eq!(lookup.requests(), 1, "first lookup should be in flight");

    let second = controller
        .select_files(&component_files("second"))
        .expect("complete component set");
    lookup.resolve(1, CrsDescriptor::from_srid(27700));
    block_on(world.pipeline.settle_into(&mut controller, second));

    lookup.resolve(0, CrsDescriptor::from_srid(4326));
    let late = block_on(first_settlements.next()).expect("first lookup settles");
    world.late_outcome.replace(Some(controller.apply(late)));
}

// --- Then steps ---

#[then("submission is enabled")]
fn submission_enabled(world: &IngestionWorld) {
    let session = world.session.borrow();
    assert!(world.controller.borrow().submit_enabled(&session));
}

#[then("submission is disabled")]
fn submission_disabled(world: &IngestionWorld) {
    let session = world.session.borrow();
    assert!(!world.controller.borrow().submit_enabled(&session));
}

#[then("no notices are shown")]
fn no_notices(world: &IngestionWorld) {
    let session = world.session.borrow();
    let notices = world.controller.borrow().notices(&session);
    assert!(notices.is_empty(), "unexpected notices: {notices:?}");
}

#[then("a geometry mismatch is shown")]
fn geometry_mismatch(world: &IngestionWorld) {
    let session = world.session.borrow();
    let controller = world.controller.borrow();
    let verdict = controller.verdict(&session).expect("verdict available");
    assert!(verdict.geometry_mismatch);
    assert!(
        controller
            .notices(&session)
            .iter()
            .any(|notice| notice.severity == Severity::Blocking)
    );
}

#[then("an advisory mentions {crs}")]
fn advisory_mentions(world: &IngestionWorld, crs: String) {
    let session = world.session.borrow();
    let notices = world.controller.borrow().notices(&session);
    assert!(
        notices
            .iter()
            .any(|notice| notice.severity == Severity::Advisory && notice.message.contains(&crs)),
        "no advisory mentioning {crs}: {notices:?}"
    );
}

#[then("the payload carries the four component files and the name {name}")]
fn payload_parts(world: &IngestionWorld, name: String) {
    let submissions = world.pipeline.submitter().submissions();
    let [payload] = submissions.as_slice() else {
        panic!("expected one submission, found {}", submissions.len());
    };
    assert_eq!(payload.fields(), vec!["shp", "dbf", "prj", "shx", "name"]);
    assert_eq!(payload.text("name"), Some(name.as_str()));
    assert!(matches!(
        payload.part("shp"),
        Some(PartValue::File { file_name, .. }) if file_name == "sites.shp"
    ));
}

#[then("the late CRS result is discarded")]
fn late_result_discarded(world: &IngestionWorld) {
    assert_eq!(*world.late_outcome.borrow(), Some(SettlementOutcome::Stale));
}

#[then("the source CRS is EPSG {srid}")]
fn source_crs(world: &IngestionWorld, srid: i32) {
    let controller = world.controller.borrow();
    assert_eq!(
        controller.crs().descriptor(),
        Some(&CrsDescriptor::from_srid(srid))
    );
}

#[then("the selected bundle is {stem}")]
fn selected_bundle(world: &IngestionWorld, stem: String) {
    let controller = world.controller.borrow();
    assert_eq!(controller.bundle().map(ShapefileBundle::name), Some(stem.as_str()));
}

// --- Scenario registrations ---

macro_rules! register_ingestion_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/ingestion.feature", name = $title)]
        fn $fn_name(world: IngestionWorld) {
            let _ = world;
        }
    };
}

register_ingestion_scenario!(
    matching_point_shapefile,
    "A matching point shapefile is ready to submit"
);
register_ingestion_scenario!(
    polygon_target_mismatch,
    "A point shapefile targeted at a polygon collection"
);
register_ingestion_scenario!(reprojection_advisory, "A shapefile in another CRS is reprojected");
register_ingestion_scenario!(
    reselection_discards_stale_lookup,
    "Reselecting while the first CRS lookup is pending"
);
