//! Behavioural tests for resolving file selections.

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use shapegate_core::{FileSetError, RawFile, ShapefileBundle, resolve_file_set};
use std::cell::RefCell;

#[derive(Debug, Default)]
struct FileSetWorld {
    files: RefCell<Vec<RawFile>>,
    outcome: RefCell<Option<Result<ShapefileBundle, FileSetError>>>,
}

#[fixture]
fn world() -> FileSetWorld {
    FileSetWorld::default()
}

#[given("the selected files {names}")]
fn selected_files(world: &FileSetWorld, names: String) {
    let files = names
        .split(',')
        .map(|name| RawFile::new(name.trim(), name.as_bytes().to_vec()))
        .collect();
    world.files.replace(files);
}

#[when("the file set is resolved")]
fn resolve(world: &FileSetWorld) {
    let outcome = resolve_file_set(&world.files.borrow());
    world.outcome.replace(Some(outcome));
}

#[then("resolution fails with {message}")]
fn fails_with(world: &FileSetWorld, message: String) {
    let outcome = world.outcome.borrow();
    let err = outcome
        .as_ref()
        .expect("outcome recorded")
        .as_ref()
        .expect_err("expected resolution to fail");
    assert_eq!(err.to_string(), message);
}

#[then("an archive bundle named {stem} is produced")]
fn archive_produced(world: &FileSetWorld, stem: String) {
    let outcome = world.outcome.borrow();
    let bundle = outcome
        .as_ref()
        .expect("outcome recorded")
        .as_ref()
        .expect("expected an archive bundle");
    assert!(bundle.is_archive());
    assert_eq!(bundle.name(), stem);
}

macro_rules! register_file_set_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/file_set.feature", name = $title)]
        fn $fn_name(world: FileSetWorld) {
            let _ = world;
        }
    };
}

register_file_set_scenario!(different_stems, "Files with different stems are rejected");
register_file_set_scenario!(stem_order, "Stem order does not matter");
register_file_set_scenario!(lone_archive, "A lone archive is accepted");
register_file_set_scenario!(first_missing, "The first missing component is reported");
