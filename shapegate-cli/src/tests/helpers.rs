//! Test helpers for shapefile selections on disk and layered overrides.

use super::*;
use crate::ingest::{IngestArgs, IngestConfig};
use camino::{Utf8Path, Utf8PathBuf};
use shapegate_core::RawFile;
use shapegate_data::decode::test_support::{point_shp, text_dbf};
use std::fs;
use tempfile::TempDir;

pub(super) const BNG_PRJ: &str = "PROJCS[\"OSGB 1936 / British National Grid\"]";

#[derive(Debug, Clone, Default)]
pub(super) struct LayerOverrides {
    pub(super) api_base_url: Option<String>,
    pub(super) collection: Option<i64>,
    pub(super) name: Option<String>,
}

/// A point shapefile written to a temporary directory.
#[derive(Debug)]
pub(super) struct ShapefileOnDisk {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl ShapefileOnDisk {
    pub(super) fn points(stem: &str, points: &[Option<(f64, f64)>]) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        let labels: Vec<String> = (1..=points.len()).map(|n| format!("T{n}")).collect();
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        fs::write(root.join(format!("{stem}.shp")), point_shp(points)).expect("write shp");
        fs::write(root.join(format!("{stem}.dbf")), text_dbf("LABEL", &labels)).expect("write dbf");
        fs::write(root.join(format!("{stem}.prj")), BNG_PRJ).expect("write prj");
        fs::write(root.join(format!("{stem}.shx")), b"index").expect("write shx");
        Self { _dir: dir, root }
    }

    pub(super) fn dir(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn path(&self, file_name: &str) -> Utf8PathBuf {
        self.root.join(file_name)
    }

    pub(super) fn read_all(&self) -> Vec<RawFile> {
        shapegate_fs::read_selection(&[self.root.clone()]).expect("read selection")
    }
}

pub(super) fn merge_layers(
    mut cli_args: IngestArgs,
    file_layer: Option<LayerOverrides>,
    env_layer: Option<LayerOverrides>,
) -> Result<IngestConfig, CliError> {
    merge_field(
        &mut cli_args.api_base_url,
        extract_field(&env_layer, |layer| &layer.api_base_url),
        extract_field(&file_layer, |layer| &layer.api_base_url),
    );
    merge_field(
        &mut cli_args.collection,
        extract_field(&env_layer, |layer| &layer.collection),
        extract_field(&file_layer, |layer| &layer.collection),
    );
    merge_field(
        &mut cli_args.name,
        extract_field(&env_layer, |layer| &layer.name),
        extract_field(&file_layer, |layer| &layer.name),
    );
    IngestConfig::try_from(cli_args)
}

fn merge_field<T: Clone>(target: &mut Option<T>, env_value: Option<T>, file_value: Option<T>) {
    if target.is_none()
        && let Some(value) = env_value.or(file_value)
    {
        *target = Some(value);
    }
}

fn extract_field<T: Clone>(
    layer: &Option<LayerOverrides>,
    accessor: fn(&LayerOverrides) -> &Option<T>,
) -> Option<T> {
    layer.as_ref().and_then(|entry| accessor(entry).clone())
}

pub(super) fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
        .block_on(future)
}
