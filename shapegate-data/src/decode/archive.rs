//! Locate shapefile layers inside a zip archive.

use std::io::{Cursor, Read};

use log::debug;
use shapegate_core::{DecodedRecord, DecoderFailure, FeatureCollection, split_file_name};
use zip::ZipArchive;

/// Members of one layer found in an archive.
#[derive(Debug, Default)]
pub struct ArchiveLayer {
    /// Path of the layer inside the archive, without extension.
    pub path_stem: String,
    /// Geometry records.
    pub shp: Vec<u8>,
    /// Attribute table, when the archive carries one.
    pub dbf: Option<Vec<u8>>,
}

impl ArchiveLayer {
    /// File name stem of the layer, without any directory.
    pub fn name(&self) -> &str {
        self.path_stem
            .rsplit_once('/')
            .map_or(self.path_stem.as_str(), |(_, name)| name)
    }
}

/// Read every `.shp` layer from `archive`, in archive order.
///
/// A layer's `.dbf` is matched by path and stem with a case-insensitive
/// extension. Directory entries and macOS resource forks are skipped.
pub fn read_layers(archive: &[u8]) -> Result<Vec<ArchiveLayer>, DecoderFailure> {
    let mut zip = ZipArchive::new(Cursor::new(archive))
        .map_err(|err| DecoderFailure::new(format!("failed to open archive: {err}")))?;
    let mut entries = Vec::with_capacity(zip.len());
    for index in 0..zip.len() {
        let mut file = zip.by_index(index).map_err(|err| {
            DecoderFailure::new(format!("failed to read archive entry {index}: {err}"))
        })?;
        let name = file.name().to_owned();
        if file.is_dir() || name.starts_with("__MACOSX/") {
            continue;
        }
        let Some((path_stem, extension)) = split_file_name(&name) else {
            continue;
        };
        let path_stem = path_stem.to_owned();
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|err| DecoderFailure::new(format!("failed to inflate {name}: {err}")))?;
        entries.push((path_stem, extension, bytes));
    }

    let mut layers: Vec<ArchiveLayer> = entries
        .iter()
        .filter(|(_, extension, _)| extension == "shp")
        .map(|(path_stem, _, bytes)| ArchiveLayer {
            path_stem: path_stem.clone(),
            shp: bytes.clone(),
            dbf: None,
        })
        .collect();
    for (path_stem, extension, bytes) in entries {
        if extension != "dbf" {
            continue;
        }
        if let Some(layer) = layers
            .iter_mut()
            .find(|layer| layer.path_stem == path_stem && layer.dbf.is_none())
        {
            layer.dbf = Some(bytes);
        }
    }
    debug!("archive holds {} shapefile layer(s)", layers.len());
    Ok(layers)
}

/// Name a decoded layer after its archive member.
pub fn named_layer(layer: &ArchiveLayer, records: Vec<DecodedRecord>) -> FeatureCollection {
    FeatureCollection {
        name: Some(layer.name().to_owned()),
        records,
    }
}
