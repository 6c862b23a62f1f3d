//! Turn a resolved bundle into a [`DecodedFeatureSet`].
//!
//! Parsing the binary formats is delegated to a [`ShapefileDecoder`]. This
//! module only routes each bundle form to the right decode call, combines
//! geometry and attributes by record order, and separates out null shapes.

use geo::Geometry;
use log::warn;
use thiserror::Error;

use crate::bundle::{BundleContents, ShapefileBundle, ShapefileComponents};
use crate::features::{ArchiveDecode, Attributes, DecodedFeatureSet, DecodedRecord};

/// Failure reported by a decode routine.
///
/// The detail is logged but never surfaced past [`decode_bundle`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DecoderFailure {
    /// Human-readable description from the decode routine.
    pub message: String,
}

impl DecoderFailure {
    /// Wrap a description of what went wrong.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Opaque decode failure shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Failed to parse shapefile")]
pub struct DecodeError;

/// External routine that parses shapefile bytes.
pub trait ShapefileDecoder {
    /// Decompress and decode an archive holding one or more layers.
    fn decode_archive(&self, archive: &[u8]) -> Result<ArchiveDecode, DecoderFailure>;

    /// Decode the geometry records of a `.shp` buffer in record order.
    ///
    /// `prj` carries the projection definition for context. Null shapes are
    /// returned as `None`.
    fn decode_shapes(
        &self,
        shp: &[u8],
        prj: Option<&str>,
    ) -> Result<Vec<Option<Geometry<f64>>>, DecoderFailure>;

    /// Decode the attribute rows of a `.dbf` buffer in record order.
    fn decode_attributes(&self, dbf: &[u8]) -> Result<Vec<Attributes>, DecoderFailure>;
}

/// Decode `bundle` with `decoder`.
///
/// Archives use the first embedded layer. Component bundles pair the n-th
/// shape with the n-th attribute row; a shape without a row gets an empty
/// attribute map and surplus rows are ignored.
pub fn decode_bundle<D>(
    decoder: &D,
    bundle: &ShapefileBundle,
) -> Result<DecodedFeatureSet, DecodeError>
where
    D: ShapefileDecoder + ?Sized,
{
    let records = match bundle.contents() {
        BundleContents::Archive(archive) => decode_archive_records(decoder, archive),
        BundleContents::Components(components) => decode_component_records(decoder, components),
    };
    records
        .map(DecodedFeatureSet::from_records)
        .map_err(|failure| {
            warn!("failed to decode shapefile {:?}: {failure}", bundle.name());
            DecodeError
        })
}

fn decode_archive_records<D>(
    decoder: &D,
    archive: &[u8],
) -> Result<Vec<DecodedRecord>, DecoderFailure>
where
    D: ShapefileDecoder + ?Sized,
{
    let layer = decoder
        .decode_archive(archive)?
        .into_first()
        .ok_or_else(|| DecoderFailure::new("archive contains no shapefile layers"))?;
    Ok(layer.records)
}

fn decode_component_records<D>(
    decoder: &D,
    components: &ShapefileComponents,
) -> Result<Vec<DecodedRecord>, DecoderFailure>
where
    D: ShapefileDecoder + ?Sized,
{
    let prj = components.prj_text();
    let shapes = decoder.decode_shapes(&components.shp, Some(prj.as_str()))?;
    let mut rows = decoder.decode_attributes(&components.dbf)?.into_iter();
    Ok(shapes
        .into_iter()
        .map(|geometry| DecodedRecord {
            geometry,
            attributes: rows.next().unwrap_or_default(),
        })
        .collect())
}
