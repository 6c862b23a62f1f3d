//! Shapefile decoding backed by the `shapefile` and `zip` crates.
//!
//! [`ShapefileBytesDecoder`] implements [`ShapefileDecoder`] over in-memory
//! buffers. Projection text is accepted for context only: coordinates are
//! returned exactly as stored, and any reprojection is left to the service
//! that receives the submission.
//!
//! # Example
//!
//! ```
//! use shapegate_core::ShapefileDecoder;
//! use shapegate_data::decode::{ShapefileBytesDecoder, test_support::point_shp};
//!
//! let shp = point_shp(&[Some((1.0, 2.0)), None]);
//! let shapes = ShapefileBytesDecoder.decode_shapes(&shp, None)?;
//! assert_eq!(shapes.len(), 2);
//! assert!(shapes[1].is_none());
//! # Ok::<(), shapegate_core::DecoderFailure>(())
//! ```

mod archive;
mod attributes;
mod geometry;

#[doc(hidden)]
pub mod test_support;

use std::io::Cursor;

use geo::Geometry;
use log::debug;
use shapefile::ShapeReader;
use shapefile::dbase;
use shapegate_core::{ArchiveDecode, Attributes, DecodedRecord, DecoderFailure, ShapefileDecoder};

pub use archive::{ArchiveLayer, read_layers};
pub use attributes::{field_value, record_to_attributes};
pub use geometry::{collapse_single_part, shape_to_geometry};

/// Decoder for `.shp`/`.dbf` buffers and zip archives holding them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShapefileBytesDecoder;

impl ShapefileBytesDecoder {
    /// Decode the geometry records of `shp`.
    pub fn read_shapes(shp: &[u8]) -> Result<Vec<Option<Geometry<f64>>>, DecoderFailure> {
        let reader = ShapeReader::new(Cursor::new(shp))
            .map_err(|err| DecoderFailure::new(format!("invalid .shp header: {err}")))?;
        reader
            .read()
            .map_err(|err| DecoderFailure::new(format!("invalid .shp record: {err}")))?
            .into_iter()
            .map(shape_to_geometry)
            .collect()
    }

    /// Decode the attribute rows of `dbf`.
    pub fn read_rows(dbf: &[u8]) -> Result<Vec<Attributes>, DecoderFailure> {
        let mut reader = dbase::Reader::new(Cursor::new(dbf))
            .map_err(|err| DecoderFailure::new(format!("invalid .dbf header: {err}")))?;
        let records = reader
            .read()
            .map_err(|err| DecoderFailure::new(format!("invalid .dbf record: {err}")))?;
        Ok(records.into_iter().map(record_to_attributes).collect())
    }

    fn decode_layer(layer: &ArchiveLayer) -> Result<Vec<DecodedRecord>, DecoderFailure> {
        let shapes = Self::read_shapes(&layer.shp)?;
        let rows = match &layer.dbf {
            Some(dbf) => Self::read_rows(dbf)?,
            None => {
                debug!("layer {:?} has no attribute table", layer.name());
                Vec::new()
            }
        };
        let mut rows = rows.into_iter();
        Ok(shapes
            .into_iter()
            .map(|geometry| DecodedRecord {
                geometry,
                attributes: rows.next().unwrap_or_default(),
            })
            .collect())
    }
}

impl ShapefileDecoder for ShapefileBytesDecoder {
    fn decode_archive(&self, archive: &[u8]) -> Result<ArchiveDecode, DecoderFailure> {
        let layers = read_layers(archive)?
            .iter()
            .map(|layer| {
                Self::decode_layer(layer).map(|records| archive::named_layer(layer, records))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ArchiveDecode::from_layers(layers))
    }

    fn decode_shapes(
        &self,
        shp: &[u8],
        _prj: Option<&str>,
    ) -> Result<Vec<Option<Geometry<f64>>>, DecoderFailure> {
        Self::read_shapes(shp)
    }

    fn decode_attributes(&self, dbf: &[u8]) -> Result<Vec<Attributes>, DecoderFailure> {
        Self::read_rows(dbf)
    }
}
