//! Decoded geometry and attribute records.

use std::collections::BTreeMap;

use geo::Geometry;

use crate::geometry::GeometryType;

/// One attribute value read from a shapefile's attribute table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum AttributeValue {
    /// An empty cell.
    Null,
    /// Boolean (logical) field.
    Boolean(bool),
    /// Integral numeric field.
    Integer(i64),
    /// Floating-point numeric field.
    Number(f64),
    /// Character, memo or date field rendered as text.
    Text(String),
}

/// Attribute map of a single record, ordered by field name.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A record as produced by the decode routine, before null geometries are
/// separated out.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    /// Geometry, or `None` for a null shape.
    pub geometry: Option<Geometry<f64>>,
    /// Attribute values for the record.
    pub attributes: Attributes,
}

/// A geometry with its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Non-null geometry.
    pub geometry: Geometry<f64>,
    /// Attribute values.
    pub attributes: Attributes,
}

impl Feature {
    /// Geometry type of the feature.
    pub const fn geometry_type(&self) -> GeometryType {
        GeometryType::of(&self.geometry)
    }
}

/// One decoded layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    /// Layer name, when the decode routine knows it.
    pub name: Option<String>,
    /// Records in source order.
    pub records: Vec<DecodedRecord>,
}

/// Result of decoding an archive, which may embed several layers.
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveDecode {
    /// The archive held exactly one layer.
    Single(FeatureCollection),
    /// The archive held several layers, in archive order.
    Multiple(Vec<FeatureCollection>),
}

impl ArchiveDecode {
    /// Build from a list of layers, collapsing a one-element list.
    pub fn from_layers(mut layers: Vec<FeatureCollection>) -> Self {
        if layers.len() == 1
            && let Some(layer) = layers.pop()
        {
            return Self::Single(layer);
        }
        Self::Multiple(layers)
    }

    /// Take the layer used for ingestion: the only one, or the first of many.
    pub fn into_first(self) -> Option<FeatureCollection> {
        match self {
            Self::Single(layer) => Some(layer),
            Self::Multiple(layers) => layers.into_iter().next(),
        }
    }
}

/// Kept features plus the number of records dropped for null geometry.
///
/// Always derived wholesale from one bundle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFeatureSet {
    features: Vec<Feature>,
    dropped_null_geometries: usize,
}

impl DecodedFeatureSet {
    /// Partition decoded records into kept features and dropped null shapes.
    ///
    /// # Examples
    ///
    /// ```
    /// use geo::{Geometry, Point};
    /// use shapegate_core::{Attributes, DecodedFeatureSet, DecodedRecord};
    ///
    /// let records = vec![
    ///     DecodedRecord { geometry: Some(Geometry::Point(Point::new(0.0, 0.0))), attributes: Attributes::new() },
    ///     DecodedRecord { geometry: None, attributes: Attributes::new() },
    /// ];
    /// let set = DecodedFeatureSet::from_records(records);
    /// assert_eq!(set.len(), 1);
    /// assert_eq!(set.dropped_null_geometries(), 1);
    /// ```
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = DecodedRecord>,
    {
        let mut features = Vec::new();
        let mut dropped_null_geometries = 0;
        for record in records {
            match record.geometry {
                Some(geometry) => features.push(Feature {
                    geometry,
                    attributes: record.attributes,
                }),
                None => dropped_null_geometries += 1,
            }
        }
        Self {
            features,
            dropped_null_geometries,
        }
    }

    /// Kept features in source order.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Number of kept features.
    pub const fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether no feature was kept.
    pub const fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of source records dropped because their geometry was null.
    pub const fn dropped_null_geometries(&self) -> usize {
        self.dropped_null_geometries
    }

    /// Geometry type of the first kept feature.
    pub fn first_geometry_type(&self) -> Option<GeometryType> {
        self.features.first().map(Feature::geometry_type)
    }
}
