//! Geometry type vocabulary shared by collections and decoded features.

use std::fmt;
use std::str::FromStr;

use geo::Geometry;
use thiserror::Error;

/// GeoJSON-style geometry type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GeometryType {
    /// A single position.
    Point,
    /// Several positions.
    MultiPoint,
    /// A single connected line.
    LineString,
    /// Several lines.
    MultiLineString,
    /// A single area with optional holes.
    Polygon,
    /// Several areas.
    MultiPolygon,
    /// A heterogeneous collection of geometries.
    GeometryCollection,
}

impl GeometryType {
    /// Every geometry type, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Point,
        Self::MultiPoint,
        Self::LineString,
        Self::MultiLineString,
        Self::Polygon,
        Self::MultiPolygon,
        Self::GeometryCollection,
    ];

    /// Classify a decoded geometry.
    ///
    /// `Line`, `Rect` and `Triangle` are reported as the GeoJSON type they
    /// serialise to.
    pub const fn of(geometry: &Geometry<f64>) -> Self {
        match geometry {
            Geometry::Point(_) => Self::Point,
            Geometry::MultiPoint(_) => Self::MultiPoint,
            Geometry::Line(_) | Geometry::LineString(_) => Self::LineString,
            Geometry::MultiLineString(_) => Self::MultiLineString,
            Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => Self::Polygon,
            Geometry::MultiPolygon(_) => Self::MultiPolygon,
            Geometry::GeometryCollection(_) => Self::GeometryCollection,
        }
    }

    /// Feature geometry types a collection of this type accepts.
    ///
    /// Multi collections also accept their single counterpart. A geometry
    /// collection type accepts nothing.
    pub const fn allowed_feature_types(self) -> &'static [Self] {
        match self {
            Self::Point => &[Self::Point],
            Self::MultiPoint => &[Self::Point, Self::MultiPoint],
            Self::LineString => &[Self::LineString],
            Self::MultiLineString => &[Self::LineString, Self::MultiLineString],
            Self::Polygon => &[Self::Polygon],
            Self::MultiPolygon => &[Self::Polygon, Self::MultiPolygon],
            Self::GeometryCollection => &[],
        }
    }

    /// Whether a collection of this type accepts features of `feature` type.
    pub fn accepts(self, feature: Self) -> bool {
        self.allowed_feature_types().contains(&feature)
    }

    /// Whether this is a single-geometry type limited to one feature per
    /// submission.
    pub const fn is_single(self) -> bool {
        matches!(self, Self::Point | Self::LineString | Self::Polygon)
    }

    /// The GeoJSON type name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::MultiPoint => "MultiPoint",
            Self::LineString => "LineString",
            Self::MultiLineString => "MultiLineString",
            Self::Polygon => "Polygon",
            Self::MultiPolygon => "MultiPolygon",
            Self::GeometryCollection => "GeometryCollection",
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown geometry type name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown geometry type {0:?}")]
pub struct ParseGeometryTypeError(pub String);

impl FromStr for GeometryType {
    type Err = ParseGeometryTypeError;

    /// Parse a GeoJSON type name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseGeometryTypeError(s.to_owned()))
    }
}
