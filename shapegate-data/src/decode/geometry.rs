//! Conversion of `shapefile` shapes into `geo` geometries.

use geo::{Geometry, MultiLineString, MultiPoint, MultiPolygon};
use shapefile::Shape;
use shapegate_core::DecoderFailure;

/// Convert one shape record, mapping null shapes to `None`.
///
/// Z and M coordinates are discarded. Multi-part geometries with a single
/// part are collapsed to their single-part type, so a one-ring polygon
/// record becomes a `Polygon` rather than a `MultiPolygon`.
pub fn shape_to_geometry(shape: Shape) -> Result<Option<Geometry<f64>>, DecoderFailure> {
    if matches!(shape, Shape::NullShape) {
        return Ok(None);
    }
    let kind = shape.shapetype();
    let geometry = Geometry::<f64>::try_from(shape)
        .map_err(|err| DecoderFailure::new(format!("cannot convert {kind:?} shape: {err}")))?;
    Ok(Some(collapse_single_part(geometry)))
}

/// Replace single-member multi-geometries with their only member.
pub fn collapse_single_part(geometry: Geometry<f64>) -> Geometry<f64> {
    match geometry {
        Geometry::MultiPoint(multi) => only(multi.0)
            .map_or_else(|parts| Geometry::MultiPoint(MultiPoint(parts)), Geometry::Point),
        Geometry::MultiLineString(multi) => only(multi.0).map_or_else(
            |parts| Geometry::MultiLineString(MultiLineString(parts)),
            Geometry::LineString,
        ),
        Geometry::MultiPolygon(multi) => only(multi.0)
            .map_or_else(|parts| Geometry::MultiPolygon(MultiPolygon(parts)), Geometry::Polygon),
        other => other,
    }
}

fn only<T>(mut parts: Vec<T>) -> Result<T, Vec<T>> {
    if parts.len() == 1
        && let Some(part) = parts.pop()
    {
        return Ok(part);
    }
    Err(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Point, Polygon};
    use rstest::rstest;

    fn square(offset: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (offset, 0.0),
                (offset + 1.0, 0.0),
                (offset + 1.0, 1.0),
                (offset, 0.0),
            ]),
            Vec::new(),
        )
    }

    #[rstest]
    fn null_shapes_are_dropped_not_failed() {
        assert_eq!(shape_to_geometry(Shape::NullShape), Ok(None));
    }

    #[rstest]
    fn points_convert_directly() {
        let shape = Shape::Point(shapefile::Point::new(1.5, -2.0));
        assert_eq!(
            shape_to_geometry(shape),
            Ok(Some(Geometry::Point(Point::new(1.5, -2.0))))
        );
    }

    #[rstest]
    fn single_polygons_are_collapsed() {
        let collapsed =
            collapse_single_part(Geometry::MultiPolygon(MultiPolygon(vec![square(0.0)])));
        assert_eq!(collapsed, Geometry::Polygon(square(0.0)));
    }

    #[rstest]
    fn true_multi_polygons_are_kept() {
        let multi = Geometry::MultiPolygon(MultiPolygon(vec![square(0.0), square(5.0)]));
        assert_eq!(collapse_single_part(multi.clone()), multi);
    }

    #[rstest]
    fn single_points_in_multipoints_are_collapsed() {
        let collapsed =
            collapse_single_part(Geometry::MultiPoint(MultiPoint(vec![Point::new(3.0, 4.0)])));
        assert_eq!(collapsed, Geometry::Point(Point::new(3.0, 4.0)));
    }
}
