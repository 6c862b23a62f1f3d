//! Compare a decoded shapefile against its target collection and project.
//!
//! [`evaluate`] is pure and cheap; callers recompute it whenever an input
//! changes instead of caching the result.

use crate::collection::TargetCollection;
use crate::crs::CrsResolution;
use crate::features::DecodedFeatureSet;

/// CRS the project stores features in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectCrs {
    /// Project SRID, when known.
    pub srid: Option<i32>,
    /// Human-readable CRS name, when known.
    pub name: Option<String>,
}

impl ProjectCrs {
    /// A project CRS with a known SRID.
    pub fn new(srid: i32, name: Option<String>) -> Self {
        Self {
            srid: Some(srid),
            name,
        }
    }

    fn label(&self) -> String {
        match (&self.name, self.srid) {
            (Some(name), _) => name.clone(),
            (None, Some(srid)) => format!("EPSG:{srid}"),
            (None, None) => "the project CRS".to_owned(),
        }
    }
}

/// Independent verdicts about a decoded shapefile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompatibilityVerdict {
    /// Decoding succeeded but kept no feature.
    pub empty_shapefile: bool,
    /// The first feature's geometry type is not accepted by the collection.
    pub geometry_mismatch: bool,
    /// A single-geometry collection would receive several features.
    pub too_many_features: bool,
    /// The server will reproject the features into the project CRS.
    pub will_reproject: bool,
    /// The source CRS could not be identified.
    pub crs_unresolved: bool,
}

/// How a [`Notice`] affects submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Submission is disabled while the notice holds.
    Blocking,
    /// Informational only.
    Advisory,
}

/// A user-facing message derived from a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Whether the notice blocks submission.
    pub severity: Severity,
    /// Message text.
    pub message: String,
}

impl CompatibilityVerdict {
    /// Whether any verdict disables submission.
    ///
    /// Only `will_reproject` is advisory.
    pub const fn blocks_submission(&self) -> bool {
        self.empty_shapefile
            || self.geometry_mismatch
            || self.too_many_features
            || self.crs_unresolved
    }
}

/// Inputs of [`evaluate`] beyond the verdict itself, kept for [`notices`].
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Decoded features.
    pub decoded: &'a DecodedFeatureSet,
    /// Target collection.
    pub collection: &'a TargetCollection,
    /// Source CRS lookup state.
    pub source_crs: &'a CrsResolution,
    /// Project CRS.
    pub project_crs: &'a ProjectCrs,
}

/// Compute the verdicts for one combination of inputs.
///
/// # Examples
///
/// ```
/// use geo::{Geometry, Point};
/// use shapegate_core::{
///     Attributes, CollectionId, CrsDescriptor, CrsResolution, DecodedFeatureSet, DecodedRecord,
///     GeometryType, ProjectCrs, TargetCollection, evaluate,
/// };
///
/// let decoded = DecodedFeatureSet::from_records(vec![DecodedRecord {
///     geometry: Some(Geometry::Point(Point::new(0.0, 0.0))),
///     attributes: Attributes::new(),
/// }]);
/// let collection = TargetCollection::global(CollectionId::new(5), "Masts", GeometryType::Polygon);
/// let source = CrsResolution::Resolved(CrsDescriptor::from_srid(27700));
/// let verdict = evaluate(&decoded, &collection, &source, &ProjectCrs::new(4326, None));
/// assert!(verdict.geometry_mismatch);
/// assert!(verdict.will_reproject);
/// ```
pub fn evaluate(
    decoded: &DecodedFeatureSet,
    collection: &TargetCollection,
    source_crs: &CrsResolution,
    project_crs: &ProjectCrs,
) -> CompatibilityVerdict {
    let collection_type = collection.geometry_type;
    let geometry_mismatch = decoded
        .first_geometry_type()
        .is_some_and(|feature_type| !collection_type.accepts(feature_type));
    let too_many_features =
        collection_type.is_single() && decoded.len() > 1 && !collection.is_turbine_layout();
    let will_reproject = match (project_crs.srid, source_crs.descriptor()) {
        (Some(project), Some(source)) => project != source.srid,
        _ => false,
    };
    CompatibilityVerdict {
        empty_shapefile: decoded.is_empty(),
        geometry_mismatch,
        too_many_features,
        will_reproject,
        crs_unresolved: source_crs.is_unresolved(),
    }
}

/// Render the verdicts for `context` as user-facing notices.
///
/// Blocking notices come first, in the order the verdicts are declared.
pub fn notices(verdict: &CompatibilityVerdict, context: &EvaluationContext<'_>) -> Vec<Notice> {
    let mut out = Vec::new();
    let mut blocking = |message: String| {
        out.push(Notice {
            severity: Severity::Blocking,
            message,
        });
    };
    if verdict.empty_shapefile {
        blocking("The shapefile contains no features with geometry".to_owned());
    }
    if verdict.geometry_mismatch {
        let found = context
            .decoded
            .first_geometry_type()
            .map_or_else(|| "unknown".to_owned(), |kind| kind.to_string());
        blocking(format!(
            "Geometry type {found} is not compatible with collection {:?}, which accepts {}",
            context.collection.title,
            context.collection.geometry_type
        ));
    }
    if verdict.too_many_features {
        blocking(format!(
            "Collection {:?} accepts a single {} feature but the shapefile contains {}",
            context.collection.title,
            context.collection.geometry_type,
            context.decoded.len()
        ));
    }
    if verdict.crs_unresolved {
        blocking(
            "The coordinate reference system could not be identified; select the files again to retry"
                .to_owned(),
        );
    }
    if verdict.will_reproject
        && let Some(source) = context.source_crs.descriptor()
    {
        out.push(Notice {
            severity: Severity::Advisory,
            message: format!(
                "Features will be reprojected from {source} to {}",
                context.project_crs.label()
            ),
        });
    }
    out
}
