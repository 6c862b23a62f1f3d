//! Wire types for the service responses.

use serde::Deserialize;
use shapegate_core::{
    CollectionId, CrsDescriptor, GeometryType, ProjectId, RegistryError, SubmissionReceipt,
    TargetCollection,
};

/// Body returned by both CRS lookup endpoints.
#[derive(Debug, Deserialize)]
pub struct CrsResponse {
    /// Spatial reference identifier.
    pub srid: i32,
    /// Human-readable CRS name.
    #[serde(default)]
    pub name: Option<String>,
}

impl From<CrsResponse> for CrsDescriptor {
    fn from(response: CrsResponse) -> Self {
        Self {
            srid: response.srid,
            name: response.name.filter(|name| !name.trim().is_empty()),
        }
    }
}

/// Body returned when a submission creates a feature.
#[derive(Debug, Deserialize)]
pub struct CreatedResponse {
    /// Identifier of the created feature.
    pub id: i64,
}

impl From<CreatedResponse> for SubmissionReceipt {
    fn from(response: CreatedResponse) -> Self {
        Self { id: response.id }
    }
}

/// Body returned when the service rejects a request.
///
/// Both fields are optional on the wire; the detailed message is accepted
/// in snake or camel case.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    /// Short message.
    #[serde(default)]
    pub message: String,
    /// Detailed message, shown verbatim when present.
    #[serde(default, alias = "longMessage")]
    pub long_message: Option<String>,
}

/// One entry of the collection listing.
#[derive(Debug, Deserialize)]
pub struct CollectionRecord {
    /// Collection identifier.
    pub id: i64,
    /// Display title.
    pub title: String,
    /// GeoJSON geometry type name.
    pub geometry_type: String,
    /// Owning project; absent for global collections.
    #[serde(default)]
    pub project_id: Option<i64>,
}

impl TryFrom<CollectionRecord> for TargetCollection {
    type Error = RegistryError;

    fn try_from(record: CollectionRecord) -> Result<Self, Self::Error> {
        let id = CollectionId::new(record.id);
        let geometry_type: GeometryType =
            record
                .geometry_type
                .parse()
                .map_err(|_| RegistryError::UnsupportedGeometryType {
                    id,
                    geometry_type: record.geometry_type.clone(),
                })?;
        Ok(match record.project_id {
            Some(project) => Self::scoped(id, record.title, geometry_type, ProjectId::new(project)),
            None => Self::global(id, record.title, geometry_type),
        })
    }
}
