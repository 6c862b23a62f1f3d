//! Target collections and the read-only registry that lists them.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::geometry::GeometryType;

/// Identifier of a feature collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CollectionId(i64);

impl CollectionId {
    /// The turbine-layout collection, exempt from the single-feature rule.
    pub const TURBINE_LAYOUT: Self = Self(1);

    /// Wrap a raw identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw identifier.
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Whether this is the turbine-layout sentinel.
    pub const fn is_turbine_layout(self) -> bool {
        self.0 == Self::TURBINE_LAYOUT.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ProjectId(i64);

impl ProjectId {
    /// Wrap a raw identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw identifier.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a collection is shared by all projects or owned by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionScope {
    /// Available to every project.
    Global,
    /// Owned by a single project.
    Project(ProjectId),
}

/// A collection features can be submitted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetCollection {
    /// Collection identifier.
    pub id: CollectionId,
    /// Display title.
    pub title: String,
    /// Declared geometry type.
    pub geometry_type: GeometryType,
    /// Ownership scope.
    pub scope: CollectionScope,
}

impl TargetCollection {
    /// Construct a global collection.
    pub fn global(id: CollectionId, title: impl Into<String>, geometry_type: GeometryType) -> Self {
        Self {
            id,
            title: title.into(),
            geometry_type,
            scope: CollectionScope::Global,
        }
    }

    /// Construct a collection owned by `project`.
    pub fn scoped(
        id: CollectionId,
        title: impl Into<String>,
        geometry_type: GeometryType,
        project: ProjectId,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            geometry_type,
            scope: CollectionScope::Project(project),
        }
    }

    /// Whether this is the turbine-layout collection.
    pub const fn is_turbine_layout(&self) -> bool {
        self.id.is_turbine_layout()
    }
}

/// Errors from [`CollectionRegistry`] implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The registry could not be reached or answered with an error.
    #[error("failed to list collections from {url}: {message}")]
    Unavailable {
        /// Request URL.
        url: String,
        /// Error description.
        message: String,
    },
    /// A listed collection declared a geometry type this client does not know.
    #[error("collection {id} declares unsupported geometry type {geometry_type:?}")]
    UnsupportedGeometryType {
        /// Offending collection.
        id: CollectionId,
        /// Declared type name.
        geometry_type: String,
    },
    /// The response body did not match the expected shape.
    #[error("failed to parse collection listing: {message}")]
    Parse {
        /// Parser error description.
        message: String,
    },
}

/// Read-only listing of collections visible to a project.
#[async_trait(?Send)]
pub trait CollectionRegistry {
    /// List global collections and those scoped to `project`.
    async fn list_collections(
        &self,
        project: Option<ProjectId>,
    ) -> Result<Vec<TargetCollection>, RegistryError>;
}

/// Find `id` among `collections`.
pub fn find_collection(
    collections: &[TargetCollection],
    id: CollectionId,
) -> Option<&TargetCollection> {
    collections.iter().find(|collection| collection.id == id)
}

/// Registry backed by a fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticCollectionRegistry {
    collections: Vec<TargetCollection>,
}

impl StaticCollectionRegistry {
    /// Create a registry over `collections`.
    pub const fn new(collections: Vec<TargetCollection>) -> Self {
        Self { collections }
    }
}

#[async_trait(?Send)]
impl CollectionRegistry for StaticCollectionRegistry {
    async fn list_collections(
        &self,
        project: Option<ProjectId>,
    ) -> Result<Vec<TargetCollection>, RegistryError> {
        Ok(self
            .collections
            .iter()
            .filter(|collection| match collection.scope {
                CollectionScope::Global => true,
                CollectionScope::Project(owner) => Some(owner) == project,
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::block_on;
    use rstest::rstest;

    fn registry() -> StaticCollectionRegistry {
        StaticCollectionRegistry::new(vec![
            TargetCollection::global(CollectionId::TURBINE_LAYOUT, "Turbines", GeometryType::Point),
            TargetCollection::global(CollectionId::new(2), "Site boundary", GeometryType::Polygon),
            TargetCollection::scoped(
                CollectionId::new(10),
                "Access tracks",
                GeometryType::MultiLineString,
                ProjectId::new(7),
            ),
        ])
    }

    #[rstest]
    fn lists_global_and_owned_collections() {
        let listed = block_on(registry().list_collections(Some(ProjectId::new(7))))
            .expect("static registry never fails");
        assert_eq!(listed.len(), 3);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(ProjectId::new(8)))]
    fn hides_collections_of_other_projects(#[case] project: Option<ProjectId>) {
        let listed = block_on(registry().list_collections(project)).expect("listing");
        assert!(listed.iter().all(|c| c.scope == CollectionScope::Global));
    }

    #[rstest]
    fn sentinel_is_recognised() {
        let listed = registry().collections;
        let turbines = find_collection(&listed, CollectionId::new(1)).expect("sentinel listed");
        assert!(turbines.is_turbine_layout());
        let boundary = find_collection(&listed, CollectionId::new(2)).expect("boundary listed");
        assert!(!boundary.is_turbine_layout());
    }
}
