//! Per-form session state.
//!
//! An [`IngestionSession`] is created when the ingestion form opens and
//! dropped when it closes. It holds the user's choices; the
//! [`IngestionController`](crate::IngestionController) reads it by reference.

use crate::collection::TargetCollection;
use crate::compatibility::ProjectCrs;
use crate::submission::TurbineParameters;

/// User selections and project context for one ingestion form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestionSession {
    project_crs: ProjectCrs,
    collection: Option<TargetCollection>,
    feature_name: String,
    turbine: TurbineParameters,
}

impl IngestionSession {
    /// Open a session for a project stored in `project_crs`.
    pub fn new(project_crs: ProjectCrs) -> Self {
        Self {
            project_crs,
            ..Self::default()
        }
    }

    /// CRS features are stored in.
    pub const fn project_crs(&self) -> &ProjectCrs {
        &self.project_crs
    }

    /// Currently selected target collection.
    pub const fn collection(&self) -> Option<&TargetCollection> {
        self.collection.as_ref()
    }

    /// Choose the target collection.
    pub fn select_collection(&mut self, collection: TargetCollection) {
        self.collection = Some(collection);
    }

    /// Name given to the submitted feature.
    pub fn feature_name(&self) -> &str {
        &self.feature_name
    }

    /// Whether a non-blank feature name has been entered.
    pub fn has_feature_name(&self) -> bool {
        !self.feature_name.trim().is_empty()
    }

    /// Set the name given to the submitted feature.
    pub fn set_feature_name(&mut self, name: impl Into<String>) {
        self.feature_name = name.into();
    }

    /// Turbine-layout parameters.
    pub const fn turbine_parameters(&self) -> &TurbineParameters {
        &self.turbine
    }

    /// Replace the turbine-layout parameters.
    pub fn set_turbine_parameters(&mut self, turbine: TurbineParameters) {
        self.turbine = turbine;
    }

    /// Clear every user selection, keeping the project context.
    pub fn reset_form(&mut self) {
        self.collection = None;
        self.feature_name.clear();
        self.turbine = TurbineParameters::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CollectionId;
    use crate::geometry::GeometryType;
    use rstest::rstest;

    #[rstest]
    #[case("", false)]
    #[case("   ", false)]
    #[case("Layout A", true)]
    fn blank_names_do_not_count(#[case] name: &str, #[case] expected: bool) {
        let mut session = IngestionSession::default();
        session.set_feature_name(name);
        assert_eq!(session.has_feature_name(), expected);
    }

    #[rstest]
    fn reset_keeps_project_context() {
        let project = ProjectCrs::new(27700, Some("OSGB36".into()));
        let mut session = IngestionSession::new(project.clone());
        session.select_collection(TargetCollection::global(
            CollectionId::new(3),
            "Boundary",
            GeometryType::Polygon,
        ));
        session.set_feature_name("Boundary");
        session.reset_form();
        assert_eq!(session.project_crs(), &project);
        assert!(session.collection().is_none());
        assert!(!session.has_feature_name());
    }
}
