//! Model domain object: one climate model inside a project.

use super::{default_trackable, CatalogObject, EntityKind, FieldValues, Project, References};
use crate::identity::{model_identity, Identity};
use serde::{Deserialize, Serialize};

/// Climate model owned by a [`Project`]. Identity is `(name, project)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub description: String,
    pub project: Project,
    #[serde(default = "default_trackable")]
    pub trackable: bool,
}

impl Model {
    pub fn new(name: impl Into<String>, description: impl Into<String>, project: Project) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            project,
            trackable: true,
        }
    }
}

impl CatalogObject for Model {
    fn kind(&self) -> EntityKind {
        EntityKind::Model
    }

    fn identity(&self) -> Identity {
        model_identity(self)
    }

    fn tracking_flag(&self) -> bool {
        self.trackable
    }

    fn field_values(&self) -> FieldValues {
        vec![
            ("name", self.name.as_str().into()),
            ("description", self.description.as_str().into()),
        ]
    }

    fn references(&self) -> References<'_> {
        vec![("project_id", Some(&self.project as &dyn CatalogObject))]
    }
}
