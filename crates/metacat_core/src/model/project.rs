//! Project domain object: the top-level owner of models.

use super::{default_trackable, CatalogObject, EntityKind, FieldValues, References};
use crate::identity::{project_identity, Identity};
use serde::{Deserialize, Serialize};

/// Named project with an output directory. Identity is `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub output_directory: String,
    #[serde(default = "default_trackable")]
    pub trackable: bool,
}

impl Project {
    pub fn new(name: impl Into<String>, output_directory: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output_directory: output_directory.into(),
            trackable: true,
        }
    }
}

impl CatalogObject for Project {
    fn kind(&self) -> EntityKind {
        EntityKind::Project
    }

    fn identity(&self) -> Identity {
        project_identity(self)
    }

    fn tracking_flag(&self) -> bool {
        self.trackable
    }

    fn field_values(&self) -> FieldValues {
        vec![
            ("name", self.name.as_str().into()),
            ("output_directory", self.output_directory.as_str().into()),
        ]
    }

    fn references(&self) -> References<'_> {
        Vec::new()
    }
}
