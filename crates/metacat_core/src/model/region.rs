//! Region domain object: a named geographical subset.

use super::{default_trackable, CatalogObject, EntityKind, FieldValues, References};
use crate::identity::{region_identity, Identity};
use serde::{Deserialize, Serialize};

/// Geographical region. Identity is `name`; bounds and masks are owned by the
/// calculation pipeline and are not catalogued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub description: String,
    #[serde(default = "default_trackable")]
    pub trackable: bool,
}

impl Region {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            trackable: true,
        }
    }
}

impl CatalogObject for Region {
    fn kind(&self) -> EntityKind {
        EntityKind::Region
    }

    fn identity(&self) -> Identity {
        region_identity(self)
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
        Vec::new()
    }
}
