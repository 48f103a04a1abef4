//! Variable domain object: a physical quantity with units.

use super::{default_trackable, CatalogObject, EntityKind, FieldValues, References, Units};
use crate::identity::{variable_identity, Identity};
use serde::{Deserialize, Serialize};

/// Physical variable. Identity is `(name, units)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub description: String,
    pub units: Units,
    #[serde(default = "default_trackable")]
    pub trackable: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>, description: impl Into<String>, units: Units) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            units,
            trackable: true,
        }
    }
}

impl CatalogObject for Variable {
    fn kind(&self) -> EntityKind {
        EntityKind::Variable
    }

    fn identity(&self) -> Identity {
        variable_identity(self)
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
        vec![("units_id", Some(&self.units as &dyn CatalogObject))]
    }
}
