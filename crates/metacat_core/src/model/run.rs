//! Run domain object: one simulation (or observational product) of a model.

use super::{default_trackable, CatalogObject, EntityKind, FieldValues, Model, References};
use crate::identity::{run_identity, Identity};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Model run. Identity is `(name, model)`; the input-data range, duration
/// and directory are metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub name: String,
    pub description: String,
    /// First date covered by the run's input data.
    pub start_date: Option<NaiveDate>,
    /// Last date covered by the run's input data.
    pub end_date: Option<NaiveDate>,
    /// Span of one input file, in years.
    pub duration: Option<i64>,
    pub input_directory: Option<String>,
    pub model: Model,
    #[serde(default = "default_trackable")]
    pub trackable: bool,
}

impl Run {
    pub fn new(name: impl Into<String>, description: impl Into<String>, model: Model) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            start_date: None,
            end_date: None,
            duration: None,
            input_directory: None,
            model,
            trackable: true,
        }
    }
}

impl CatalogObject for Run {
    fn kind(&self) -> EntityKind {
        EntityKind::Run
    }

    fn identity(&self) -> Identity {
        run_identity(self)
    }

    fn tracking_flag(&self) -> bool {
        self.trackable
    }

    fn field_values(&self) -> FieldValues {
        vec![
            ("name", self.name.as_str().into()),
            ("description", self.description.as_str().into()),
            ("start_date", self.start_date.into()),
            ("end_date", self.end_date.into()),
            ("duration", self.duration.into()),
            ("input_directory", self.input_directory.clone().into()),
        ]
    }

    fn references(&self) -> References<'_> {
        vec![("model_id", Some(&self.model as &dyn CatalogObject))]
    }
}
