//! Catalog domain model.
//!
//! # Responsibility
//! - Define the plain data objects tracked by the catalog.
//! - Expose each object's identity, tracking flag, declared field values and
//!   required references through [`CatalogObject`].
//!
//! # Invariants
//! - Objects own their required references by value; two objects denote the
//!   same record exactly when their identities are equal.
//! - `field_values()` and `references()` list exactly the names declared by
//!   the kind's [`EntityDescriptor`], in declaration order.

pub mod calculation;
pub mod climate_model;
pub mod field;
pub mod kind;
pub mod project;
pub mod region;
pub mod run;
pub mod units;
pub mod variable;

use crate::identity::Identity;

pub use calculation::{Calculation, EnsembleMember};
pub use climate_model::Model;
pub use field::FieldValue;
pub use kind::{EntityDescriptor, EntityKind, FieldSpec, FieldType, ReferenceSpec};
pub use project::Project;
pub use region::Region;
pub use run::Run;
pub use units::Units;
pub use variable::Variable;

/// Declared field values of one object, by field name.
pub type FieldValues = Vec<(&'static str, FieldValue)>;

/// Required references of one object, by foreign-key column.
pub type References<'a> = Vec<(&'static str, Option<&'a dyn CatalogObject>)>;

/// Object that can be persisted in the catalog.
pub trait CatalogObject {
    fn kind(&self) -> EntityKind;
    /// Stable identity derived from identity fields and required references.
    fn identity(&self) -> Identity;
    /// This object's own tracking flag, ignoring ancestors.
    fn tracking_flag(&self) -> bool;
    fn field_values(&self) -> FieldValues;
    fn references(&self) -> References<'_>;
}

pub(crate) fn default_trackable() -> bool {
    true
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{Calculation, Model, Project, Region, Run, Units, Variable};
    use chrono::NaiveDate;

    pub fn project() -> Project {
        Project::new("example", "/archive/example/")
    }

    pub fn model() -> Model {
        Model::new("am2", "AM2 atmosphere", project())
    }

    pub fn run() -> Run {
        let mut run = Run::new("control", "b", model());
        run.start_date = NaiveDate::from_ymd_opt(1, 1, 1);
        run.end_date = NaiveDate::from_ymd_opt(80, 12, 31);
        run.duration = Some(1);
        run.input_directory = Some("/archive/am2/control".to_string());
        run
    }

    pub fn units() -> Units {
        Units::new("J kg$^{-1}$")
    }

    pub fn variable() -> Variable {
        Variable::new("mse", "Moist static energy", units())
    }

    pub fn region() -> Region {
        Region::new("nh", "Northern Hemisphere")
    }

    pub fn calculation() -> Calculation {
        let mut calc = Calculation::new(
            run(),
            variable(),
            NaiveDate::from_ymd_opt(21, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(80, 12, 31).unwrap(),
        );
        calc.region = Some(region());
        calc.output_interval = "son".to_string();
        calc.vertical_type = Some("sigma".to_string());
        calc
    }
}

#[cfg(test)]
mod tests {
    use super::{fixtures, CatalogObject};

    fn assert_matches_descriptor(obj: &dyn CatalogObject) {
        let descriptor = obj.kind().descriptor();
        let field_names: Vec<_> = obj.field_values().into_iter().map(|(name, _)| name).collect();
        let declared: Vec<_> = descriptor.fields.iter().map(|field| field.name).collect();
        assert_eq!(field_names, declared, "fields of {}", obj.kind());

        let reference_columns: Vec<_> = obj
            .references()
            .into_iter()
            .map(|(column, _)| column)
            .collect();
        let declared: Vec<_> = descriptor
            .references
            .iter()
            .map(|reference| reference.column)
            .collect();
        assert_eq!(reference_columns, declared, "references of {}", obj.kind());

        for (column, target) in obj.references() {
            let spec = descriptor.reference(column).unwrap();
            match target {
                Some(target) => assert_eq!(target.kind(), spec.target),
                None => assert!(spec.nullable, "{column} must be present"),
            }
        }
    }

    #[test]
    fn every_object_matches_its_descriptor() {
        let calc = fixtures::calculation();
        assert_matches_descriptor(&calc);
        assert_matches_descriptor(&calc.run);
        assert_matches_descriptor(&calc.run.model);
        assert_matches_descriptor(&calc.run.model.project);
        assert_matches_descriptor(&calc.variable);
        assert_matches_descriptor(&calc.variable.units);
        assert_matches_descriptor(calc.region.as_ref().unwrap());

        let mut without_region = calc.clone();
        without_region.region = None;
        assert_matches_descriptor(&without_region);
    }
}
