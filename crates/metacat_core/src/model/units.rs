//! Units domain object: physical units and plotting conversions.

use super::{default_trackable, CatalogObject, EntityKind, FieldValues, References};
use crate::identity::{units_identity, Identity};
use serde::{Deserialize, Serialize};

/// Units of a column-integrated quantity, prefixed onto the base units.
pub const VERTICAL_INTEGRAL_PREFIX: &str = "kg m$^{-2}$";

/// String representation of physical units. Identity is `unit_string`; every
/// other field is metadata refreshed on each submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Units {
    pub unit_string: String,
    pub plot_units: String,
    pub plot_units_conversion: f64,
    pub vertical_integral_units: String,
    pub vertical_integral_plot_units: String,
    pub vertical_integral_plot_units_conversion: f64,
    #[serde(default = "default_trackable")]
    pub trackable: bool,
}

impl Units {
    /// Creates units whose plotting and vertical-integral forms are derived
    /// from `unit_string` with a conversion factor of 1.
    pub fn new(unit_string: impl Into<String>) -> Self {
        let unit_string = unit_string.into();
        let vertical_integral_units = vertical_integral_label(&unit_string);
        Self {
            plot_units: unit_string.clone(),
            plot_units_conversion: 1.0,
            vertical_integral_plot_units: vertical_integral_units.clone(),
            vertical_integral_units,
            vertical_integral_plot_units_conversion: 1.0,
            unit_string,
            trackable: true,
        }
    }

    /// Sets plot units and conversion, re-deriving the vertical-integral plot
    /// units and conversion from them.
    pub fn with_plot_units(mut self, plot_units: impl Into<String>, conversion: f64) -> Self {
        self.plot_units = plot_units.into();
        self.plot_units_conversion = conversion;
        self.vertical_integral_plot_units = vertical_integral_label(&self.plot_units);
        self.vertical_integral_plot_units_conversion = conversion;
        self
    }
}

fn vertical_integral_label(units: &str) -> String {
    format!("{VERTICAL_INTEGRAL_PREFIX} {units}").replace("  ", " ")
}

impl CatalogObject for Units {
    fn kind(&self) -> EntityKind {
        EntityKind::Units
    }

    fn identity(&self) -> Identity {
        units_identity(self)
    }

    fn tracking_flag(&self) -> bool {
        self.trackable
    }

    fn field_values(&self) -> FieldValues {
        vec![
            ("unit_string", self.unit_string.as_str().into()),
            ("plot_units", self.plot_units.as_str().into()),
            ("plot_units_conversion", self.plot_units_conversion.into()),
            (
                "vertical_integral_units",
                self.vertical_integral_units.as_str().into(),
            ),
            (
                "vertical_integral_plot_units",
                self.vertical_integral_plot_units.as_str().into(),
            ),
            (
                "vertical_integral_plot_units_conversion",
                self.vertical_integral_plot_units_conversion.into(),
            ),
        ]
    }

    fn references(&self) -> References<'_> {
        Vec::new()
    }
}
