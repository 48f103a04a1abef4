//! Calculation domain object and output file naming.
//!
//! # Responsibility
//! - Describe one derived calculation over a run, a variable and an
//!   optional region.
//! - Derive the output file name from the calculation's naming fields.
//!
//! # Invariants
//! - The calculation identity is derived from `file_name()` plus the run,
//!   variable and region identities. Two calculations share an identity
//!   exactly when they write the same file for the same run, variable and
//!   region.

use super::{
    default_trackable, CatalogObject, EntityKind, FieldValues, References, Region, Run, Variable,
};
use crate::identity::{calculation_identity, Identity};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const FILE_EXTENSION: &str = "nc";

/// Season and annual interval names accepted verbatim in file names.
const NAMED_INTERVALS: &[&str] = &[
    "jfm", "fma", "mam", "amj", "mjj", "jja", "jas", "aso", "son", "ond", "ndj", "djf", "jjas",
    "djfm", "ann",
];

/// Ensemble member selector of a calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsembleMember {
    /// Mean over all ensemble members.
    Average,
    /// Zero-based ensemble member index.
    Member(u32),
}

impl EnsembleMember {
    /// File-name label: `ens_mean` or one-based `mem<N>`.
    pub fn label(self) -> String {
        match self {
            Self::Average => "ens_mean".to_string(),
            Self::Member(index) => format!("mem{}", u64::from(index) + 1),
        }
    }
}

/// One derived calculation.
///
/// Identity covers the derived file name plus the identities of `run`,
/// `variable` and `region`. Dates and intervals matter only through the
/// file name, so two calculations collide exactly when they would write the
/// same output artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub run: Run,
    pub variable: Variable,
    /// `None` means the calculation covers the whole domain.
    pub region: Option<Region>,
    pub input_interval: String,
    pub output_interval: String,
    pub input_time_type: String,
    pub output_time_type: String,
    /// Vertical coordinate of the input data.
    pub vertical_type: Option<String>,
    pub output_vertical_type: Option<String>,
    pub ensemble_member: Option<EnsembleMember>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_trackable")]
    pub trackable: bool,
}

impl Calculation {
    /// Creates an annual-mean calculation over monthly time-series input.
    pub fn new(run: Run, variable: Variable, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            run,
            variable,
            region: None,
            input_interval: "monthly".to_string(),
            output_interval: "ann".to_string(),
            input_time_type: "ts".to_string(),
            output_time_type: "av".to_string(),
            vertical_type: None,
            output_vertical_type: None,
            ensemble_member: None,
            start_date,
            end_date,
            trackable: true,
        }
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Output file name, e.g. `mse.son.av.from_monthly_ts_sigma.am2.control.0021-0080.nc`.
    pub fn file_name(&self) -> String {
        let ensemble = self
            .ensemble_member
            .map(EnsembleMember::label)
            .unwrap_or_default();
        let parts = [
            self.variable.name.clone(),
            self.output_label(),
            self.input_label(),
            self.run.model.name.clone(),
            self.run.name.clone(),
            ensemble,
            year_label(self.start_date, self.end_date),
            FILE_EXTENSION.to_string(),
        ];
        collapse(&parts.join("."), "..", ".")
    }

    fn output_label(&self) -> String {
        let mut label = collapse(
            &format!(
                "{}.{}",
                interval_label(&self.output_interval),
                self.output_time_type
            ),
            "..",
            ".",
        );
        if let Some(vertical) = self.output_vertical_type.as_deref() {
            label = collapse(&format!("{label}.{vertical}"), "..", ".");
        }
        label
    }

    fn input_label(&self) -> String {
        let mut label = collapse(
            &format!("from_{}_{}", self.input_interval, self.input_time_type),
            "__",
            "_",
        );
        if let Some(vertical) = self.vertical_type.as_deref() {
            label = collapse(&format!("{label}_{vertical}"), "__", "_");
        }
        label
    }
}

/// Two-digit month label for `1..=12`, the name itself for known seasons.
pub fn interval_label(interval: &str) -> String {
    let trimmed = interval.trim();
    if let Ok(month) = trimmed.parse::<u32>() {
        if (1..=12).contains(&month) {
            return format!("{month:02}");
        }
    }
    let lowered = trimmed.to_ascii_lowercase();
    if NAMED_INTERVALS.contains(&lowered.as_str()) {
        return lowered;
    }
    trimmed.to_string()
}

/// Four-digit year label, or a `start-end` range when the years differ.
pub fn year_label(start: NaiveDate, end: NaiveDate) -> String {
    if start.year() == end.year() {
        format!("{:04}", start.year())
    } else {
        format!("{:04}-{:04}", start.year(), end.year())
    }
}

fn collapse(value: &str, doubled: &str, single: &str) -> String {
    let mut current = value.to_string();
    while current.contains(doubled) {
        current = current.replace(doubled, single);
    }
    current
}

impl CatalogObject for Calculation {
    fn kind(&self) -> EntityKind {
        EntityKind::Calculation
    }

    fn identity(&self) -> Identity {
        calculation_identity(self)
    }

    fn tracking_flag(&self) -> bool {
        self.trackable
    }

    fn field_values(&self) -> FieldValues {
        vec![
            ("input_interval", self.input_interval.as_str().into()),
            ("output_interval", self.output_interval.as_str().into()),
            ("output_time_type", self.output_time_type.as_str().into()),
            ("start_date", self.start_date.into()),
            ("end_date", self.end_date.into()),
            ("vertical_type", self.vertical_type.clone().into()),
            ("file_name", self.file_name().into()),
        ]
    }

    fn references(&self) -> References<'_> {
        vec![
            ("run_id", Some(&self.run as &dyn CatalogObject)),
            ("variable_id", Some(&self.variable as &dyn CatalogObject)),
            (
                "region_id",
                self.region.as_ref().map(|region| region as &dyn CatalogObject),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::{interval_label, year_label, EnsembleMember};
    use crate::model::fixtures;
    use chrono::NaiveDate;

    #[test]
    fn file_name_joins_labels_in_order() {
        let calc = fixtures::calculation();
        assert_eq!(
            calc.file_name(),
            "mse.son.av.from_monthly_ts_sigma.am2.control.0021-0080.nc"
        );
    }

    #[test]
    fn file_name_includes_ensemble_and_output_vertical_labels() {
        let mut calc = fixtures::calculation();
        calc.output_vertical_type = Some("vert_int".to_string());
        calc.ensemble_member = Some(EnsembleMember::Member(0));
        calc.vertical_type = None;
        assert_eq!(
            calc.file_name(),
            "mse.son.av.vert_int.from_monthly_ts.am2.control.mem1.0021-0080.nc"
        );

        calc.ensemble_member = Some(EnsembleMember::Average);
        assert!(calc.file_name().contains(".ens_mean."));
    }

    #[test]
    fn interval_label_formats_months_and_seasons() {
        assert_eq!(interval_label("3"), "03");
        assert_eq!(interval_label("12"), "12");
        assert_eq!(interval_label("DJF"), "djf");
        assert_eq!(interval_label("ann"), "ann");
        assert_eq!(interval_label("13"), "13");
    }

    #[test]
    fn year_label_collapses_single_year() {
        let start = NaiveDate::from_ymd_opt(4, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(4, 12, 31).unwrap();
        assert_eq!(year_label(start, end), "0004");
        let end = NaiveDate::from_ymd_opt(10, 12, 31).unwrap();
        assert_eq!(year_label(start, end), "0004-0010");
    }
}
