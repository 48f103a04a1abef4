//! Entity kinds and their static storage descriptors.
//!
//! # Responsibility
//! - Enumerate catalog entity kinds in dependency order.
//! - Describe each kind's table, declared fields and required references so
//!   storage, resolution and cascading deletes stay table-driven.
//!
//! # Invariants
//! - A reference always targets a kind that appears earlier in
//!   [`EntityKind::ALL`].
//! - Field and reference names are valid SQL column names.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Catalog entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    Units,
    Model,
    Variable,
    Region,
    Run,
    Calculation,
}

/// Storage type of one declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Real,
    Date,
}

/// One declared (persisted) field of an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
}

/// One required reference from an entity kind to another kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSpec {
    /// Foreign-key column on the referencing table.
    pub column: &'static str,
    /// Referenced kind.
    pub target: EntityKind,
    /// Whether the column may be NULL. A nullable reference still cascades.
    pub nullable: bool,
}

/// Static storage descriptor for one entity kind.
#[derive(Debug)]
pub struct EntityDescriptor {
    pub kind: EntityKind,
    pub table: &'static str,
    pub fields: &'static [FieldSpec],
    pub references: &'static [ReferenceSpec],
}

impl EntityDescriptor {
    /// Looks up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Looks up a reference by column name.
    pub fn reference(&self, column: &str) -> Option<&'static ReferenceSpec> {
        self.references
            .iter()
            .find(|reference| reference.column == column)
    }
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        ty: FieldType::Text,
    }
}

const fn integer(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        ty: FieldType::Integer,
    }
}

const fn real(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        ty: FieldType::Real,
    }
}

const fn date(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        ty: FieldType::Date,
    }
}

const fn required(column: &'static str, target: EntityKind) -> ReferenceSpec {
    ReferenceSpec {
        column,
        target,
        nullable: false,
    }
}

static PROJECT: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Project,
    table: "projects",
    fields: &[text("name"), text("output_directory")],
    references: &[],
};

static UNITS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Units,
    table: "units",
    fields: &[
        text("unit_string"),
        text("plot_units"),
        real("plot_units_conversion"),
        text("vertical_integral_units"),
        text("vertical_integral_plot_units"),
        real("vertical_integral_plot_units_conversion"),
    ],
    references: &[],
};

static MODEL: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Model,
    table: "models",
    fields: &[text("name"), text("description")],
    references: &[required("project_id", EntityKind::Project)],
};

static VARIABLE: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Variable,
    table: "variables",
    fields: &[text("name"), text("description")],
    references: &[required("units_id", EntityKind::Units)],
};

static REGION: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Region,
    table: "regions",
    fields: &[text("name"), text("description")],
    references: &[],
};

static RUN: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Run,
    table: "runs",
    fields: &[
        text("name"),
        text("description"),
        date("start_date"),
        date("end_date"),
        integer("duration"),
        text("input_directory"),
    ],
    references: &[required("model_id", EntityKind::Model)],
};

static CALCULATION: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Calculation,
    table: "calculations",
    fields: &[
        text("input_interval"),
        text("output_interval"),
        text("output_time_type"),
        date("start_date"),
        date("end_date"),
        text("vertical_type"),
        text("file_name"),
    ],
    references: &[
        required("run_id", EntityKind::Run),
        required("variable_id", EntityKind::Variable),
        ReferenceSpec {
            column: "region_id",
            target: EntityKind::Region,
            nullable: true,
        },
    ],
};

impl EntityKind {
    /// Every kind, dependencies before dependents.
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Project,
        EntityKind::Units,
        EntityKind::Model,
        EntityKind::Variable,
        EntityKind::Region,
        EntityKind::Run,
        EntityKind::Calculation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Units => "units",
            Self::Model => "model",
            Self::Variable => "variable",
            Self::Region => "region",
            Self::Run => "run",
            Self::Calculation => "calculation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    pub fn descriptor(self) -> &'static EntityDescriptor {
        match self {
            Self::Project => &PROJECT,
            Self::Units => &UNITS,
            Self::Model => &MODEL,
            Self::Variable => &VARIABLE,
            Self::Region => &REGION,
            Self::Run => &RUN,
            Self::Calculation => &CALCULATION,
        }
    }

    pub fn table(self) -> &'static str {
        self.descriptor().table
    }

    /// Position in dependency order.
    pub fn rank(self) -> usize {
        Self::ALL
            .iter()
            .position(|kind| *kind == self)
            .unwrap_or(Self::ALL.len())
    }

    /// Lists `(referencing kind, reference)` pairs whose foreign key points
    /// at this kind. These are the "is required by" edges.
    pub fn referencers(self) -> Vec<(EntityKind, &'static ReferenceSpec)> {
        Self::ALL
            .iter()
            .flat_map(|kind| {
                kind.descriptor()
                    .references
                    .iter()
                    .filter(move |reference| reference.target == self)
                    .map(move |reference| (*kind, reference))
            })
            .collect()
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
