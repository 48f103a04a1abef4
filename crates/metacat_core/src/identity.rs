//! Identity derivation for catalog objects.
//!
//! # Responsibility
//! - Compute a stable identity per entity kind from identity fields and the
//!   identities of required references.
//!
//! # Invariants
//! - Identities are pure functions of their inputs: no pointer identity, no
//!   process-local state, no metadata fields.
//! - Every encoded value is length-prefixed and every kind is tagged, so
//!   distinct inputs cannot concatenate into the same byte stream.
//! - Identities are lowercase hex SHA-256 digests (64 characters).

use crate::model::{Calculation, EntityKind, Model, Project, Region, Run, Units, Variable};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter};

const IDENTITY_HEX_LEN: usize = 64;

/// Stable identity of a catalog object, stored in each table's `hash` column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Parses a stored identity. Returns `None` unless `value` is 64 lowercase
    /// hex characters.
    pub fn parse(value: &str) -> Option<Self> {
        let well_formed = value.len() == IDENTITY_HEX_LEN
            && value
                .bytes()
                .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte));
        well_formed.then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl TryFrom<String> for Identity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("malformed identity `{value}`"))
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.0
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Incremental identity builder with a canonical, length-prefixed encoding.
struct IdentityHasher {
    inner: Sha256,
}

impl IdentityHasher {
    fn new(kind: EntityKind) -> Self {
        let mut hasher = Self {
            inner: Sha256::new(),
        };
        hasher.write(kind.as_str().as_bytes());
        hasher
    }

    fn write(&mut self, bytes: &[u8]) {
        self.inner.update((bytes.len() as u64).to_le_bytes());
        self.inner.update(bytes);
    }

    fn text(mut self, value: &str) -> Self {
        self.inner.update([1u8]);
        self.write(value.as_bytes());
        self
    }

    fn optional_text(mut self, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.text(value),
            None => {
                self.inner.update([0u8]);
                self
            }
        }
    }

    fn reference(self, identity: &Identity) -> Self {
        self.text(identity.as_str())
    }

    fn optional_reference(self, identity: Option<&Identity>) -> Self {
        self.optional_text(identity.map(Identity::as_str))
    }

    fn finish(self) -> Identity {
        Identity(format!("{:x}", self.inner.finalize()))
    }
}

pub fn project_identity(project: &Project) -> Identity {
    IdentityHasher::new(EntityKind::Project)
        .text(&project.name)
        .finish()
}

pub fn units_identity(units: &Units) -> Identity {
    IdentityHasher::new(EntityKind::Units)
        .text(&units.unit_string)
        .finish()
}

pub fn model_identity(model: &Model) -> Identity {
    IdentityHasher::new(EntityKind::Model)
        .text(&model.name)
        .reference(&project_identity(&model.project))
        .finish()
}

pub fn variable_identity(variable: &Variable) -> Identity {
    IdentityHasher::new(EntityKind::Variable)
        .text(&variable.name)
        .reference(&units_identity(&variable.units))
        .finish()
}

pub fn region_identity(region: &Region) -> Identity {
    IdentityHasher::new(EntityKind::Region)
        .text(&region.name)
        .finish()
}

pub fn run_identity(run: &Run) -> Identity {
    IdentityHasher::new(EntityKind::Run)
        .text(&run.name)
        .reference(&model_identity(&run.model))
        .finish()
}

/// Identity of the output artifact: its file name plus the run, variable and
/// region it is computed from. Calculations writing the same file share it.
pub fn calculation_identity(calc: &Calculation) -> Identity {
    let region = calc.region.as_ref().map(region_identity);
    IdentityHasher::new(EntityKind::Calculation)
        .text(&calc.file_name())
        .reference(&run_identity(&calc.run))
        .reference(&variable_identity(&calc.variable))
        .optional_reference(region.as_ref())
        .finish()
}
