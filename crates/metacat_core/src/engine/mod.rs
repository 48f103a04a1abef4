//! Identity-resolution, session caching and cascading-delete engine.
//!
//! # Responsibility
//! - Resolve domain objects into canonical persisted records, dependencies
//!   first.
//! - Expand and remove deletion closures along "is required by" edges.
//! - Report failures with a taxonomy that separates tracking policy from
//!   store failures.
//!
//! # Invariants
//! - All work of one operation runs against one [`Session`] whose cache is
//!   never shared or reused.
//! - The engine itself never commits; the caller owns the transaction.

pub mod cascade;
pub mod resolve;
pub mod session;

use crate::db::DbError;
use crate::identity::Identity;
use crate::model::EntityKind;
use crate::repo::record_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use cascade::{DeleteReport, RemovedRecord};
pub use session::{Session, SessionCache, SessionStats};

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors surfaced by catalog operations.
#[derive(Debug)]
pub enum CatalogError {
    /// Tracking is disabled on the object or one of its ancestors.
    NotTrackable {
        kind: EntityKind,
        identity: Identity,
    },
    /// An insert hit a uniqueness/foreign-key constraint and the record could
    /// not be found on re-read.
    IntegrityConflict {
        kind: EntityKind,
        identity: Identity,
    },
    /// The backing store failed; nothing from the operation was committed.
    StoreUnavailable(RepoError),
    /// A required reference failed to resolve.
    DependencyResolution {
        dependent: EntityKind,
        source: Box<CatalogError>,
    },
    /// Submitted or persisted data does not fit the entity descriptors.
    InvalidData(RepoError),
    /// Catalog configuration could not be loaded or applied.
    Config(String),
}

impl CatalogError {
    /// Returns the innermost error of a dependency chain.
    pub fn root_cause(&self) -> &CatalogError {
        let mut current = self;
        while let Self::DependencyResolution { source, .. } = current {
            current = source.as_ref();
        }
        current
    }

    /// Whether the failure is a tracking policy decision rather than an
    /// infrastructure problem.
    pub fn is_not_tracked(&self) -> bool {
        matches!(self.root_cause(), Self::NotTrackable { .. })
    }

    /// Whether retrying the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::StoreUnavailable(_) | Self::IntegrityConflict { .. }
        )
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotTrackable { kind, identity } => {
                write!(f, "{kind} {} is not set to be tracked", identity.short())
            }
            Self::IntegrityConflict { kind, identity } => write!(
                f,
                "{kind} {} conflicted on insert and was not found on re-read",
                identity.short()
            ),
            Self::StoreUnavailable(err) => write!(f, "catalog store failure: {err}"),
            Self::DependencyResolution { dependent, source } => {
                write!(f, "failed to resolve dependency of {dependent}: {source}")
            }
            Self::InvalidData(err) => write!(f, "{err}"),
            Self::Config(message) => write!(f, "invalid catalog configuration: {message}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotTrackable { .. } => None,
            Self::IntegrityConflict { .. } => None,
            Self::StoreUnavailable(err) => Some(err),
            Self::DependencyResolution { source, .. } => Some(source.as_ref()),
            Self::InvalidData(err) => Some(err),
            Self::Config(_) => None,
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InvalidData(_)
            | RepoError::Rejected(_)
            | RepoError::MissingReference { .. }
            | RepoError::NotFound { .. } => Self::InvalidData(value),
            _ => Self::StoreUnavailable(value),
        }
    }
}

impl From<DbError> for CatalogError {
    fn from(value: DbError) -> Self {
        Self::StoreUnavailable(RepoError::Db(value))
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(value: rusqlite::Error) -> Self {
        RepoError::from(value).into()
    }
}
