//! Core of the metacat metadata catalog.
//!
//! Resolves domain objects (projects, models, runs, variables, units,
//! regions, calculations) to unique persisted records, refreshes their
//! metadata and deletes them together with everything that depends on them.

pub mod config;
pub mod db;
pub mod engine;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod testing;
pub mod tracking;

pub use config::CatalogConfig;
pub use engine::{CatalogError, CatalogResult, DeleteReport, RemovedRecord, SessionStats};
pub use identity::Identity;
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::{
    Calculation, CatalogObject, EnsembleMember, EntityKind, FieldValue, Model, Project, Region,
    Run, Units, Variable,
};
pub use repo::record_repo::{RecordId, RecordStore, RepoError, StoredRecord};
pub use service::catalog::Catalog;
pub use tracking::is_trackable;

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
