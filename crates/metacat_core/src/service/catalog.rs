//! Catalog entry points: add, delete and inspection.
//!
//! # Responsibility
//! - Run every add/delete inside one immediate transaction with a fresh
//!   session.
//! - Reject untracked objects before any store work.
//! - Emit one start and one terminal log event per operation.
//!
//! # Invariants
//! - A failed operation leaves no partial state; the transaction rolls back
//!   on drop.
//! - Sessions never outlive the operation that created them.

use crate::config::CatalogConfig;
use crate::db::{open_db_in_memory, open_db_with_timeout};
use crate::engine::{CatalogError, CatalogResult, DeleteReport, Session, SessionStats};
use crate::identity::Identity;
use crate::logging::init_from_config;
use crate::model::{CatalogObject, EntityKind};
use crate::repo::record_repo::{
    ensure_catalog_schema, RecordId, RecordStore, RepoError, SqliteRecordStore, StoredRecord,
};
use crate::tracking::{first_untracked, is_trackable};
use log::{error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Instant;
use uuid::Uuid;

/// Catalog handle owning one SQLite connection.
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> CatalogResult<Self> {
        ensure_catalog_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Opens the catalog named by `config`, in memory when it has no
    /// `db_path`. Starts file logging first when `log_dir` is set.
    pub fn open(config: &CatalogConfig) -> CatalogResult<Self> {
        init_from_config(config).map_err(CatalogError::Config)?;
        let conn = match &config.db_path {
            Some(path) => open_db_with_timeout(path, config.busy_timeout())?,
            None => open_db_in_memory()?,
        };
        Self::new(conn)
    }

    pub fn open_in_memory() -> CatalogResult<Self> {
        Self::new(open_db_in_memory()?)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn is_trackable(&self, obj: &dyn CatalogObject) -> bool {
        is_trackable(obj)
    }

    /// Persists `obj` and its required references, returning its record.
    ///
    /// # Errors
    /// - `NotTrackable` when `obj` or an ancestor has tracking disabled.
    /// - Any resolution failure; nothing is committed in that case.
    pub fn add(&self, obj: &dyn CatalogObject) -> CatalogResult<StoredRecord> {
        self.add_with_stats(obj).map(|(record, _)| record)
    }

    /// Like [`Catalog::add`], also returning the session counters.
    pub fn add_with_stats(
        &self,
        obj: &dyn CatalogObject,
    ) -> CatalogResult<(StoredRecord, SessionStats)> {
        ensure_trackable(obj)?;
        let kind = obj.kind();
        let identity = obj.identity();
        self.run_operation("catalog_add", kind, &identity, |session| session.resolve(obj))
    }

    /// Persists a batch in one session and one transaction.
    ///
    /// Shared parents are resolved once. A failure anywhere rolls back the
    /// whole batch.
    pub fn add_many(
        &self,
        objects: &[&dyn CatalogObject],
    ) -> CatalogResult<(Vec<StoredRecord>, SessionStats)> {
        for obj in objects {
            ensure_trackable(*obj)?;
        }

        let op_id = Uuid::new_v4();
        let started_at = Instant::now();
        info!(
            "event=catalog_add_many module=service status=start op_id={} objects={}",
            op_id,
            objects.len()
        );

        let result = self.in_transaction(op_id, |session| session.resolve_all(objects));
        match &result {
            Ok((records, stats)) => info!(
                "event=catalog_add_many module=service status=ok op_id={} records={} duration_ms={} {}",
                op_id,
                records.len(),
                started_at.elapsed().as_millis(),
                stats
            ),
            Err(err) => error!(
                "event=catalog_add_many module=service status=error op_id={} duration_ms={} error={}",
                op_id,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    /// Removes the record for `obj` and its deletion closure.
    ///
    /// Deleting an object that was never stored succeeds with an empty
    /// report.
    pub fn delete(&self, obj: &dyn CatalogObject) -> CatalogResult<DeleteReport> {
        let kind = obj.kind();
        let identity = obj.identity();
        self.delete_identity(kind, &identity)
    }

    pub fn delete_identity(&self, kind: EntityKind, identity: &Identity) -> CatalogResult<DeleteReport> {
        self.run_operation("catalog_delete", kind, identity, |session| {
            session.delete(kind, identity)
        })
        .map(|(report, _)| report)
    }

    /// Read-only lookup by identity.
    pub fn query(&self, kind: EntityKind, identity: &Identity) -> CatalogResult<Option<StoredRecord>> {
        Ok(self.store().find_by_identity(kind, identity)?)
    }

    /// Looks up the stored record for `obj` without writing anything.
    pub fn find(&self, obj: &dyn CatalogObject) -> CatalogResult<Option<StoredRecord>> {
        self.query(obj.kind(), &obj.identity())
    }

    pub fn get(&self, kind: EntityKind, id: RecordId) -> CatalogResult<Option<StoredRecord>> {
        Ok(self.store().find_by_id(kind, id)?)
    }

    pub fn count(&self, kind: EntityKind) -> CatalogResult<u64> {
        Ok(self.store().count(kind)?)
    }

    /// Number of stored records carrying `identity`; at most one.
    pub fn count_identity(&self, kind: EntityKind, identity: &Identity) -> CatalogResult<u64> {
        Ok(self.store().count_by_identity(kind, identity)?)
    }

    /// Per-kind record counts in dependency order.
    pub fn counts(&self) -> CatalogResult<Vec<(EntityKind, u64)>> {
        EntityKind::ALL
            .iter()
            .map(|kind| Ok((*kind, self.count(*kind)?)))
            .collect()
    }

    /// Loads the records referenced by `record`, in reference declaration
    /// order. Unset nullable references are skipped.
    pub fn load_dependencies(&self, record: &StoredRecord) -> CatalogResult<Vec<StoredRecord>> {
        let store = self.store();
        let descriptor = record.kind.descriptor();
        let mut dependencies = Vec::new();
        for (column, target_id) in &record.references {
            let Some(target_id) = target_id else {
                continue;
            };
            let reference = descriptor.reference(column).ok_or(RepoError::MissingReference {
                kind: record.kind,
                column: *column,
            })?;
            let dependency = store
                .find_by_id(reference.target, *target_id)?
                .ok_or(RepoError::NotFound {
                    kind: reference.target,
                    id: *target_id,
                })?;
            dependencies.push(dependency);
        }
        Ok(dependencies)
    }

    fn store(&self) -> SqliteRecordStore<'_> {
        SqliteRecordStore::new(&self.conn)
    }

    fn run_operation<T>(
        &self,
        event: &'static str,
        kind: EntityKind,
        identity: &Identity,
        op: impl FnOnce(&mut Session<'_, SqliteRecordStore<'_>>) -> CatalogResult<T>,
    ) -> CatalogResult<(T, SessionStats)> {
        let op_id = Uuid::new_v4();
        let started_at = Instant::now();
        info!(
            "event={} module=service status=start op_id={} kind={} identity={}",
            event,
            op_id,
            kind,
            identity.short()
        );

        let result = self.in_transaction(op_id, op);
        match &result {
            Ok((_, stats)) => info!(
                "event={} module=service status=ok op_id={} kind={} identity={} duration_ms={} {}",
                event,
                op_id,
                kind,
                identity.short(),
                started_at.elapsed().as_millis(),
                stats
            ),
            Err(err) => error!(
                "event={} module=service status=error op_id={} kind={} identity={} duration_ms={} error={}",
                event,
                op_id,
                kind,
                identity.short(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn in_transaction<T>(
        &self,
        op_id: Uuid,
        op: impl FnOnce(&mut Session<'_, SqliteRecordStore<'_>>) -> CatalogResult<T>,
    ) -> CatalogResult<(T, SessionStats)> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let outcome = {
            let store = SqliteRecordStore::new(&tx);
            let mut session = Session::with_op_id(&store, op_id);
            let value = op(&mut session)?;
            (value, session.stats())
        };
        tx.commit()?;
        Ok(outcome)
    }
}

fn ensure_trackable(obj: &dyn CatalogObject) -> CatalogResult<()> {
    if is_trackable(obj) {
        return Ok(());
    }
    let identity = obj.identity();
    if let Some(culprit) = first_untracked(obj) {
        warn!(
            "event=catalog_add module=service status=not_tracked kind={} identity={} disabled_on={}",
            obj.kind(),
            identity.short(),
            culprit.kind()
        );
    }
    Err(CatalogError::NotTrackable {
        kind: obj.kind(),
        identity,
    })
}
