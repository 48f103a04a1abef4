//! Identity resolution ("as-unique") of domain objects into records.
//!
//! # Responsibility
//! - Return the canonical record for an object, creating it and its
//!   required references when absent.
//! - Refresh declared fields of existing records from the submitted object.
//!
//! # Invariants
//! - Required references are resolved before the dependent record is
//!   inserted.
//! - Within one session an identity is queried at most once and inserted at
//!   most once.
//! - An insert that hits the identity uniqueness constraint is retried as a
//!   lookup, never as a second insert. Other constraint failures abort.

use super::session::Session;
use super::{CatalogError, CatalogResult};
use crate::model::{CatalogObject, FieldValues};
use crate::repo::record_repo::{RecordStore, RepoError, StoredRecord};
use crate::tracking::is_trackable;
use log::{debug, warn};

impl<S: RecordStore + ?Sized> Session<'_, S> {
    /// Resolves `obj` to its persisted record.
    ///
    /// # Errors
    /// - `NotTrackable` when tracking is disabled on `obj` or an ancestor.
    /// - `DependencyResolution` wrapping the failure of a required reference.
    /// - `IntegrityConflict` when an insert hits a uniqueness violation and
    ///   re-read finds nothing.
    /// - `InvalidData` when the store rejects the write on any other
    ///   constraint.
    /// - `StoreUnavailable` / `InvalidData` from the store.
    pub fn resolve(&mut self, obj: &dyn CatalogObject) -> CatalogResult<StoredRecord> {
        let op_id = self.op_id();
        let kind = obj.kind();
        let identity = obj.identity();
        if !is_trackable(obj) {
            return Err(CatalogError::NotTrackable { kind, identity });
        }
        let fields = obj.field_values();

        if let Some(cached) = self.cache.get_mut(kind, &identity) {
            self.stats.cache_hits += 1;
            if cached.fields != fields {
                self.store.update_fields(kind, cached.id, &fields)?;
                cached.fields = fields;
                self.stats.refreshes += 1;
                debug!(
                    "event=record_refresh module=engine status=ok op_id={} kind={} id={} source=cache",
                    op_id,
                    kind,
                    cached.id
                );
            }
            return Ok(cached.clone());
        }

        self.stats.queries += 1;
        if let Some(existing) = self.store.find_by_identity(kind, &identity)? {
            return self.adopt(existing, fields);
        }

        let mut references = Vec::new();
        for (column, target) in obj.references() {
            let id = match target {
                Some(dependency) => {
                    let record = self.resolve(dependency).map_err(|err| {
                        CatalogError::DependencyResolution {
                            dependent: kind,
                            source: Box::new(err),
                        }
                    })?;
                    Some(record.id)
                }
                None => None,
            };
            references.push((column, id));
        }

        match self.store.insert(kind, &identity, &fields, &references) {
            Ok(record) => {
                self.stats.inserts += 1;
                debug!(
                    "event=record_insert module=engine status=ok op_id={} kind={} id={} identity={}",
                    op_id,
                    kind,
                    record.id,
                    identity.short()
                );
                self.cache.put(record.clone());
                Ok(record)
            }
            Err(RepoError::Constraint(err)) => {
                self.stats.conflicts_retried += 1;
                warn!(
                    "event=integrity_conflict_retry module=engine status=retry op_id={} kind={} identity={} error={}",
                    op_id,
                    kind,
                    identity.short(),
                    err
                );
                self.stats.queries += 1;
                match self.store.find_by_identity(kind, &identity)? {
                    Some(existing) => self.adopt(existing, fields),
                    None => Err(CatalogError::IntegrityConflict { kind, identity }),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Resolves several objects in order within this session.
    pub fn resolve_all(&mut self, objects: &[&dyn CatalogObject]) -> CatalogResult<Vec<StoredRecord>> {
        objects.iter().map(|obj| self.resolve(*obj)).collect()
    }

    /// Refreshes an already persisted record from `fields` and caches it.
    fn adopt(&mut self, mut record: StoredRecord, fields: FieldValues) -> CatalogResult<StoredRecord> {
        if record.fields != fields {
            self.store.update_fields(record.kind, record.id, &fields)?;
            record.fields = fields;
            self.stats.refreshes += 1;
            debug!(
                "event=record_refresh module=engine status=ok op_id={} kind={} id={} source=store",
                self.op_id(),
                record.kind,
                record.id
            );
        }
        self.cache.put(record.clone());
        Ok(record)
    }
}
