//! Deletion closure computation and removal.
//!
//! The closure of a record is the record itself plus every persisted record
//! that reaches it through a reference column, followed outward until no new
//! record appears. Nullable references count as required here, so deleting a
//! Region removes the calculations pointing at it.

use super::session::Session;
use super::CatalogResult;
use crate::identity::Identity;
use crate::model::EntityKind;
use crate::repo::record_repo::{RecordId, RecordStore, StoredRecord};
use log::{debug, info};
use std::collections::HashSet;

/// One record removed by a delete operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedRecord {
    pub kind: EntityKind,
    pub id: RecordId,
    pub identity: Identity,
}

/// Records removed by one delete operation, dependents first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub removed: Vec<RemovedRecord>,
}

impl DeleteReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.removed.len()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.removed.iter().filter(|record| record.kind == kind).count()
    }

    pub fn contains(&self, kind: EntityKind, identity: &Identity) -> bool {
        self.removed
            .iter()
            .any(|record| record.kind == kind && &record.identity == identity)
    }
}

impl<S: RecordStore + ?Sized> Session<'_, S> {
    /// Deletes the record with `identity` and its closure.
    ///
    /// A missing record yields an empty report.
    pub fn delete(&mut self, kind: EntityKind, identity: &Identity) -> CatalogResult<DeleteReport> {
        self.stats.queries += 1;
        match self.store.find_by_identity(kind, identity)? {
            Some(root) => self.delete_closure(&root),
            None => {
                info!(
                    "event=catalog_delete module=engine status=noop op_id={} kind={} identity={}",
                    self.op_id(),
                    kind,
                    identity.short()
                );
                Ok(DeleteReport::default())
            }
        }
    }

    /// Collects the deletion closure of `root` without removing anything.
    ///
    /// The result is ordered for removal: higher-ranked kinds first, then
    /// ascending id inside a kind.
    pub fn deletion_closure(&mut self, root: &StoredRecord) -> CatalogResult<Vec<RemovedRecord>> {
        let mut seen: HashSet<(EntityKind, RecordId)> = HashSet::new();
        let mut closure = Vec::new();
        let mut frontier = vec![(root.kind, vec![root.id])];
        seen.insert((root.kind, root.id));
        closure.push(RemovedRecord {
            kind: root.kind,
            id: root.id,
            identity: root.identity.clone(),
        });

        while let Some((kind, ids)) = frontier.pop() {
            for (referencer, reference) in kind.referencers() {
                self.stats.queries += 1;
                let mut discovered = Vec::new();
                for (id, identity) in self.store.referencing(referencer, reference.column, &ids)? {
                    if seen.insert((referencer, id)) {
                        discovered.push(id);
                        closure.push(RemovedRecord {
                            kind: referencer,
                            id,
                            identity,
                        });
                    }
                }
                if !discovered.is_empty() {
                    frontier.push((referencer, discovered));
                }
            }
        }

        closure.sort_by(|left, right| {
            right
                .kind
                .rank()
                .cmp(&left.kind.rank())
                .then(left.id.cmp(&right.id))
        });
        Ok(closure)
    }

    /// Removes `root` and its deletion closure.
    pub fn delete_closure(&mut self, root: &StoredRecord) -> CatalogResult<DeleteReport> {
        let closure = self.deletion_closure(root)?;

        for kind in EntityKind::ALL.iter().rev() {
            let ids: Vec<RecordId> = closure
                .iter()
                .filter(|record| record.kind == *kind)
                .map(|record| record.id)
                .collect();
            if ids.is_empty() {
                continue;
            }
            let removed = self.store.delete_ids(*kind, &ids)?;
            debug!(
                "event=delete_closure module=engine status=ok op_id={} kind={} requested={} removed={}",
                self.op_id(),
                kind,
                ids.len(),
                removed
            );
        }

        Ok(DeleteReport { removed: closure })
    }
}
