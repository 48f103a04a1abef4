//! Per-operation session state: record cache and statistics.
//!
//! # Responsibility
//! - Deduplicate lookups and inserts of the same identity within one
//!   operation.
//! - Carry the operation id used to correlate log lines.
//!
//! # Invariants
//! - A session lives for exactly one `add`/`delete` call and is dropped with
//!   it; nothing in it survives into another operation.
//! - At most one record is cached per `(kind, identity)`.

use crate::identity::Identity;
use crate::model::EntityKind;
use crate::repo::record_repo::{RecordStore, StoredRecord};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store traffic and cache behaviour observed during one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Identity lookups sent to the store.
    pub queries: u32,
    pub inserts: u32,
    /// Metadata updates written to the store.
    pub refreshes: u32,
    pub cache_hits: u32,
    /// Inserts that hit a constraint and were retried as lookups.
    pub conflicts_retried: u32,
}

impl Display for SessionStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "queries={} inserts={} refreshes={} cache_hits={} conflicts_retried={}",
            self.queries, self.inserts, self.refreshes, self.cache_hits, self.conflicts_retried
        )
    }
}

/// Map from `(kind, identity)` to the record resolved in this session.
#[derive(Debug, Default)]
pub struct SessionCache {
    entries: HashMap<(EntityKind, Identity), StoredRecord>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: EntityKind, identity: &Identity) -> Option<&StoredRecord> {
        self.entries.get(&(kind, identity.clone()))
    }

    pub fn get_mut(&mut self, kind: EntityKind, identity: &Identity) -> Option<&mut StoredRecord> {
        self.entries.get_mut(&(kind, identity.clone()))
    }

    /// Caches `record` under its own kind and identity, replacing any
    /// previous entry.
    pub fn put(&mut self, record: StoredRecord) {
        self.entries
            .insert((record.kind, record.identity.clone()), record);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Scope of one catalog operation over a record store.
pub struct Session<'s, S: RecordStore + ?Sized> {
    pub(crate) store: &'s S,
    pub(crate) cache: SessionCache,
    pub(crate) stats: SessionStats,
    op_id: Uuid,
}

impl<'s, S: RecordStore + ?Sized> Session<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self::with_op_id(store, Uuid::new_v4())
    }

    /// Starts a session whose log lines carry a caller-chosen operation id.
    pub fn with_op_id(store: &'s S, op_id: Uuid) -> Self {
        Self {
            store,
            cache: SessionCache::new(),
            stats: SessionStats::default(),
            op_id,
        }
    }

    pub fn op_id(&self) -> Uuid {
        self.op_id
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    pub fn store(&self) -> &'s S {
        self.store
    }
}
