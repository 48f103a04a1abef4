//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the record-store contract used by the catalog engine.
//! - Isolate SQLite query details from resolution and cascade logic.
//!
//! # Invariants
//! - SQL is generated only from static entity descriptors, never from
//!   caller-supplied names.
//! - Constraint violations are reported separately from transport errors so
//!   callers can retry conflicting inserts as lookups.

pub mod record_repo;
