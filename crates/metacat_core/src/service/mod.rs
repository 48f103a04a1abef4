//! Catalog use-case services.
//!
//! # Responsibility
//! - Own the catalog connection and the transaction around every operation.
//! - Keep callers decoupled from sessions and store adapters.

pub mod catalog;
