//! Tracking evaluation across an object's ancestor chain.
//!
//! # Invariants
//! - An object is trackable only when its own flag and every ancestor's flag
//!   are set. Ancestors are the transitive required references.
//! - Descendant flags never influence an ancestor's result.
//! - Evaluation is pure and never touches storage.

use crate::model::CatalogObject;

/// Returns whether `obj` may be persisted.
pub fn is_trackable(obj: &dyn CatalogObject) -> bool {
    obj.tracking_flag()
        && obj
            .references()
            .into_iter()
            .filter_map(|(_, target)| target)
            .all(is_trackable)
}

/// Returns the first object in `obj`'s closure, depth-first and dependencies
/// first, whose own flag disables tracking.
pub fn first_untracked(obj: &dyn CatalogObject) -> Option<&dyn CatalogObject> {
    for (_, target) in obj.references() {
        if let Some(found) = target.and_then(first_untracked) {
            return Some(found);
        }
    }
    (!obj.tracking_flag()).then_some(obj)
}
