//! Assertion helpers for catalog tests.
//!
//! These panic with a descriptive message instead of returning errors.

use crate::model::CatalogObject;
use crate::repo::record_repo::StoredRecord;
use crate::service::catalog::Catalog;

/// Exactly one record exists for `obj`'s identity.
pub fn assert_no_duplicates(catalog: &Catalog, obj: &dyn CatalogObject) {
    let count = catalog
        .count_identity(obj.kind(), &obj.identity())
        .unwrap_or_else(|err| panic!("count {} failed: {err}", obj.kind()));
    assert_eq!(
        count,
        1,
        "{} {} stored {count} times",
        obj.kind(),
        obj.identity().short()
    );
}

/// No record exists for `obj`'s identity.
pub fn assert_not_stored(catalog: &Catalog, obj: &dyn CatalogObject) {
    let found = stored(catalog, obj);
    assert!(
        found.is_none(),
        "{} {} is still stored",
        obj.kind(),
        obj.identity().short()
    );
}

/// The stored value of `field` equals the object's value.
pub fn assert_field_matches(catalog: &Catalog, obj: &dyn CatalogObject, field: &str) {
    let record = expect_stored(catalog, obj);
    let expected = obj
        .field_values()
        .into_iter()
        .find(|(name, _)| *name == field)
        .map(|(_, value)| value)
        .unwrap_or_else(|| panic!("{} has no field `{field}`", obj.kind()));
    assert_eq!(
        record.field(field),
        Some(&expected),
        "{}.{field} differs from stored value",
        obj.kind()
    );
}

/// Every declared field of `obj` and of every object it requires matches
/// the stored records, and the stored references point at those records.
pub fn assert_fields_match_recursive(catalog: &Catalog, obj: &dyn CatalogObject) {
    assert_record_matches(catalog, obj);
}

fn assert_record_matches(catalog: &Catalog, obj: &dyn CatalogObject) -> StoredRecord {
    let record = expect_stored(catalog, obj);
    for (name, expected) in obj.field_values() {
        assert_eq!(
            record.field(name),
            Some(&expected),
            "{}.{name} differs from stored value",
            obj.kind()
        );
    }
    for (column, target) in obj.references() {
        let expected_id = target.map(|dependency| assert_record_matches(catalog, dependency).id);
        assert_eq!(
            record.reference(column),
            expected_id,
            "{}.{column} points at the wrong record",
            obj.kind()
        );
    }
    record
}

fn stored(catalog: &Catalog, obj: &dyn CatalogObject) -> Option<StoredRecord> {
    catalog
        .find(obj)
        .unwrap_or_else(|err| panic!("lookup of {} failed: {err}", obj.kind()))
}

fn expect_stored(catalog: &Catalog, obj: &dyn CatalogObject) -> StoredRecord {
    stored(catalog, obj)
        .unwrap_or_else(|| panic!("{} {} is not stored", obj.kind(), obj.identity().short()))
}
