mod common;

use common::{date, scenario};
use metacat_core::testing::{
    assert_field_matches, assert_fields_match_recursive, assert_no_duplicates,
};
use metacat_core::{Catalog, CatalogObject, EntityKind, FieldValue, Units, Variable};

#[test]
fn adding_twice_keeps_one_record() {
    let catalog = Catalog::open_in_memory().unwrap();
    let s = scenario();

    let first = catalog.add(&s.project).unwrap();
    let second = catalog.add(&s.project).unwrap();

    assert_eq!(first.id, second.id);
    assert_no_duplicates(&catalog, &s.project);
    assert_eq!(catalog.count(EntityKind::Project).unwrap(), 1);
}

#[test]
fn unchanged_resubmission_writes_nothing() {
    let catalog = Catalog::open_in_memory().unwrap();
    let s = scenario();
    catalog.add(&s.calc).unwrap();

    let (_, stats) = catalog.add_with_stats(&s.calc).unwrap();

    assert_eq!(stats.queries, 1);
    assert_eq!(stats.inserts, 0);
    assert_eq!(stats.refreshes, 0);
}

#[test]
fn changed_metadata_is_refreshed_in_place() {
    let catalog = Catalog::open_in_memory().unwrap();
    let mut s = scenario();
    let original = catalog.add(&s.project).unwrap();

    s.project.output_directory = "/archive/relocated/aero_3agcm/".to_string();
    let (refreshed, stats) = catalog.add_with_stats(&s.project).unwrap();

    assert_eq!(refreshed.id, original.id);
    assert_eq!(stats.refreshes, 1);
    assert_no_duplicates(&catalog, &s.project);
    assert_field_matches(&catalog, &s.project, "output_directory");
}

#[test]
fn changed_identity_field_creates_new_record() {
    let catalog = Catalog::open_in_memory().unwrap();
    let mut s = scenario();
    let original = catalog.add(&s.project).unwrap();

    s.project.name = "aero_3agcm_v2".to_string();
    let renamed = catalog.add(&s.project).unwrap();

    assert_ne!(renamed.id, original.id);
    assert_ne!(renamed.identity, original.identity);
    assert_eq!(catalog.count(EntityKind::Project).unwrap(), 2);
}

#[test]
fn calculation_chain_is_stored_with_matching_fields() {
    let catalog = Catalog::open_in_memory().unwrap();
    let s = scenario();

    let record = catalog.add(&s.calc).unwrap();

    assert_fields_match_recursive(&catalog, &s.calc);
    assert_eq!(
        record.field("file_name"),
        Some(&FieldValue::Text(s.calc.file_name()))
    );
    for obj in [
        &s.project as &dyn CatalogObject,
        &s.model,
        &s.run,
        &s.units,
        &s.variable,
        &s.region,
    ] {
        assert_no_duplicates(&catalog, obj);
    }
}

#[test]
fn add_many_resolves_shared_parents_once() {
    let catalog = Catalog::open_in_memory().unwrap();
    let s = scenario();
    let precip = Variable::new("precip", "Total precipitation", Units::new("kg m$^{-2}$ s$^{-1}$"));
    let mut other = s.calc.clone();
    other.variable = precip;

    let (records, stats) = catalog.add_many(&[&s.calc, &other]).unwrap();

    assert_eq!(records.len(), 2);
    assert_ne!(records[0].id, records[1].id);
    assert_eq!(records[0].reference("run_id"), records[1].reference("run_id"));
    assert_eq!(stats.inserts, 10);
    assert_eq!(catalog.count(EntityKind::Run).unwrap(), 1);
    assert_eq!(catalog.count(EntityKind::Variable).unwrap(), 2);
    assert_eq!(catalog.count(EntityKind::Units).unwrap(), 2);
}

#[test]
fn add_many_later_objects_win_metadata() {
    let catalog = Catalog::open_in_memory().unwrap();
    let s = scenario();
    let mut updated = s.region.clone();
    updated.description = "Whole globe".to_string();

    let (records, stats) = catalog.add_many(&[&s.region, &updated]).unwrap();

    assert_eq!(records[0].id, records[1].id);
    assert_eq!(stats.inserts, 1);
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.refreshes, 1);
    assert_field_matches(&catalog, &updated, "description");
}

#[test]
fn add_many_rejects_untracked_member_before_writing() {
    let catalog = Catalog::open_in_memory().unwrap();
    let s = scenario();
    let mut untracked = s.region.clone();
    untracked.name = "tropics".to_string();
    untracked.trackable = false;

    let err = catalog.add_many(&[&s.calc, &untracked]).unwrap_err();

    assert!(err.is_not_tracked());
    for (kind, count) in catalog.counts().unwrap() {
        assert_eq!(count, 0, "{kind}");
    }
}

#[test]
fn records_survive_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = metacat_core::CatalogConfig::new(dir.path().join("catalog.sqlite3"));
    let s = scenario();

    let stored = Catalog::open(&config).unwrap().add(&s.calc).unwrap();
    let reopened = Catalog::open(&config).unwrap();

    assert_eq!(reopened.find(&s.calc).unwrap(), Some(stored));
    let dependencies = reopened
        .load_dependencies(&reopened.find(&s.calc.run).unwrap().unwrap())
        .unwrap();
    assert_eq!(dependencies.len(), 1);
    assert_eq!(dependencies[0].identity, s.model.identity());
}

#[test]
fn calculations_naming_one_artifact_are_stored_once() {
    let catalog = Catalog::open_in_memory().unwrap();
    let s = scenario();
    let mut lower = s.calc.clone();
    lower.output_interval = "djf".to_string();
    let mut upper = lower.clone();
    upper.output_interval = "DJF".to_string();
    let mut mid_year = lower.clone();
    mid_year.start_date = date(1983, 6, 1);

    let first = catalog.add(&lower).unwrap();
    let second = catalog.add(&upper).unwrap();
    let third = catalog.add(&mid_year).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.id, third.id);
    assert_eq!(catalog.count(EntityKind::Calculation).unwrap(), 1);
    assert_field_matches(&catalog, &mid_year, "start_date");
}
