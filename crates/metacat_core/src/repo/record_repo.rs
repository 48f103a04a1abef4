//! Record store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide lookup, insert, refresh and delete primitives over the
//!   per-kind catalog tables.
//! - Decode rows into generic [`StoredRecord`] values using the kind's
//!   descriptor.
//!
//! # Invariants
//! - Inserts reject a missing non-nullable reference before touching SQL.
//! - Read paths reject malformed persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::identity::Identity;
use crate::model::{EntityDescriptor, EntityKind, FieldType, FieldValue, FieldValues};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{ffi, params_from_iter, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Row id of a persisted record within its kind's table.
pub type RecordId = i64;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from record store operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Uniqueness violation, typically a concurrent insert of one identity.
    Constraint(rusqlite::Error),
    /// Foreign-key, check or trigger constraint rejected the write.
    Rejected(rusqlite::Error),
    /// Target record does not exist.
    NotFound { kind: EntityKind, id: RecordId },
    /// A required reference was not supplied for insert.
    MissingReference {
        kind: EntityKind,
        column: &'static str,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted or submitted data does not fit the kind's descriptor.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Constraint(err) => write!(f, "constraint violation: {err}"),
            Self::Rejected(err) => write!(f, "write rejected by store: {err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} record not found: {id}"),
            Self::MissingReference { kind, column } => {
                write!(f, "{kind} record requires reference `{column}`")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "record store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "record store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "record store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid record data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Constraint(err) => Some(err),
            Self::Rejected(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::MissingReference { .. } => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) if is_unique_violation(&value) => {
                Self::Constraint(value)
            }
            Some(ErrorCode::ConstraintViolation) => Self::Rejected(value),
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Persisted catalog record of any kind.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: RecordId,
    pub kind: EntityKind,
    pub identity: Identity,
    /// Declared field values in descriptor order.
    pub fields: FieldValues,
    /// Foreign keys in descriptor order; `None` only for nullable references.
    pub references: Vec<(&'static str, Option<RecordId>)>,
}

impl StoredRecord {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    /// Returns the referenced row id, or `None` when the column is unset or
    /// not declared for this kind.
    pub fn reference(&self, column: &str) -> Option<RecordId> {
        self.references
            .iter()
            .find(|(name, _)| *name == column)
            .and_then(|(_, id)| *id)
    }
}

/// Repository interface for catalog records.
pub trait RecordStore {
    /// Loads the record of `kind` with `identity`, if present.
    fn find_by_identity(
        &self,
        kind: EntityKind,
        identity: &Identity,
    ) -> RepoResult<Option<StoredRecord>>;
    /// Loads the record of `kind` with row id `id`, if present.
    fn find_by_id(&self, kind: EntityKind, id: RecordId) -> RepoResult<Option<StoredRecord>>;
    /// Counts records of `kind` carrying `identity`.
    fn count_by_identity(&self, kind: EntityKind, identity: &Identity) -> RepoResult<u64>;
    /// Counts all records of `kind`.
    fn count(&self, kind: EntityKind) -> RepoResult<u64>;
    /// Inserts one record and returns it with its new row id.
    fn insert(
        &self,
        kind: EntityKind,
        identity: &Identity,
        fields: &[(&'static str, FieldValue)],
        references: &[(&'static str, Option<RecordId>)],
    ) -> RepoResult<StoredRecord>;
    /// Overwrites every declared field of one record.
    fn update_fields(
        &self,
        kind: EntityKind,
        id: RecordId,
        fields: &[(&'static str, FieldValue)],
    ) -> RepoResult<()>;
    /// Lists `(id, identity)` of `kind` records whose `column` points at any
    /// of `target_ids`.
    fn referencing(
        &self,
        kind: EntityKind,
        column: &'static str,
        target_ids: &[RecordId],
    ) -> RepoResult<Vec<(RecordId, Identity)>>;
    /// Deletes records of `kind` by row id and returns the removed row count.
    fn delete_ids(&self, kind: EntityKind, ids: &[RecordId]) -> RepoResult<usize>;
}

/// SQLite-backed record store. Works on a plain connection or a transaction.
pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordStore<'conn> {
    /// Creates a store without schema checks. Callers must have validated
    /// the connection with [`ensure_catalog_schema`].
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates a store after checking schema version, tables and columns.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_catalog_schema(conn)?;
        Ok(Self { conn })
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn find_by_identity(
        &self,
        kind: EntityKind,
        identity: &Identity,
    ) -> RepoResult<Option<StoredRecord>> {
        let descriptor = kind.descriptor();
        let sql = format!("{} WHERE hash = ?1;", select_sql(descriptor));
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let mut rows = stmt.query([identity.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(descriptor, row)?));
        }
        Ok(None)
    }

    fn find_by_id(&self, kind: EntityKind, id: RecordId) -> RepoResult<Option<StoredRecord>> {
        let descriptor = kind.descriptor();
        let sql = format!("{} WHERE id = ?1;", select_sql(descriptor));
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(descriptor, row)?));
        }
        Ok(None)
    }

    fn count_by_identity(&self, kind: EntityKind, identity: &Identity) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE hash = ?1;", kind.table()),
            [identity.as_str()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn count(&self, kind: EntityKind) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {};", kind.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn insert(
        &self,
        kind: EntityKind,
        identity: &Identity,
        fields: &[(&'static str, FieldValue)],
        references: &[(&'static str, Option<RecordId>)],
    ) -> RepoResult<StoredRecord> {
        let descriptor = kind.descriptor();
        let fields = ordered_fields(descriptor, fields)?;

        let mut ordered_references = Vec::with_capacity(descriptor.references.len());
        for reference in descriptor.references {
            let id = references
                .iter()
                .find(|(column, _)| *column == reference.column)
                .and_then(|(_, id)| *id);
            if id.is_none() && !reference.nullable {
                return Err(RepoError::MissingReference {
                    kind,
                    column: reference.column,
                });
            }
            ordered_references.push((reference.column, id));
        }

        let mut columns = vec!["hash"];
        columns.extend(descriptor.fields.iter().map(|field| field.name));
        columns.extend(descriptor.references.iter().map(|reference| reference.column));
        let placeholders = (1..=columns.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders});",
            descriptor.table,
            columns.join(", ")
        );

        let mut bind_values: Vec<Value> = Vec::with_capacity(columns.len());
        bind_values.push(Value::Text(identity.as_str().to_string()));
        bind_values.extend(fields.iter().map(|(_, value)| value.to_sql_value()));
        bind_values.extend(
            ordered_references
                .iter()
                .map(|(_, id)| id.map_or(Value::Null, Value::Integer)),
        );

        self.conn
            .prepare_cached(&sql)?
            .execute(params_from_iter(bind_values))?;

        Ok(StoredRecord {
            id: self.conn.last_insert_rowid(),
            kind,
            identity: identity.clone(),
            fields,
            references: ordered_references,
        })
    }

    fn update_fields(
        &self,
        kind: EntityKind,
        id: RecordId,
        fields: &[(&'static str, FieldValue)],
    ) -> RepoResult<()> {
        let descriptor = kind.descriptor();
        let fields = ordered_fields(descriptor, fields)?;

        let assignments = descriptor
            .fields
            .iter()
            .enumerate()
            .map(|(index, field)| format!("{} = ?{}", field.name, index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {}
             SET {assignments},
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?{};",
            descriptor.table,
            descriptor.fields.len() + 1
        );

        let mut bind_values: Vec<Value> = fields
            .iter()
            .map(|(_, value)| value.to_sql_value())
            .collect();
        bind_values.push(Value::Integer(id));

        let changed = self
            .conn
            .prepare_cached(&sql)?
            .execute(params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound { kind, id });
        }
        Ok(())
    }

    fn referencing(
        &self,
        kind: EntityKind,
        column: &'static str,
        target_ids: &[RecordId],
    ) -> RepoResult<Vec<(RecordId, Identity)>> {
        let descriptor = kind.descriptor();
        if descriptor.reference(column).is_none() {
            return Err(RepoError::InvalidData(format!(
                "`{column}` is not a reference of {kind}"
            )));
        }

        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT id, hash
             FROM {}
             WHERE {column} = ?1
             ORDER BY id ASC;",
            descriptor.table
        ))?;

        let mut result = Vec::new();
        for target_id in target_ids {
            let mut rows = stmt.query([target_id])?;
            while let Some(row) = rows.next()? {
                let id: RecordId = row.get(0)?;
                let hash: String = row.get(1)?;
                result.push((id, parse_identity(&hash, descriptor.table)?));
            }
        }
        Ok(result)
    }

    fn delete_ids(&self, kind: EntityKind, ids: &[RecordId]) -> RepoResult<usize> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("DELETE FROM {} WHERE id = ?1;", kind.table()))?;
        let mut removed = 0;
        for id in ids {
            removed += stmt.execute([id])?;
        }
        Ok(removed)
    }
}

/// Checks that `conn` carries the migrated catalog schema.
pub fn ensure_catalog_schema(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for kind in EntityKind::ALL {
        let descriptor = kind.descriptor();
        if !table_exists(conn, descriptor.table)? {
            return Err(RepoError::MissingRequiredTable(descriptor.table));
        }

        let columns = ["id", "hash"]
            .into_iter()
            .chain(descriptor.fields.iter().map(|field| field.name))
            .chain(descriptor.references.iter().map(|reference| reference.column));
        for column in columns {
            if !table_has_column(conn, descriptor.table, column)? {
                return Err(RepoError::MissingRequiredColumn {
                    table: descriptor.table,
                    column,
                });
            }
        }
    }

    Ok(())
}

fn select_sql(descriptor: &EntityDescriptor) -> String {
    let mut columns = vec!["id", "hash"];
    columns.extend(descriptor.fields.iter().map(|field| field.name));
    columns.extend(descriptor.references.iter().map(|reference| reference.column));
    format!("SELECT {} FROM {}", columns.join(", "), descriptor.table)
}

/// Reorders submitted fields into descriptor order, rejecting missing or
/// undeclared names.
fn ordered_fields(
    descriptor: &EntityDescriptor,
    fields: &[(&'static str, FieldValue)],
) -> RepoResult<FieldValues> {
    if let Some((name, _)) = fields
        .iter()
        .find(|(name, _)| descriptor.field(name).is_none())
    {
        return Err(RepoError::InvalidData(format!(
            "`{name}` is not a declared field of {}",
            descriptor.kind
        )));
    }

    descriptor
        .fields
        .iter()
        .map(|spec| {
            fields
                .iter()
                .find(|(name, _)| *name == spec.name)
                .map(|(_, value)| (spec.name, value.clone()))
                .ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "missing field `{}` for {}",
                        spec.name, descriptor.kind
                    ))
                })
        })
        .collect()
}

fn parse_record_row(descriptor: &EntityDescriptor, row: &Row<'_>) -> RepoResult<StoredRecord> {
    let hash: String = row.get("hash")?;
    let identity = parse_identity(&hash, descriptor.table)?;

    let mut fields = Vec::with_capacity(descriptor.fields.len());
    for spec in descriptor.fields {
        let value: FieldValue = match spec.ty {
            FieldType::Text => row.get::<_, Option<String>>(spec.name)?.into(),
            FieldType::Integer => row.get::<_, Option<i64>>(spec.name)?.into(),
            FieldType::Real => row.get::<_, Option<f64>>(spec.name)?.into(),
            FieldType::Date => {
                let text = row.get::<_, Option<String>>(spec.name)?;
                text.map(|value| parse_date(&value, descriptor.table, spec.name))
                    .transpose()?
                    .into()
            }
        };
        fields.push((spec.name, value));
    }

    let mut references = Vec::with_capacity(descriptor.references.len());
    for reference in descriptor.references {
        let id = row.get::<_, Option<RecordId>>(reference.column)?;
        if id.is_none() && !reference.nullable {
            return Err(RepoError::InvalidData(format!(
                "null required reference in {}.{}",
                descriptor.table, reference.column
            )));
        }
        references.push((reference.column, id));
    }

    Ok(StoredRecord {
        id: row.get("id")?,
        kind: descriptor.kind,
        identity,
        fields,
        references,
    })
}

fn parse_identity(value: &str, table: &'static str) -> RepoResult<Identity> {
    Identity::parse(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid hash `{value}` in {table}.hash")))
}

fn parse_date(value: &str, table: &'static str, column: &'static str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        RepoError::InvalidData(format!("invalid date `{value}` in {table}.{column}"))
    })
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{RecordStore, RepoError, SqliteRecordStore};
    use crate::db::open_db_in_memory;
    use crate::model::{fixtures, CatalogObject, EntityKind, FieldValue};
    use rusqlite::Connection;

    #[test]
    fn insert_then_find_by_identity_decodes_all_fields() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteRecordStore::try_new(&conn).unwrap();
        let run = fixtures::run();
        let project = &run.model.project;

        let project_record = store
            .insert(
                EntityKind::Project,
                &project.identity(),
                &project.field_values(),
                &[],
            )
            .unwrap();
        let model_record = store
            .insert(
                EntityKind::Model,
                &run.model.identity(),
                &run.model.field_values(),
                &[("project_id", Some(project_record.id))],
            )
            .unwrap();
        let inserted = store
            .insert(
                EntityKind::Run,
                &run.identity(),
                &run.field_values(),
                &[("model_id", Some(model_record.id))],
            )
            .unwrap();

        let loaded = store
            .find_by_identity(EntityKind::Run, &run.identity())
            .unwrap()
            .unwrap();
        assert_eq!(loaded, inserted);
        assert_eq!(loaded.fields, run.field_values());
        assert_eq!(loaded.reference("model_id"), Some(model_record.id));
    }

    #[test]
    fn insert_rejects_missing_required_reference() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteRecordStore::new(&conn);
        let model = fixtures::model();

        let err = store
            .insert(
                EntityKind::Model,
                &model.identity(),
                &model.field_values(),
                &[],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::MissingReference {
                kind: EntityKind::Model,
                column: "project_id"
            }
        ));
    }

    #[test]
    fn duplicate_identity_is_a_constraint_violation() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteRecordStore::new(&conn);
        let region = fixtures::region();

        store
            .insert(EntityKind::Region, &region.identity(), &region.field_values(), &[])
            .unwrap();
        let err = store
            .insert(EntityKind::Region, &region.identity(), &region.field_values(), &[])
            .unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)));
        assert_eq!(
            store
                .count_by_identity(EntityKind::Region, &region.identity())
                .unwrap(),
            1
        );
    }

    #[test]
    fn dangling_reference_is_rejected_not_conflicting() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteRecordStore::new(&conn);
        let variable = fixtures::variable();

        let err = store
            .insert(
                EntityKind::Variable,
                &variable.identity(),
                &variable.field_values(),
                &[("units_id", Some(999))],
            )
            .unwrap_err();

        assert!(matches!(err, RepoError::Rejected(_)), "{err}");
        assert_eq!(store.count(EntityKind::Variable).unwrap(), 0);
    }

    #[test]
    fn update_fields_overwrites_and_reports_missing_rows() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteRecordStore::new(&conn);
        let mut region = fixtures::region();
        let record = store
            .insert(EntityKind::Region, &region.identity(), &region.field_values(), &[])
            .unwrap();

        region.description = "updated".to_string();
        store
            .update_fields(EntityKind::Region, record.id, &region.field_values())
            .unwrap();
        let loaded = store
            .find_by_id(EntityKind::Region, record.id)
            .unwrap()
            .unwrap();
        assert_eq!(
            loaded.field("description"),
            Some(&FieldValue::Text("updated".to_string()))
        );

        let err = store
            .update_fields(EntityKind::Region, record.id + 100, &region.field_values())
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound { .. }));
    }

    #[test]
    fn undeclared_field_is_rejected() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteRecordStore::new(&conn);
        let region = fixtures::region();
        let mut fields = region.field_values();
        fields.push(("lat_bounds", FieldValue::Null));

        let err = store
            .insert(EntityKind::Region, &region.identity(), &fields, &[])
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
    }

    #[test]
    fn try_new_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteRecordStore::try_new(&conn).err().unwrap();
        assert!(matches!(
            err,
            RepoError::UninitializedConnection {
                actual_version: 0,
                ..
            }
        ));
    }
}
