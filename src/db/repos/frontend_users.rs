use std::collections::BTreeMap;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    db::error::{DbError, DbResult},
    models::{FRONTEND_USER_ID_COLUMN, FieldValue, FrontendUser},
};

/// Repository for federated frontend user accounts.
#[async_trait]
pub trait FrontendUserRepo: Send + Sync {
    /// Insert or update a user depending on whether it already has an identifier.
    ///
    /// New users are inserted and returned with the store-generated `uid`.
    /// Existing users have all their fields written to the row with their `uid`.
    ///
    /// # Errors
    /// - `DbError::Validation` for invalid column names or an update without fields
    /// - `DbError::NotFound` if an update matched no row
    /// - `DbError::Sqlx` for anything the database rejects
    async fn upsert(&self, user: FrontendUser) -> DbResult<FrontendUser>;

    async fn get_by_id(&self, uid: i64) -> DbResult<Option<FrontendUser>>;
}

static COLUMN_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("column name pattern"));

/// Check that every field name is a plain SQL identifier and none targets the
/// identifier column.
///
/// Column names are interpolated into the statement, values are always bound.
pub(crate) fn validate_columns(fields: &BTreeMap<String, FieldValue>) -> DbResult<()> {
    for column in fields.keys() {
        if column.eq_ignore_ascii_case(FRONTEND_USER_ID_COLUMN) {
            return Err(DbError::Validation(format!(
                "'{}' is assigned by the store and cannot be written",
                FRONTEND_USER_ID_COLUMN
            )));
        }
        if !COLUMN_NAME.is_match(column) {
            return Err(DbError::Validation(format!(
                "Invalid column name '{}'",
                column
            )));
        }
    }
    Ok(())
}

/// Build `INSERT INTO table (cols...) VALUES (placeholders...)`.
///
/// Null values are written as a `NULL` literal and take no placeholder, so
/// callers bind only the non-null values, in column order.
pub(crate) fn insert_statement(
    table: &str,
    fields: &BTreeMap<String, FieldValue>,
    placeholder: impl Fn(usize) -> String,
) -> String {
    if fields.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", table);
    }

    let columns: Vec<&str> = fields.keys().map(String::as_str).collect();
    let values = value_expressions(fields, &placeholder);

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        values.join(", ")
    )
}

/// Build `UPDATE table SET col = ?, ... WHERE id_column = ?`.
///
/// Nulls are handled as in [`insert_statement`]. The identifier placeholder
/// comes last.
pub(crate) fn update_statement(
    table: &str,
    id_column: &str,
    fields: &BTreeMap<String, FieldValue>,
    placeholder: impl Fn(usize) -> String,
) -> String {
    let values = value_expressions(fields, &placeholder);
    let assignments: Vec<String> = fields
        .keys()
        .zip(&values)
        .map(|(column, value)| format!("{} = {}", column, value))
        .collect();
    let bound = fields.values().filter(|v| !v.is_null()).count();

    format!(
        "UPDATE {} SET {} WHERE {} = {}",
        table,
        assignments.join(", "),
        id_column,
        placeholder(bound + 1)
    )
}

/// Values that must be bound for a statement built by the helpers above.
pub(crate) fn bound_values(fields: BTreeMap<String, FieldValue>) -> Vec<FieldValue> {
    fields.into_values().filter(|v| !v.is_null()).collect()
}

fn value_expressions(
    fields: &BTreeMap<String, FieldValue>,
    placeholder: &impl Fn(usize) -> String,
) -> Vec<String> {
    let mut index = 0;
    fields
        .values()
        .map(|value| {
            if value.is_null() {
                "NULL".to_string()
            } else {
                index += 1;
                placeholder(index)
            }
        })
        .collect()
}
