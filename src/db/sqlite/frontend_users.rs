use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{
    Column, Row, Sqlite, SqlitePool, TypeInfo, ValueRef, query::Query, sqlite::SqliteArguments,
};

use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{
            FrontendUserRepo, bound_values, insert_statement, update_statement, validate_columns,
        },
    },
    models::{FRONTEND_USER_ID_COLUMN, FRONTEND_USER_TABLE, FieldValue, FrontendUser, UpsertOp},
};

pub struct SqliteFrontendUserRepo {
    pool: SqlitePool,
}

impl SqliteFrontendUserRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Decode every non-identifier column of a row by its declared type.
    fn parse_user(row: &sqlx::sqlite::SqliteRow) -> DbResult<FrontendUser> {
        let uid: i64 = row.try_get(FRONTEND_USER_ID_COLUMN)?;
        let mut data = BTreeMap::new();

        for column in row.columns() {
            let name = column.name();
            if name == FRONTEND_USER_ID_COLUMN {
                continue;
            }

            let ordinal = column.ordinal();
            if row.try_get_raw(ordinal)?.is_null() {
                data.insert(name.to_string(), FieldValue::Null);
                continue;
            }

            let value = match column.type_info().name().to_ascii_uppercase().as_str() {
                "INTEGER" | "INT" | "BIGINT" | "BOOLEAN" => {
                    FieldValue::Int(row.try_get::<i64, _>(ordinal)?)
                }
                "REAL" | "FLOAT" | "DOUBLE" => FieldValue::Float(row.try_get::<f64, _>(ordinal)?),
                _ => FieldValue::Text(row.try_get::<String, _>(ordinal)?),
            };
            data.insert(name.to_string(), value);
        }

        Ok(FrontendUser::with_uid(uid, data))
    }
}

/// Bind a non-null field value. Booleans are stored as 0/1 integers.
fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: FieldValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        FieldValue::Null => query,
        FieldValue::Bool(b) => query.bind(b as i64),
        FieldValue::Int(i) => query.bind(i),
        FieldValue::Float(f) => query.bind(f),
        FieldValue::Text(s) => query.bind(s),
    }
}

#[async_trait]
impl FrontendUserRepo for SqliteFrontendUserRepo {
    async fn upsert(&self, mut user: FrontendUser) -> DbResult<FrontendUser> {
        let fields = user.to_persistable_fields();
        validate_columns(&fields)?;

        match UpsertOp::for_record(&user) {
            UpsertOp::Create => {
                let sql = insert_statement(FRONTEND_USER_TABLE, &fields, |_| "?".to_string());

                let mut query = sqlx::query(&sql);
                for value in bound_values(fields) {
                    query = bind_value(query, value);
                }

                // The generated id is read from the same connection that ran the insert
                let mut conn = self.pool.acquire().await?;
                query.execute(&mut *conn).await?;
                let uid: i64 = sqlx::query_scalar("SELECT last_insert_rowid()")
                    .fetch_one(&mut *conn)
                    .await?;

                user.set_uid(uid);
                Ok(user)
            }
            UpsertOp::Update(uid) => {
                if fields.is_empty() {
                    return Err(DbError::Validation(
                        "Update requires at least one field".into(),
                    ));
                }

                let sql = update_statement(
                    FRONTEND_USER_TABLE,
                    FRONTEND_USER_ID_COLUMN,
                    &fields,
                    |_| "?".to_string(),
                );

                let mut query = sqlx::query(&sql);
                for value in bound_values(fields) {
                    query = bind_value(query, value);
                }

                let result = query.bind(uid).execute(&self.pool).await?;
                if result.rows_affected() == 0 {
                    return Err(DbError::NotFound);
                }

                Ok(user)
            }
        }
    }

    async fn get_by_id(&self, uid: i64) -> DbResult<Option<FrontendUser>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?",
            FRONTEND_USER_TABLE, FRONTEND_USER_ID_COLUMN
        );

        let row = sqlx::query(&sql)
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_user).transpose()
    }
}
