use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{
    Column, PgPool, Postgres, Row, TypeInfo, ValueRef, postgres::PgArguments, query::Query,
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

pub struct PostgresFrontendUserRepo {
    write_pool: PgPool,
    read_pool: PgPool,
}

impl PostgresFrontendUserRepo {
    pub fn new(write_pool: PgPool, read_pool: Option<PgPool>) -> Self {
        let read_pool = read_pool.unwrap_or_else(|| write_pool.clone());
        Self {
            write_pool,
            read_pool,
        }
    }

    fn parse_user(row: &sqlx::postgres::PgRow) -> DbResult<FrontendUser> {
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

            let value = match column.type_info().name() {
                "INT2" => FieldValue::Int(row.try_get::<i16, _>(ordinal)?.into()),
                "INT4" => FieldValue::Int(row.try_get::<i32, _>(ordinal)?.into()),
                "INT8" => FieldValue::Int(row.try_get::<i64, _>(ordinal)?),
                "BOOL" => FieldValue::Bool(row.try_get::<bool, _>(ordinal)?),
                "FLOAT4" => FieldValue::Float(row.try_get::<f32, _>(ordinal)?.into()),
                "FLOAT8" => FieldValue::Float(row.try_get::<f64, _>(ordinal)?),
                "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
                    FieldValue::Text(row.try_get::<String, _>(ordinal)?)
                }
                other => {
                    return Err(DbError::Internal(format!(
                        "Unsupported column type {} for {}.{}",
                        other, FRONTEND_USER_TABLE, name
                    )));
                }
            };
            data.insert(name.to_string(), value);
        }

        Ok(FrontendUser::with_uid(uid, data))
    }
}

/// Bind a non-null field value. Booleans are stored as 0/1 integers.
fn bind_value(
    query: Query<'_, Postgres, PgArguments>,
    value: FieldValue,
) -> Query<'_, Postgres, PgArguments> {
    match value {
        FieldValue::Null => query,
        FieldValue::Bool(b) => query.bind(b as i64),
        FieldValue::Int(i) => query.bind(i),
        FieldValue::Float(f) => query.bind(f),
        FieldValue::Text(s) => query.bind(s),
    }
}

#[async_trait]
impl FrontendUserRepo for PostgresFrontendUserRepo {
    async fn upsert(&self, mut user: FrontendUser) -> DbResult<FrontendUser> {
        let fields = user.to_persistable_fields();
        validate_columns(&fields)?;

        match UpsertOp::for_record(&user) {
            UpsertOp::Create => {
                let sql = format!(
                    "{} RETURNING {}",
                    insert_statement(FRONTEND_USER_TABLE, &fields, |i| format!("${}", i)),
                    FRONTEND_USER_ID_COLUMN
                );

                let mut query = sqlx::query(&sql);
                for value in bound_values(fields) {
                    query = bind_value(query, value);
                }

                let row = query.fetch_one(&self.write_pool).await?;
                user.set_uid(row.try_get(FRONTEND_USER_ID_COLUMN)?);
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
                    |i| format!("${}", i),
                );

                let mut query = sqlx::query(&sql);
                for value in bound_values(fields) {
                    query = bind_value(query, value);
                }

                let result = query.bind(uid).execute(&self.write_pool).await?;
                if result.rows_affected() == 0 {
                    return Err(DbError::NotFound);
                }

                Ok(user)
            }
        }
    }

    async fn get_by_id(&self, uid: i64) -> DbResult<Option<FrontendUser>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = $1",
            FRONTEND_USER_TABLE, FRONTEND_USER_ID_COLUMN
        );

        let row = sqlx::query(&sql)
            .bind(uid)
            .fetch_optional(&self.read_pool)
            .await?;

        row.as_ref().map(Self::parse_user).transpose()
    }
}
