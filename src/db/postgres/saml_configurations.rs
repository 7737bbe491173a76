use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{SamlConfigurationRepo, TenantConfigStore},
    },
    models::{CreateSamlTenantConfig, DebugFlag, SamlTenantConfig},
};

const CONFIG_COLUMNS: &str = r#"
    c.id, c.name, c.sp_acs_page, c.sp_sls_page, c.url, c.idp_entity_id,
    c.certificate, c.cert_key, c.idp_certificate, c.idp_certificate_2, c.idp_certificate_3,
    c.name_id_format, c.idp_sso_binding, c.requested_authn_context, c.debug,
    c.created_at, c.updated_at,
    ARRAY(
        SELECT h.hostname FROM saml_configuration_hostnames h
        WHERE h.configuration_id = c.id
        ORDER BY h.position
    ) AS hostnames
"#;

pub struct PostgresSamlConfigurationRepo {
    write_pool: PgPool,
    read_pool: PgPool,
}

impl PostgresSamlConfigurationRepo {
    pub fn new(write_pool: PgPool, read_pool: Option<PgPool>) -> Self {
        let read_pool = read_pool.unwrap_or_else(|| write_pool.clone());
        Self {
            write_pool,
            read_pool,
        }
    }

    fn parse_config(row: &sqlx::postgres::PgRow) -> SamlTenantConfig {
        SamlTenantConfig {
            id: row.get("id"),
            hostnames: row.get("hostnames"),
            name: row.get("name"),
            sp_acs_page: row.get("sp_acs_page"),
            sp_sls_page: row.get("sp_sls_page"),
            url: row.get("url"),
            idp_entity_id: row.get("idp_entity_id"),
            certificate: row.get("certificate"),
            cert_key: row.get("cert_key"),
            idp_certificate: row.get("idp_certificate"),
            idp_certificate_2: row.get("idp_certificate_2"),
            idp_certificate_3: row.get("idp_certificate_3"),
            name_id_format: row.get("name_id_format"),
            idp_sso_binding: row.get("idp_sso_binding"),
            requested_authn_context: row.get("requested_authn_context"),
            debug: DebugFlag::from_raw(row.get("debug")),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl TenantConfigStore for PostgresSamlConfigurationRepo {
    async fn find_by_hostname(&self, hostname: &str) -> DbResult<Option<SamlTenantConfig>> {
        let query = format!(
            r#"
            SELECT {CONFIG_COLUMNS}
            FROM saml_configurations c
            JOIN saml_configuration_hostnames lookup ON lookup.configuration_id = c.id
            WHERE lookup.hostname = $1
            "#
        );

        let row = sqlx::query(&query)
            .bind(hostname)
            .fetch_optional(&self.read_pool)
            .await?;

        Ok(row.as_ref().map(Self::parse_config))
    }
}

#[async_trait]
impl SamlConfigurationRepo for PostgresSamlConfigurationRepo {
    async fn create(&self, input: CreateSamlTenantConfig) -> DbResult<SamlTenantConfig> {
        let now = chrono::Utc::now();
        let mut tx = self.write_pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO saml_configurations (
                name, sp_acs_page, sp_sls_page, url, idp_entity_id,
                certificate, cert_key, idp_certificate, idp_certificate_2, idp_certificate_3,
                name_id_format, idp_sso_binding, requested_authn_context, debug,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(&input.sp_acs_page)
        .bind(&input.sp_sls_page)
        .bind(&input.url)
        .bind(&input.idp_entity_id)
        .bind(&input.certificate)
        .bind(&input.cert_key)
        .bind(&input.idp_certificate)
        .bind(&input.idp_certificate_2)
        .bind(&input.idp_certificate_3)
        .bind(&input.name_id_format)
        .bind(&input.idp_sso_binding)
        .bind(&input.requested_authn_context)
        .bind(input.debug.raw())
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        for (position, hostname) in input.hostnames.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO saml_configuration_hostnames (hostname, configuration_id, position)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(hostname)
            .bind(id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    DbError::Conflict(format!(
                        "Hostname '{}' already has a SAML configuration",
                        hostname
                    ))
                }
                _ => DbError::from(e),
            })?;
        }

        tx.commit().await?;

        Ok(SamlTenantConfig::from_input(id, input, now))
    }

    async fn get_by_id(&self, id: i64) -> DbResult<Option<SamlTenantConfig>> {
        let query = format!("SELECT {CONFIG_COLUMNS} FROM saml_configurations c WHERE c.id = $1");

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.read_pool)
            .await?;

        Ok(row.as_ref().map(Self::parse_config))
    }

    async fn list(&self) -> DbResult<Vec<SamlTenantConfig>> {
        let query = format!("SELECT {CONFIG_COLUMNS} FROM saml_configurations c ORDER BY c.id");

        let rows = sqlx::query(&query).fetch_all(&self.read_pool).await?;

        Ok(rows.iter().map(Self::parse_config).collect())
    }

    async fn delete(&self, id: i64) -> DbResult<()> {
        // Hostnames go with the configuration via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM saml_configurations WHERE id = $1")
            .bind(id)
            .execute(&self.write_pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }
}
