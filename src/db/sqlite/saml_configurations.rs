use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

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
    c.created_at, c.updated_at
"#;

pub struct SqliteSamlConfigurationRepo {
    pool: SqlitePool,
}

impl SqliteSamlConfigurationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Parse a configuration from a database row. Hostnames are loaded separately.
    fn parse_config(row: &sqlx::sqlite::SqliteRow, hostnames: Vec<String>) -> SamlTenantConfig {
        SamlTenantConfig {
            id: row.get("id"),
            hostnames,
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

    async fn hostnames_for(&self, configuration_id: i64) -> DbResult<Vec<String>> {
        let hostnames = sqlx::query_scalar::<_, String>(
            r#"
            SELECT hostname FROM saml_configuration_hostnames
            WHERE configuration_id = ?
            ORDER BY position
            "#,
        )
        .bind(configuration_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(hostnames)
    }
}

#[async_trait]
impl TenantConfigStore for SqliteSamlConfigurationRepo {
    async fn find_by_hostname(&self, hostname: &str) -> DbResult<Option<SamlTenantConfig>> {
        let query = format!(
            r#"
            SELECT {CONFIG_COLUMNS}
            FROM saml_configurations c
            JOIN saml_configuration_hostnames h ON h.configuration_id = c.id
            WHERE h.hostname = ?
            "#
        );

        let row = sqlx::query(&query)
            .bind(hostname)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let hostnames = self.hostnames_for(row.get("id")).await?;
                Ok(Some(Self::parse_config(&row, hostnames)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SamlConfigurationRepo for SqliteSamlConfigurationRepo {
    async fn create(&self, input: CreateSamlTenantConfig) -> DbResult<SamlTenantConfig> {
        let now = chrono::Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO saml_configurations (
                name, sp_acs_page, sp_sls_page, url, idp_entity_id,
                certificate, cert_key, idp_certificate, idp_certificate_2, idp_certificate_3,
                name_id_format, idp_sso_binding, requested_authn_context, debug,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
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
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();

        for (position, hostname) in input.hostnames.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO saml_configuration_hostnames (hostname, configuration_id, position)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(hostname)
            .bind(id)
            .bind(position as i64)
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
        let query = format!("SELECT {CONFIG_COLUMNS} FROM saml_configurations c WHERE c.id = ?");

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let hostnames = self.hostnames_for(id).await?;
                Ok(Some(Self::parse_config(&row, hostnames)))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> DbResult<Vec<SamlTenantConfig>> {
        let query = format!("SELECT {CONFIG_COLUMNS} FROM saml_configurations c ORDER BY c.id");

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut configs = Vec::with_capacity(rows.len());
        for row in &rows {
            let hostnames = self.hostnames_for(row.get("id")).await?;
            configs.push(Self::parse_config(row, hostnames));
        }

        Ok(configs)
    }

    async fn delete(&self, id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM saml_configuration_hostnames WHERE configuration_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM saml_configurations WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
