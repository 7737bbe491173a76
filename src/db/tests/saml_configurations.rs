//! Shared tests for SamlConfigurationRepo implementations

use crate::{
    db::{error::DbError, repos::SamlConfigurationRepo},
    models::{CreateSamlTenantConfig, DebugFlag},
};

fn create_config_input(name: &str, hostnames: &[&str]) -> CreateSamlTenantConfig {
    CreateSamlTenantConfig {
        hostnames: hostnames.iter().map(|h| h.to_string()).collect(),
        name: name.to_string(),
        sp_acs_page: "42".to_string(),
        sp_sls_page: "43".to_string(),
        url: "https://idp.example/sso".to_string(),
        idp_entity_id: "https://idp.example".to_string(),
        certificate: String::new(),
        cert_key: String::new(),
        idp_certificate: "MIIC-IDP".to_string(),
        idp_certificate_2: None,
        idp_certificate_3: None,
        name_id_format: None,
        idp_sso_binding: None,
        requested_authn_context: None,
        debug: DebugFlag::DISABLED,
    }
}

pub async fn test_create_and_get(repo: &dyn SamlConfigurationRepo) {
    let mut input = create_config_input("sp1", &["a.example", "www.a.example"]);
    input.idp_certificate_2 = Some("MIIC-ROLLOVER".to_string());
    input.debug = DebugFlag::ENABLED;

    let created = repo.create(input).await.expect("Failed to create config");
    assert_eq!(created.name, "sp1");
    assert_eq!(created.hostnames, vec!["a.example", "www.a.example"]);

    let fetched = repo
        .get_by_id(created.id)
        .await
        .expect("Failed to get config")
        .expect("Config should exist");

    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.name, "sp1");
    assert_eq!(fetched.hostnames, vec!["a.example", "www.a.example"]);
    assert_eq!(fetched.idp_certificate_2.as_deref(), Some("MIIC-ROLLOVER"));
    assert_eq!(fetched.idp_certificate_3, None);
    assert!(fetched.debug.is_enabled());
}

pub async fn test_get_by_id_not_found(repo: &dyn SamlConfigurationRepo) {
    let result = repo.get_by_id(999).await.expect("Query should succeed");
    assert!(result.is_none());
}

pub async fn test_find_by_hostname(repo: &dyn SamlConfigurationRepo) {
    let first = repo
        .create(create_config_input("sp1", &["a.example", "www.a.example"]))
        .await
        .expect("Failed to create config");
    let second = repo
        .create(create_config_input("sp2", &["b.example"]))
        .await
        .expect("Failed to create config");

    let found = repo
        .find_by_hostname("www.a.example")
        .await
        .expect("Lookup should succeed")
        .expect("Hostname should resolve");
    assert_eq!(found.id, first.id);
    assert_eq!(found.hostnames.len(), 2);

    let found = repo
        .find_by_hostname("b.example")
        .await
        .expect("Lookup should succeed")
        .expect("Hostname should resolve");
    assert_eq!(found.id, second.id);
}

pub async fn test_find_by_hostname_is_exact(repo: &dyn SamlConfigurationRepo) {
    repo.create(create_config_input("sp1", &["a.example"]))
        .await
        .expect("Failed to create config");

    for host in ["A.EXAMPLE", "a.example:443", "sub.a.example", "example", ""] {
        let result = repo.find_by_hostname(host).await.expect("Lookup should succeed");
        assert!(result.is_none(), "{host:?} should not match");
    }
}

pub async fn test_duplicate_hostname_conflicts(repo: &dyn SamlConfigurationRepo) {
    repo.create(create_config_input("sp1", &["a.example"]))
        .await
        .expect("Failed to create config");

    let result = repo
        .create(create_config_input("sp2", &["other.example", "a.example"]))
        .await;
    assert!(matches!(result, Err(DbError::Conflict(_))));

    // The failed create leaves nothing behind
    assert!(
        repo.find_by_hostname("other.example")
            .await
            .expect("Lookup should succeed")
            .is_none()
    );
    assert_eq!(repo.list().await.expect("List should succeed").len(), 1);
}

pub async fn test_list_ordered_by_id(repo: &dyn SamlConfigurationRepo) {
    assert!(repo.list().await.expect("List should succeed").is_empty());

    for (name, host) in [("sp1", "a.example"), ("sp2", "b.example"), ("sp3", "c.example")] {
        repo.create(create_config_input(name, &[host]))
            .await
            .expect("Failed to create config");
    }

    let configs = repo.list().await.expect("List should succeed");
    let names: Vec<&str> = configs.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["sp1", "sp2", "sp3"]);
}

pub async fn test_delete_releases_hostnames(repo: &dyn SamlConfigurationRepo) {
    let created = repo
        .create(create_config_input("sp1", &["a.example"]))
        .await
        .expect("Failed to create config");

    repo.delete(created.id).await.expect("Failed to delete");

    assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    assert!(repo.find_by_hostname("a.example").await.unwrap().is_none());

    // Hostname can be claimed again
    repo.create(create_config_input("sp1-again", &["a.example"]))
        .await
        .expect("Hostname should be free after delete");
}

pub async fn test_delete_not_found(repo: &dyn SamlConfigurationRepo) {
    let result = repo.delete(999).await;
    assert!(matches!(result, Err(DbError::NotFound)));
}

// ============================================================================
// SQLite Tests
// ============================================================================

#[cfg(all(test, feature = "database-sqlite"))]
mod sqlite_tests {
    use crate::db::{
        sqlite::SqliteSamlConfigurationRepo,
        tests::harness::sqlite_pool,
    };

    macro_rules! sqlite_test {
        ($name:ident) => {
            #[tokio::test]
            async fn $name() {
                let pool = sqlite_pool().await;
                let repo = SqliteSamlConfigurationRepo::new(pool);
                super::$name(&repo).await;
            }
        };
    }

    sqlite_test!(test_create_and_get);
    sqlite_test!(test_get_by_id_not_found);
    sqlite_test!(test_find_by_hostname);
    sqlite_test!(test_find_by_hostname_is_exact);
    sqlite_test!(test_duplicate_hostname_conflicts);
    sqlite_test!(test_list_ordered_by_id);
    sqlite_test!(test_delete_releases_hostnames);
    sqlite_test!(test_delete_not_found);
}

// ============================================================================
// PostgreSQL Tests - Require Docker, run with `cargo test -- --ignored`
// ============================================================================

#[cfg(all(test, feature = "database-postgres"))]
mod postgres_tests {
    use crate::db::{
        postgres::PostgresSamlConfigurationRepo,
        tests::harness::postgres,
    };

    macro_rules! postgres_test {
        ($name:ident) => {
            #[tokio::test]
            #[ignore = "Requires Docker - run with `cargo test -- --ignored`"]
            async fn $name() {
                let pool = postgres::pool().await;
                let repo = PostgresSamlConfigurationRepo::new(pool, None);
                super::$name(&repo).await;
            }
        };
    }

    postgres_test!(test_create_and_get);
    postgres_test!(test_get_by_id_not_found);
    postgres_test!(test_find_by_hostname);
    postgres_test!(test_find_by_hostname_is_exact);
    postgres_test!(test_duplicate_hostname_conflicts);
    postgres_test!(test_list_ordered_by_id);
    postgres_test!(test_delete_releases_hostnames);
    postgres_test!(test_delete_not_found);
}
