use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use samlauth::{
    config::{SamlAuthConfig, TenantsFile},
    db::{DbError, DbPool, StaticTenantConfigStore},
    observability,
    saml::EndpointResolver,
    services::{Services, TenantService, TenantSummary},
};

/// CLI arguments for samlauth
#[derive(Parser, Debug)]
#[command(version, about = "Per-host SAML service provider settings", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (defaults to ./samlauth.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Print the SAML settings document for a host as JSON
    Settings {
        /// Hostname to look up, e.g. `www.example.com`
        #[arg(long)]
        host: String,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Manage tenant SAML configurations stored in the database
    Tenants {
        #[command(subcommand)]
        action: TenantsCommand,
    },
    /// Run database migrations and exit
    Migrate,
    /// Load and validate the config file, then check the database connection
    CheckConfig,
    /// Show enabled compile-time features
    Features,
}

#[derive(clap::Subcommand, Debug)]
enum TenantsCommand {
    /// Create the `[[tenants]]` entries of a TOML file
    Import {
        /// File with `[[tenants]]` entries
        file: PathBuf,
    },
    /// List all tenants
    List,
    /// Show one tenant
    Show { id: i64 },
    /// Delete a tenant and release its hostnames
    Delete { id: i64 },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match args.command {
        Some(Command::Settings { host, pretty }) => {
            run_settings(args.config.as_deref(), &host, pretty).await;
        }
        Some(Command::Migrate) => {
            run_migrate(args.config.as_deref()).await;
        }
        Some(Command::Tenants { action }) => {
            run_tenants(args.config.as_deref(), action).await;
        }
        Some(Command::CheckConfig) => {
            run_check_config(args.config.as_deref()).await;
        }
        Some(Command::Features) | None => {
            run_features();
        }
    }
}

fn resolve_config_path(explicit_path: Option<&str>) -> Result<PathBuf, String> {
    let path = PathBuf::from(explicit_path.unwrap_or("samlauth.toml"));
    if !path.exists() {
        return Err(format!("Config file not found: {}", path.display()));
    }
    Ok(path)
}

/// Load the config file or exit with an error.
fn load_config(explicit_path: Option<&str>) -> (PathBuf, SamlAuthConfig) {
    let config_path = match resolve_config_path(explicit_path) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match SamlAuthConfig::from_file(&config_path) {
        Ok(config) => (config_path, config),
        Err(e) => {
            eprintln!(
                "Failed to load config from {}: {}",
                config_path.display(),
                e
            );
            std::process::exit(1);
        }
    }
}

fn init_logging(config: &SamlAuthConfig) {
    if let Err(e) = observability::init_tracing(&config.observability.logging) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Build services from the database, or from `[[tenants]]` when no database is configured.
async fn build_services(config: &SamlAuthConfig) -> Result<Services, String> {
    if config.is_static_mode() {
        tracing::debug!(tenants = config.tenants.len(), "Using static tenant configuration");
        return Ok(Services::with_static_tenants(StaticTenantConfigStore::new(
            &config.tenants,
        )));
    }

    Ok(Services::new(open_database(config).await?))
}

/// Connect to the configured database, applying migrations if enabled.
async fn open_database(config: &SamlAuthConfig) -> Result<Arc<DbPool>, String> {
    let pool = DbPool::from_config(&config.database)
        .await
        .map_err(|e| format!("Failed to connect to database: {e}"))?;

    if config.database.run_migrations() {
        pool.run_migrations()
            .await
            .map_err(|e| format!("Database migrations failed: {e}"))?;
    }

    Ok(Arc::new(pool))
}

async fn run_settings(explicit_config_path: Option<&str>, host: &str, pretty: bool) {
    let (_, config) = load_config(explicit_config_path);
    init_logging(&config);

    let links = match config.links.page_links() {
        Ok(links) => links,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let services = match build_services(&config).await {
        Ok(services) => services,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize services");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let endpoints = links.as_ref().map(|l| l as &dyn EndpointResolver);
    let settings = match services
        .saml_settings
        .settings(Some(host), None, endpoints)
        .await
    {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let output = if pretty {
        serde_json::to_string_pretty(&settings)
    } else {
        serde_json::to_string(&settings)
    };

    match output {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: Failed to serialize settings: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_migrate(explicit_config_path: Option<&str>) {
    let (config_path, config) = load_config(explicit_config_path);
    init_logging(&config);

    tracing::info!(
        config_file = %config_path.display(),
        "Running database migrations"
    );

    if config.database.is_none() {
        eprintln!("Error: Database is not configured. Nothing to migrate.");
        std::process::exit(1);
    }

    match DbPool::from_config(&config.database).await {
        Ok(pool) => match pool.run_migrations().await {
            Ok(()) => {
                tracing::info!("Database migrations completed successfully");
            }
            Err(e) => {
                tracing::error!(error = %e, "Database migrations failed");
                eprintln!("Error: Database migrations failed: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            eprintln!("Error: Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_tenants(explicit_config_path: Option<&str>, action: TenantsCommand) {
    let (_, config) = load_config(explicit_config_path);
    init_logging(&config);

    if config.database.is_none() {
        eprintln!(
            "Error: Database is not configured. Tenants are read from [[tenants]] in the config file."
        );
        std::process::exit(1);
    }

    let tenants = match open_database(&config).await {
        Ok(pool) => TenantService::new(pool.saml_configurations()),
        Err(e) => {
            tracing::error!(error = %e, "Failed to open database");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match action {
        TenantsCommand::Import { file } => import_tenants(&tenants, &file).await,
        TenantsCommand::List => match tenants.list().await {
            Ok(all) => print_json(&all.iter().map(TenantSummary::from).collect::<Vec<_>>()),
            Err(e) => Err(e.to_string()),
        },
        TenantsCommand::Show { id } => match tenants.get(id).await {
            Ok(Some(tenant)) => print_json(&TenantSummary::from(&tenant)),
            Ok(None) => Err(format!("Tenant {id} not found")),
            Err(e) => Err(e.to_string()),
        },
        TenantsCommand::Delete { id } => tenants.delete(id).await.map_err(|e| match e {
            DbError::NotFound => format!("Tenant {id} not found"),
            other => other.to_string(),
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn import_tenants(tenants: &TenantService, file: &std::path::Path) -> Result<(), String> {
    let entries = TenantsFile::from_file(file)
        .map_err(|e| format!("Failed to load tenants from {}: {}", file.display(), e))?
        .tenants;

    let created = tenants.import(entries).await.map_err(|e| e.to_string())?;
    println!("Imported {} tenant(s) from {}", created.len(), file.display());
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize output: {e}"))?;
    println!("{json}");
    Ok(())
}

async fn run_check_config(explicit_config_path: Option<&str>) {
    let (config_path, config) = load_config(explicit_config_path);

    println!("Config OK: {}", config_path.display());
    match &config.links.base_url {
        Some(base_url) => println!("  links.base_url: {base_url}"),
        None => println!("  links.base_url: (unset, callback URLs left unresolved)"),
    }

    if config.is_static_mode() {
        let store = StaticTenantConfigStore::new(&config.tenants);
        println!("  database: none ({} static tenants)", store.list().len());
        for tenant in store.list() {
            println!("    {} -> {}", tenant.hostnames.join(", "), tenant.name);
        }
        return;
    }

    let health = match DbPool::from_config(&config.database).await {
        Ok(pool) => pool.health_check().await,
        Err(e) => Err(e),
    };
    match health {
        Ok(()) => println!("  database: reachable"),
        Err(e) => {
            eprintln!("Error: Database check failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_features() {
    let version = env!("CARGO_PKG_VERSION");

    let features: &[(&str, &str, bool)] = &[
        (
            "database-sqlite",
            "Databases",
            cfg!(feature = "database-sqlite"),
        ),
        (
            "database-postgres",
            "Databases",
            cfg!(feature = "database-postgres"),
        ),
        ("cli", "Tools", cfg!(feature = "cli")),
    ];

    let profile = if cfg!(feature = "full") {
        "full"
    } else if cfg!(feature = "minimal") {
        "minimal"
    } else {
        "custom"
    };

    println!("samlauth v{version}\n");
    println!("Build profile: {profile}");
    match profile {
        "full" => println!("  (full = minimal + postgres)\n"),
        "minimal" => println!("  (minimal = cli + sqlite)\n"),
        _ => println!(),
    }

    println!("Compile-time features:");

    let mut current_group = "";
    for &(name, group, enabled) in features {
        if group != current_group {
            if !current_group.is_empty() {
                println!();
            }
            println!("  {group}:");
            current_group = group;
        }
        let status = if enabled { "enabled" } else { "disabled" };
        println!("    {name:<32} {status}");
    }
}
