use budgetly::{
    config::{
        database::{create_connection, create_tables, resolve_database_url},
        settings::load_default_settings,
    },
    core::{user::list_users, wallet::list_wallets},
    errors::Result,
};
use dotenvy::dotenv;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Creates the directory holding a file-backed `SQLite` database.
fn ensure_database_dir(database_url: &str) -> Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let file = rest.split('?').next().unwrap_or(rest);
    if let Some(parent) = Path::new(file).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Load settings
    let settings = load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;

    // 4. Connect and make sure the schema exists
    let database_url = resolve_database_url(&settings.database);
    ensure_database_dir(&database_url)?;
    let db = create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db).await?;
    info!("Database initialized successfully.");

    // 5. Report the first page of wallets
    let users = list_users(&db, 1, settings.pagination.users).await?;
    let wallets = list_wallets(&db, 1, settings.pagination.wallets).await?;
    info!(
        users = users.total_items,
        wallets = wallets.total_items,
        pages = wallets.total_pages,
        "Budgetly is ready"
    );
    for wallet in &wallets.items {
        info!(wallet_id = wallet.id, title = %wallet.title, balance = %wallet.balance(), "Wallet");
    }

    Ok(())
}
