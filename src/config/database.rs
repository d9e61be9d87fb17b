//! Database configuration module for `Budgetly`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust structs,
//! including unique constraints and the foreign keys declared as `belongs_to` relations.

use crate::config::settings::DatabaseSettings;
use crate::entities::{Category, Tag, Transaction, TransactionTag, User, Wallet};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
    sea_query::TableCreateStatement,
};
use tracing::{debug, info};

/// Resolves the database URL.
///
/// `DATABASE_URL` from the environment wins over the settings file so that
/// deployments can redirect the store without editing `budgetly.toml`.
#[must_use]
pub fn resolve_database_url(settings: &DatabaseSettings) -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| settings.url.clone())
}

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {database_url}");
    Database::connect(database_url).await.map_err(Into::into)
}

fn create_statement<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    statement
}

/// Creates every table that does not exist yet.
///
/// Referenced tables are created before the tables pointing at them.
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let statements = [
        create_statement(&schema, User),
        create_statement(&schema, Wallet),
        create_statement(&schema, Category),
        create_statement(&schema, Tag),
        create_statement(&schema, Transaction),
        create_statement(&schema, TransactionTag),
    ];

    for statement in &statements {
        db.execute(builder.build(statement)).await?;
    }

    info!("Database schema is up to date ({} tables)", statements.len());
    Ok(())
}
