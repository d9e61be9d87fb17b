//! Shared test utilities for `Budgetly`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

#![allow(clippy::expect_used)]

use crate::{
    core::{
        category::{self, CategoryDetails},
        tag::{self, TagDetails},
        transaction::{self, NewTransaction},
        user,
        wallet::{self, WalletDetails},
    },
    entities,
    errors::Result,
    money::Money,
};
use sea_orm::{DatabaseConnection, prelude::DateTimeUtc};

pub use crate::entities::TransactionKind;

/// Records every test transaction needs besides a wallet.
#[derive(Debug, Clone)]
pub struct Fixture {
    /// Author of test transactions
    pub user: entities::user::Model,
    /// Category test transactions are filed under
    pub category: entities::category::Model,
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Sets up a test database holding a user and a category.
/// Returns (db, fixture) for transaction-related tests.
pub async fn setup_with_fixture() -> Result<(DatabaseConnection, Fixture)> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, "owner@example.com").await?;
    let category = create_test_category(&db, "Groceries").await?;
    Ok((db, Fixture { user, category }))
}

/// Creates a test user.
pub async fn create_test_user(db: &DatabaseConnection, email: &str) -> Result<entities::user::Model> {
    user::create_user(db, email).await
}

/// Creates a test category with no description.
pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::category::Model> {
    category::create_category(
        db,
        CategoryDetails {
            name: name.to_string(),
            description: None,
        },
    )
    .await
}

/// Creates a test tag.
pub async fn create_test_tag(db: &DatabaseConnection, title: &str) -> Result<entities::tag::Model> {
    tag::create_tag(
        db,
        TagDetails {
            title: title.to_string(),
        },
    )
    .await
}

/// Creates a test wallet with the given opening balance.
pub async fn create_test_wallet(
    db: &DatabaseConnection,
    title: &str,
    opening_balance: Money,
) -> Result<entities::wallet::Model> {
    wallet::create_wallet(
        db,
        WalletDetails {
            title: title.to_string(),
            ..Default::default()
        },
        opening_balance,
    )
    .await
}

/// Noon UTC on the given day.
pub fn date(year: i32, month: u32, day: u32) -> DateTimeUtc {
    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .expect("valid test date")
        .and_utc()
}

/// Builds a transaction draft with sensible defaults.
///
/// # Defaults
/// * `description`: `"Test transaction"`
/// * `date`: 2024-01-15, noon UTC
/// * `category_id`: the fixture category
/// * `tag_ids`: none
pub fn test_draft(fixture: &Fixture, wallet_id: i64, kind: TransactionKind, cents: i64) -> NewTransaction {
    NewTransaction {
        amount: Money::new(cents),
        kind,
        date: date(2024, 1, 15),
        description: "Test transaction".to_string(),
        wallet_id,
        category_id: fixture.category.id,
        tag_ids: Vec::new(),
    }
}

/// Applies a default test transaction authored by the fixture user.
pub async fn apply_test_transaction(
    db: &DatabaseConnection,
    fixture: &Fixture,
    wallet_id: i64,
    kind: TransactionKind,
    cents: i64,
) -> Result<entities::transaction::Model> {
    let draft = test_draft(fixture, wallet_id, kind, cents);
    transaction::apply_new_transaction(db, fixture.user.id, draft).await
}

/// Applies a 10.00 income carrying `tag_ids`.
pub async fn apply_tagged_transaction(
    db: &DatabaseConnection,
    fixture: &Fixture,
    wallet_id: i64,
    tag_ids: &[i64],
) -> Result<entities::transaction::Model> {
    let mut draft = test_draft(fixture, wallet_id, TransactionKind::Income, 1_000);
    draft.tag_ids = tag_ids.to_vec();
    transaction::apply_new_transaction(db, fixture.user.id, draft).await
}
