//! Wallet entity - An account holding a monetary balance.
//!
//! The balance is stored in cents and only moves when a transaction is
//! applied, edited or removed. `version` is bumped on every balance change
//! and guards the read-modify-write against concurrent writers.

use crate::money::Money;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Wallet database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    /// Unique identifier for the wallet
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display title (e.g., "Savings", "Cash")
    pub title: String,
    /// Optional free-text description
    pub description: Option<String>,
    /// Current balance in cents, never negative
    pub balance: i64,
    /// Optional free-text labels
    pub tags: Option<String>,
    /// URL-safe form of the title
    pub slug: String,
    /// Optimistic lock counter, incremented on every balance change
    pub version: i64,
    /// When the wallet was created
    pub created_at: DateTimeUtc,
    /// When the wallet was last modified
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Current balance as [`Money`].
    #[must_use]
    pub const fn balance(&self) -> Money {
        Money::new(self.balance)
    }
}

/// Defines relationships between Wallet and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One wallet has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
