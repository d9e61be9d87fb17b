//! Transaction entity - A single income or expense event applied to a wallet.
//!
//! Each transaction references exactly one wallet, one category and its
//! author, and records `balance_after`: the wallet balance immediately after
//! the transaction was applied. Amounts are positive cents; the direction
//! comes from `kind`.
use crate::money::Money;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Direction of a transaction, persisted in the `type` column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming into the wallet
    #[sea_orm(string_value = "income")]
    Income,
    /// Money leaving the wallet
    #[sea_orm(string_value = "expense")]
    Expense,
}

impl TransactionKind {
    /// Signed effect of `amount` on a wallet balance.
    #[must_use]
    pub fn signed(self, amount: Money) -> Money {
        match self {
            Self::Income => amount,
            Self::Expense => -amount,
        }
    }
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Positive amount in cents
    pub amount: i64,
    /// Income or expense
    #[sea_orm(column_name = "type")]
    pub kind: TransactionKind,
    /// When the financial event happened (not when it was recorded)
    pub date: DateTimeUtc,
    /// Human-readable description of the transaction
    pub description: String,
    /// Wallet the transaction is applied to
    pub wallet_id: i64,
    /// Category the transaction is filed under
    pub category_id: i64,
    /// User who recorded the transaction
    pub author_id: i64,
    /// Wallet balance in cents right after this transaction; `None` for legacy rows
    pub balance_after: Option<i64>,
    /// When the row was created
    pub created_at: DateTimeUtc,
    /// When the row was last modified
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Amount as [`Money`].
    #[must_use]
    pub const fn amount(&self) -> Money {
        Money::new(self.amount)
    }

    /// Signed effect this transaction had on its wallet.
    #[must_use]
    pub fn signed_amount(&self) -> Money {
        self.kind.signed(self.amount())
    }

    /// Recorded balance snapshot, if any.
    #[must_use]
    pub fn balance_after(&self) -> Option<Money> {
        self.balance_after.map(Money::new)
    }
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one wallet
    #[sea_orm(
        belongs_to = "super::wallet::Entity",
        from = "Column::WalletId",
        to = "super::wallet::Column::Id"
    )]
    Wallet,
    /// Each transaction is filed under one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// Each transaction has one author
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,
    /// Tag links of this transaction
    #[sea_orm(has_many = "super::transaction_tag::Entity")]
    TransactionTags,
}

impl Related<super::wallet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallet.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::transaction_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::transaction_tag::Relation::Transaction.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
