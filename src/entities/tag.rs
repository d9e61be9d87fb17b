//! Tag entity - Free labels attached to transactions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tag database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    /// Unique identifier for the tag
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique display title
    #[sea_orm(unique)]
    pub title: String,
    /// Unique URL-safe form of the title
    #[sea_orm(unique)]
    pub slug: String,
    /// When the tag was created
    pub created_at: DateTimeUtc,
    /// When the tag was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Tag and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Transaction links of this tag
    #[sea_orm(has_many = "super::transaction_tag::Entity")]
    TransactionTags,
}

impl Related<super::transaction_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionTags.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        super::transaction_tag::Relation::Transaction.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::transaction_tag::Relation::Tag.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
