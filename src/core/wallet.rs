//! Wallet business logic - creation, lookup, listing and removal.
//!
//! Wallet balances are never edited here: the opening balance is set once at
//! creation and every later change goes through the reconciler in
//! [`crate::core::transaction`].

use crate::{
    core::{
        pagination::{Page, paginate},
        slug::slugify,
        validation::{TextKeys, Validate, Violation, Violations, ensure_valid, normalize_optional_text},
    },
    entities::{Transaction, Wallet, transaction, wallet},
    errors::{Error, Result},
    money::Money,
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Editable wallet fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletDetails {
    /// Display title
    pub title: String,
    /// Optional description
    pub description: Option<String>,
    /// Optional free-text labels
    pub tags: Option<String>,
}

impl Validate for WalletDetails {
    fn violations(&self) -> Vec<Violation> {
        let mut v = Violations::new();
        v.text(
            &self.title,
            "title",
            (1, 255),
            TextKeys {
                not_blank: "wallet.title.not_blank",
                min_length: "wallet.title.min_length",
                max_length: "wallet.title.max_length",
            },
        );
        v.check(
            !self.title.trim().is_empty() && slugify(&self.title).is_empty(),
            "title",
            "wallet.title.no_slug",
        );
        v.optional_text(self.description.as_deref(), "description", 255, "wallet.description.max_length");
        v.optional_text(self.tags.as_deref(), "tags", 255, "wallet.tags.max_length");
        v.into_vec()
    }
}

/// Creates a wallet holding `opening_balance`, which must not be negative.
pub async fn create_wallet(
    db: &DatabaseConnection,
    details: WalletDetails,
    opening_balance: Money,
) -> Result<wallet::Model> {
    let mut violations = details.violations();
    if opening_balance.is_negative() {
        violations.push(Violation::new("balance", "wallet.balance.not_negative"));
    }
    if !violations.is_empty() {
        return Err(Error::Validation { violations });
    }

    let now = chrono::Utc::now();
    let wallet = wallet::ActiveModel {
        slug: Set(slugify(&details.title)),
        title: Set(details.title.trim().to_string()),
        description: Set(normalize_optional_text(details.description.as_deref())),
        tags: Set(normalize_optional_text(details.tags.as_deref())),
        balance: Set(opening_balance.cents()),
        version: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(wallet_id = wallet.id, balance = %opening_balance, "Created wallet");
    Ok(wallet)
}

/// Finds a wallet by its unique ID.
pub async fn get_wallet_by_id<C: ConnectionTrait>(db: &C, wallet_id: i64) -> Result<Option<wallet::Model>> {
    Wallet::find_by_id(wallet_id).one(db).await.map_err(Into::into)
}

/// Like [`get_wallet_by_id`] but a missing wallet is an [`Error::NotFound`].
pub async fn require_wallet<C: ConnectionTrait>(db: &C, wallet_id: i64) -> Result<wallet::Model> {
    get_wallet_by_id(db, wallet_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "wallet",
            id: wallet_id,
        })
}

/// Lists wallets alphabetically by title.
pub async fn list_wallets(db: &DatabaseConnection, page: u64, per_page: u64) -> Result<Page<wallet::Model>> {
    let select = Wallet::find()
        .order_by_asc(wallet::Column::Title)
        .order_by_asc(wallet::Column::Id);
    paginate(db, select, page, per_page).await
}

/// Updates title, description and tags; the slug follows the title.
pub async fn update_wallet(
    db: &DatabaseConnection,
    wallet_id: i64,
    details: WalletDetails,
) -> Result<wallet::Model> {
    ensure_valid(&details)?;
    let existing = require_wallet(db, wallet_id).await?;

    let mut active: wallet::ActiveModel = existing.into();
    active.slug = Set(slugify(&details.title));
    active.title = Set(details.title.trim().to_string());
    active.description = Set(normalize_optional_text(details.description.as_deref()));
    active.tags = Set(normalize_optional_text(details.tags.as_deref()));
    active.updated_at = Set(chrono::Utc::now());

    let updated = active.update(db).await?;
    info!(wallet_id, "Updated wallet");
    Ok(updated)
}

/// Number of transactions recorded against a wallet.
pub async fn count_wallet_transactions<C: ConnectionTrait>(db: &C, wallet_id: i64) -> Result<u64> {
    Transaction::find()
        .filter(transaction::Column::WalletId.eq(wallet_id))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Deletes a wallet that no transaction refers to.
///
/// A wallet with history cannot be removed without losing the record of how
/// its balance came to be, so this fails with [`Error::InUse`] instead.
pub async fn delete_wallet(db: &DatabaseConnection, wallet_id: i64) -> Result<()> {
    let wallet = require_wallet(db, wallet_id).await?;

    let count = count_wallet_transactions(db, wallet_id).await?;
    if count > 0 {
        return Err(Error::InUse {
            entity: "wallet",
            id: wallet_id,
            count,
        });
    }

    wallet.delete(db).await?;
    info!(wallet_id, "Deleted wallet");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_wallet_validation() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_wallet(&db, WalletDetails::default(), Money::ZERO).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let details = WalletDetails {
            title: "Cash".to_string(),
            ..Default::default()
        };
        match create_wallet(&db, details, Money::new(-1)).await {
            Err(Error::Validation { violations }) => {
                assert_eq!(
                    violations,
                    vec![Violation::new("balance", "wallet.balance.not_negative")]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let details = WalletDetails {
            title: "Cash".to_string(),
            description: Some("x".repeat(256)),
            tags: None,
        };
        let result = create_wallet(&db, details, Money::ZERO).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn test_create_wallet_integration() -> Result<()> {
        let db = setup_test_db().await?;

        let details = WalletDetails {
            title: "  Holiday Savings ".to_string(),
            description: Some("   ".to_string()),
            tags: Some("travel, summer".to_string()),
        };
        let wallet = create_wallet(&db, details, Money::new(10_000)).await?;

        assert_eq!(wallet.title, "Holiday Savings");
        assert_eq!(wallet.slug, "holiday-savings");
        assert_eq!(wallet.description, None);
        assert_eq!(wallet.tags.as_deref(), Some("travel, summer"));
        assert_eq!(wallet.balance(), Money::new(10_000));
        assert_eq!(wallet.version, 0);

        assert_eq!(get_wallet_by_id(&db, wallet.id).await?, Some(wallet));
        Ok(())
    }

    #[tokio::test]
    async fn test_require_wallet_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = require_wallet(&db, 404).await;
        assert!(matches!(
            result,
            Err(Error::NotFound {
                entity: "wallet",
                id: 404
            })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_wallet_keeps_balance() -> Result<()> {
        let (db, fixture) = setup_with_fixture().await?;
        let wallet = create_test_wallet(&db, "Main", Money::new(5_000)).await?;
        apply_test_transaction(&db, &fixture, wallet.id, TransactionKind::Income, 2_500).await?;

        let details = WalletDetails {
            title: "Main Account".to_string(),
            description: Some("Everyday spending".to_string()),
            tags: None,
        };
        let updated = update_wallet(&db, wallet.id, details).await?;

        assert_eq!(updated.title, "Main Account");
        assert_eq!(updated.slug, "main-account");
        assert_eq!(updated.description.as_deref(), Some("Everyday spending"));
        assert_eq!(updated.balance(), Money::new(7_500));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_wallets_pages_by_title() -> Result<()> {
        let db = setup_test_db().await?;
        for title in ["Savings", "Cash", "Bank"] {
            create_test_wallet(&db, title, Money::ZERO).await?;
        }

        let first = list_wallets(&db, 1, 2).await?;
        let titles: Vec<_> = first.items.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, ["Bank", "Cash"]);
        assert_eq!(first.total_items, 3);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next());

        let second = list_wallets(&db, 2, 2).await?;
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].title, "Savings");
        assert!(!second.has_next());

        let beyond = list_wallets(&db, 3, 2).await?;
        assert!(beyond.items.is_empty());

        assert!(matches!(
            list_wallets(&db, 0, 2).await,
            Err(Error::Validation { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_wallet_refused_while_in_use() -> Result<()> {
        let (db, fixture) = setup_with_fixture().await?;
        let wallet = create_test_wallet(&db, "Main", Money::ZERO).await?;
        apply_test_transaction(&db, &fixture, wallet.id, TransactionKind::Income, 100).await?;

        let result = delete_wallet(&db, wallet.id).await;
        assert!(matches!(
            result,
            Err(Error::InUse {
                entity: "wallet",
                count: 1,
                ..
            })
        ));

        let empty = create_test_wallet(&db, "Unused", Money::ZERO).await?;
        delete_wallet(&db, empty.id).await?;
        assert!(get_wallet_by_id(&db, empty.id).await?.is_none());
        Ok(())
    }
}
