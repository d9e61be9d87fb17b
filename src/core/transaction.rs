//! Transaction business logic - the balance reconciler.
//!
//! Creating, editing and removing a transaction always moves the wallet
//! balance in the same database transaction as the row itself, so the stored
//! balance equals the opening balance plus the signed sum of every
//! transaction still on record. Every applied row carries `balance_after`,
//! the wallet balance right after it was applied.
//!
//! Failures are ordered: field validation first, then missing references,
//! then ownership, then the balance check. Nothing is written unless every
//! step passes.

use crate::{
    core::{
        access::{self, Permission},
        balance::{shift_balance, signed_delta},
        category::require_category,
        tag::find_tags_by_ids,
        user::require_user,
        validation::{TextKeys, Validate, Violation, Violations, ensure_valid},
        wallet::require_wallet,
    },
    entities::{Tag, Transaction, TransactionKind, TransactionTag, tag, transaction, transaction_tag},
    errors::{Error, Result},
    money::Money,
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Query};
use std::collections::BTreeSet;
use tracing::info;

const DESCRIPTION_KEYS: TextKeys = TextKeys {
    not_blank: "transaction.description.not_blank",
    min_length: "transaction.description.min_length",
    max_length: "transaction.description.max_length",
};

/// A transaction as proposed by a user, before it touches any wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// Positive amount; the direction comes from `kind`
    pub amount: Money,
    /// Income or expense
    pub kind: TransactionKind,
    /// When the event happened
    pub date: DateTimeUtc,
    /// Free text, 3 to 255 characters
    pub description: String,
    /// Wallet to apply the transaction to
    pub wallet_id: i64,
    /// Category to file it under
    pub category_id: i64,
    /// Tags to attach, each at most once
    pub tag_ids: Vec<i64>,
}

impl Validate for NewTransaction {
    fn violations(&self) -> Vec<Violation> {
        let mut v = Violations::new();
        check_amount(&mut v, self.amount);
        v.text(&self.description, "description", (3, 255), DESCRIPTION_KEYS);
        check_tag_ids(&mut v, &self.tag_ids);
        v.into_vec()
    }
}

/// Field changes for an existing transaction. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionChanges {
    /// New positive amount
    pub amount: Option<Money>,
    /// New direction
    pub kind: Option<TransactionKind>,
    /// New event date
    pub date: Option<DateTimeUtc>,
    /// New description
    pub description: Option<String>,
    /// Move the transaction to another wallet
    pub wallet_id: Option<i64>,
    /// Refile under another category
    pub category_id: Option<i64>,
    /// Replace the attached tags
    pub tag_ids: Option<Vec<i64>>,
}

impl TransactionChanges {
    /// `true` if applying these changes could move a wallet balance.
    #[must_use]
    pub const fn touches_balance(&self) -> bool {
        self.amount.is_some() || self.kind.is_some() || self.wallet_id.is_some()
    }
}

impl Validate for TransactionChanges {
    fn violations(&self) -> Vec<Violation> {
        let mut v = Violations::new();
        if let Some(amount) = self.amount {
            check_amount(&mut v, amount);
        }
        if let Some(description) = &self.description {
            v.text(description, "description", (3, 255), DESCRIPTION_KEYS);
        }
        if let Some(tag_ids) = &self.tag_ids {
            check_tag_ids(&mut v, tag_ids);
        }
        v.into_vec()
    }
}

fn check_amount(v: &mut Violations, amount: Money) {
    v.check(!amount.is_positive(), "amount", "transaction.amount.positive");
}

fn check_tag_ids(v: &mut Violations, tag_ids: &[i64]) {
    let unique: BTreeSet<_> = tag_ids.iter().collect();
    v.check(unique.len() != tag_ids.len(), "tags", "transaction.tags.duplicate");
}

/// Records a new transaction and moves its wallet balance.
///
/// The author is always explicit. On success the returned row holds the
/// wallet balance after application in `balance_after`. If the wallet
/// would go negative this fails with [`Error::Balance`] and neither the
/// wallet nor the transaction table changes.
pub async fn apply_new_transaction(
    db: &DatabaseConnection,
    author_id: i64,
    draft: NewTransaction,
) -> Result<transaction::Model> {
    ensure_valid(&draft)?;

    let txn = db.begin().await?;

    require_user(&txn, author_id).await?;
    let wallet = require_wallet(&txn, draft.wallet_id).await?;
    require_category(&txn, draft.category_id).await?;
    find_tags_by_ids(&txn, &draft.tag_ids).await?;

    let delta = signed_delta(draft.kind, draft.amount);
    let balance_after = shift_balance(&txn, &wallet, delta).await?;

    let now = chrono::Utc::now();
    let created = transaction::ActiveModel {
        amount: Set(draft.amount.cents()),
        kind: Set(draft.kind),
        date: Set(draft.date),
        description: Set(draft.description.trim().to_string()),
        wallet_id: Set(wallet.id),
        category_id: Set(draft.category_id),
        author_id: Set(author_id),
        balance_after: Set(Some(balance_after.cents())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    link_tags(&txn, created.id, &draft.tag_ids).await?;
    txn.commit().await?;

    info!(
        transaction_id = created.id,
        wallet_id = wallet.id,
        author_id,
        %delta,
        balance_after = %balance_after,
        "Applied transaction"
    );
    Ok(created)
}

/// Deletes a transaction and reverses its effect on the wallet.
///
/// Only the author may remove a transaction. Reversing an income that has
/// since been spent would leave the wallet negative, so such a removal is
/// refused with [`Error::Balance`].
pub async fn remove_transaction(db: &DatabaseConnection, actor_id: i64, transaction_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let existing = require_transaction(&txn, transaction_id).await?;
    access::require(Permission::Delete, &existing, actor_id)?;

    let wallet = require_wallet(&txn, existing.wallet_id).await?;
    let reversal = -existing.signed_amount();
    let balance = shift_balance(&txn, &wallet, reversal).await?;

    unlink_tags(&txn, transaction_id).await?;
    Transaction::delete_by_id(transaction_id).exec(&txn).await?;
    txn.commit().await?;

    info!(
        transaction_id,
        wallet_id = wallet.id,
        %reversal,
        %balance,
        "Removed transaction"
    );
    Ok(())
}

/// Applies `changes` to a transaction, reconciling the affected wallets.
///
/// Changing only the description, date, category or tags leaves every
/// balance alone. Changing the amount or kind moves the wallet by the
/// difference; moving to another wallet reverses the old effect on the old
/// wallet and applies the new one to the target. Either way `balance_after`
/// is re-snapshotted from the target wallet.
pub async fn edit_transaction(
    db: &DatabaseConnection,
    actor_id: i64,
    transaction_id: i64,
    changes: TransactionChanges,
) -> Result<transaction::Model> {
    ensure_valid(&changes)?;

    let txn = db.begin().await?;

    let current = require_transaction(&txn, transaction_id).await?;

    if let Some(category_id) = changes.category_id {
        require_category(&txn, category_id).await?;
    }
    if let Some(tag_ids) = &changes.tag_ids {
        find_tags_by_ids(&txn, tag_ids).await?;
    }

    let amount = changes.amount.unwrap_or_else(|| current.amount());
    let kind = changes.kind.unwrap_or(current.kind);
    let wallet_id = changes.wallet_id.unwrap_or(current.wallet_id);
    let target = require_wallet(&txn, wallet_id).await?;

    access::require(Permission::Edit, &current, actor_id)?;

    let old_delta = current.signed_amount();
    let new_delta = signed_delta(kind, amount);

    let balance_after = if !changes.touches_balance() {
        None
    } else if wallet_id == current.wallet_id {
        let difference = new_delta
            .checked_sub(old_delta)
            .ok_or_else(|| Error::invalid("amount", "money.too_large"))?;
        if difference == Money::ZERO {
            None
        } else {
            Some(shift_balance(&txn, &target, difference).await?)
        }
    } else {
        let previous = require_wallet(&txn, current.wallet_id).await?;
        shift_balance(&txn, &previous, -old_delta).await?;
        Some(shift_balance(&txn, &target, new_delta).await?)
    };

    let mut active: transaction::ActiveModel = current.into();
    active.amount = Set(amount.cents());
    active.kind = Set(kind);
    active.wallet_id = Set(wallet_id);
    if let Some(date) = changes.date {
        active.date = Set(date);
    }
    if let Some(description) = &changes.description {
        active.description = Set(description.trim().to_string());
    }
    if let Some(category_id) = changes.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(balance) = balance_after {
        active.balance_after = Set(Some(balance.cents()));
    }
    active.updated_at = Set(chrono::Utc::now());
    let updated = active.update(&txn).await?;

    if let Some(tag_ids) = &changes.tag_ids {
        unlink_tags(&txn, transaction_id).await?;
        link_tags(&txn, transaction_id, tag_ids).await?;
    }
    txn.commit().await?;

    info!(
        transaction_id,
        wallet_id,
        rebalanced = balance_after.is_some(),
        "Edited transaction"
    );
    Ok(updated)
}

/// Loads a transaction the actor is allowed to view.
pub async fn get_transaction(db: &DatabaseConnection, actor_id: i64, transaction_id: i64) -> Result<transaction::Model> {
    let found = require_transaction(db, transaction_id).await?;
    access::require(Permission::View, &found, actor_id)?;
    Ok(found)
}

/// Finds a transaction by ID without any ownership check.
pub async fn get_transaction_by_id<C: ConnectionTrait>(
    db: &C,
    transaction_id: i64,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(transaction_id)
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_transaction<C: ConnectionTrait>(db: &C, transaction_id: i64) -> Result<transaction::Model> {
    get_transaction_by_id(db, transaction_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "transaction",
            id: transaction_id,
        })
}

/// Tags attached to a transaction, ordered by title.
pub async fn get_transaction_tags<C: ConnectionTrait>(db: &C, transaction_id: i64) -> Result<Vec<tag::Model>> {
    Tag::find()
        .filter(
            tag::Column::Id.in_subquery(
                Query::select()
                    .column(transaction_tag::Column::TagId)
                    .from(TransactionTag)
                    .and_where(transaction_tag::Column::TransactionId.eq(transaction_id))
                    .to_owned(),
            ),
        )
        .order_by_asc(tag::Column::Title)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every transaction applied to a wallet, oldest first.
pub async fn get_transactions_for_wallet(
    db: &DatabaseConnection,
    wallet_id: i64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::WalletId.eq(wallet_id))
        .order_by_asc(transaction::Column::Date)
        .order_by_asc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn link_tags<C: ConnectionTrait>(db: &C, transaction_id: i64, tag_ids: &[i64]) -> Result<()> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    let links = tag_ids.iter().map(|&tag_id| transaction_tag::ActiveModel {
        transaction_id: Set(transaction_id),
        tag_id: Set(tag_id),
    });
    TransactionTag::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

async fn unlink_tags<C: ConnectionTrait>(db: &C, transaction_id: i64) -> Result<()> {
    TransactionTag::delete_many()
        .filter(transaction_tag::Column::TransactionId.eq(transaction_id))
        .exec(db)
        .await?;
    Ok(())
}
