//! Wallet balance arithmetic and the guarded balance write.
//!
//! Every balance change in the crate goes through [`shift_balance`], which
//! refuses to leave a wallet negative and rejects writes based on a stale
//! read of the wallet.

use crate::{
    entities::{TransactionKind, Wallet, wallet},
    errors::{Error, Result},
    money::Money,
};
use sea_orm::{prelude::*, sea_query::Expr};
use tracing::{debug, warn};

/// Signed effect of a transaction of `kind` and `amount` on its wallet.
#[must_use]
pub fn signed_delta(kind: TransactionKind, amount: Money) -> Money {
    kind.signed(amount)
}

/// Balance `wallet` would hold after `delta`, or the error explaining why it
/// cannot.
pub fn projected_balance(wallet: &wallet::Model, delta: Money) -> Result<Money> {
    let next = wallet
        .balance()
        .checked_add(delta)
        .ok_or_else(|| Error::invalid("amount", "money.too_large"))?;

    if next.is_negative() {
        warn!(
            wallet_id = wallet.id,
            balance = %wallet.balance(),
            %delta,
            "Refusing balance change below zero"
        );
        return Err(Error::Balance {
            wallet_id: wallet.id,
            balance: wallet.balance(),
            delta,
        });
    }
    Ok(next)
}

/// Applies `delta` to the wallet as it was read in `wallet`.
///
/// The write only succeeds if nobody else has changed the wallet since it
/// was loaded; otherwise [`Error::Conflict`] is returned and nothing is
/// written. Returns the new balance.
pub async fn shift_balance<C>(db: &C, wallet: &wallet::Model, delta: Money) -> Result<Money>
where
    C: ConnectionTrait,
{
    let next = projected_balance(wallet, delta)?;

    let result = Wallet::update_many()
        .col_expr(wallet::Column::Balance, Expr::value(next.cents()))
        .col_expr(
            wallet::Column::Version,
            Expr::col(wallet::Column::Version).add(1),
        )
        .col_expr(wallet::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(wallet::Column::Id.eq(wallet.id))
        .filter(wallet::Column::Version.eq(wallet.version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        warn!(wallet_id = wallet.id, version = wallet.version, "Stale wallet version");
        return Err(Error::Conflict {
            wallet_id: wallet.id,
        });
    }

    debug!(wallet_id = wallet.id, %delta, balance = %next, "Shifted wallet balance");
    Ok(next)
}
