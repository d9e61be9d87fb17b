//! Ownership-based access checks for transactions.
//!
//! A transaction may be viewed, edited or deleted only by its author.

use crate::{
    entities::transaction,
    errors::{Error, Result},
};
use serde::Serialize;
use std::fmt;

/// Actions a user may request on a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Permission {
    /// Read the transaction
    View,
    /// Change the transaction
    Edit,
    /// Remove the transaction
    Delete,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Delete => "delete",
        })
    }
}

/// Returns whether `user_id` holds `permission` on `transaction`.
#[must_use]
pub fn is_granted(permission: Permission, transaction: &transaction::Model, user_id: i64) -> bool {
    match permission {
        Permission::View | Permission::Edit | Permission::Delete => {
            transaction.author_id == user_id
        }
    }
}

/// `true` if the user may view the transaction.
#[must_use]
pub fn can_view(transaction: &transaction::Model, user_id: i64) -> bool {
    is_granted(Permission::View, transaction, user_id)
}

/// `true` if the user may edit the transaction.
#[must_use]
pub fn can_edit(transaction: &transaction::Model, user_id: i64) -> bool {
    is_granted(Permission::Edit, transaction, user_id)
}

/// `true` if the user may delete the transaction.
#[must_use]
pub fn can_delete(transaction: &transaction::Model, user_id: i64) -> bool {
    is_granted(Permission::Delete, transaction, user_id)
}

/// Fails with [`Error::AccessDenied`] unless the permission is granted.
pub fn require(permission: Permission, transaction: &transaction::Model, user_id: i64) -> Result<()> {
    if is_granted(permission, transaction, user_id) {
        Ok(())
    } else {
        tracing::warn!(
            user_id,
            transaction_id = transaction.id,
            %permission,
            "Access to transaction denied"
        );
        Err(Error::AccessDenied {
            user_id,
            transaction_id: transaction.id,
            permission,
        })
    }
}
