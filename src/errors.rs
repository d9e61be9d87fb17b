//! Unified error types and result handling.
//!
//! Every fallible operation in the crate returns [`Result`]. The variants
//! follow the failure taxonomy of the reconciler: validation and balance
//! errors are correctable by the caller, database errors are fatal to the
//! request and always leave the store untouched.

use crate::{core::access::Permission, core::validation::Violation, money::Money};
use sea_orm::DbErr;
use thiserror::Error;

/// All errors produced by `Budgetly`.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings could not be loaded or are inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable cause
        message: String,
    },

    /// Underlying storage failure; the surrounding unit of work was rolled back
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// One or more field constraints were violated
    #[error("Validation failed: {}", Violation::join(.violations))]
    Validation {
        /// Every violated constraint, in field order
        violations: Vec<Violation>,
    },

    /// Applying `delta` to the wallet would leave a negative balance
    #[error("Insufficient balance in wallet {wallet_id}: balance {balance}, change {delta}")]
    Balance {
        /// Wallet whose balance was protected
        wallet_id: i64,
        /// Balance at the time of the attempt
        balance: Money,
        /// Signed change that was refused
        delta: Money,
    },

    /// A referenced record does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record (`"wallet"`, `"category"`, ...)
        entity: &'static str,
        /// Identifier that was looked up
        id: i64,
    },

    /// The wallet changed between read and write
    #[error("Wallet {wallet_id} was modified concurrently, retry the operation")]
    Conflict {
        /// Wallet whose version check failed
        wallet_id: i64,
    },

    /// The acting user does not own the transaction
    #[error("User {user_id} is not allowed to {permission} transaction {transaction_id}")]
    AccessDenied {
        /// Acting user
        user_id: i64,
        /// Target transaction
        transaction_id: i64,
        /// Requested permission
        permission: Permission,
    },

    /// A record cannot be deleted while transactions still reference it
    #[error("{entity} {id} is still referenced by {count} transaction(s)")]
    InUse {
        /// Kind of record
        entity: &'static str,
        /// Identifier of the record
        id: i64,
        /// Number of referencing transactions
        count: u64,
    },

    /// I/O failure (settings file, data directory)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable could not be read
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for a single-violation validation error.
    #[must_use]
    pub fn invalid(field: &'static str, message_key: &'static str) -> Self {
        Self::Validation {
            violations: vec![Violation::new(field, message_key)],
        }
    }

    /// Translation key for presenting this error to a user.
    #[must_use]
    pub const fn message_key(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "message.form_error",
            Self::Balance { .. } => "wallet.balance_error",
            Self::NotFound { .. } => "message.record_not_found",
            Self::Conflict { .. } => "message.concurrent_modification",
            Self::AccessDenied { .. } => "message.access_denied",
            Self::InUse { .. } => "message.record_in_use",
            Self::Config { .. } | Self::Database(_) | Self::Io(_) | Self::EnvVar(_) => {
                "message.internal_error"
            }
        }
    }

    /// Whether the user can fix the input and resubmit.
    #[must_use]
    pub const fn is_correctable(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Balance { .. })
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
