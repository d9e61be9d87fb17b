//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! References are one-directional: a transaction points at its wallet,
//! category and author, and tags are linked through `transaction_tags`.

pub mod category;
pub mod tag;
pub mod transaction;
pub mod transaction_tag;
pub mod user;
pub mod wallet;

// Re-export specific types to avoid conflicts
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use tag::{Column as TagColumn, Entity as Tag, Model as TagModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
    TransactionKind,
};
pub use transaction_tag::{
    Column as TransactionTagColumn, Entity as TransactionTag, Model as TransactionTagModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use wallet::{Column as WalletColumn, Entity as Wallet, Model as WalletModel};
