/// Ownership checks for viewing, editing and deleting transactions
pub mod access;
/// Guarded wallet balance writes
pub mod balance;
/// Category management
pub mod category;
/// Filtered transaction listing
pub mod filter;
/// Page-based listing helpers
pub mod pagination;
/// URL-safe slugs
pub mod slug;
/// Tag management
pub mod tag;
/// Transaction reconciler - apply, edit and remove
pub mod transaction;
/// User records
pub mod user;
/// Field validation and violation reporting
pub mod validation;
/// Wallet management
pub mod wallet;
