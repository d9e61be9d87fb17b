/// Database connection management and schema creation
pub mod database;

/// Application settings loaded from `budgetly.toml`
pub mod settings;
