/// Default administrator bootstrap from environment variables
pub mod admin;

/// Default category catalog
pub mod categories;

/// Database configuration and connection management
pub mod database;

/// Application settings loaded from config.toml
pub mod settings;
