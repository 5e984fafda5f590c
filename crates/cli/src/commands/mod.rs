//! CLI subcommand implementations.

pub mod migrate;
pub mod shop;

/// Read `DATABASE_URL`, loading `.env` first.
fn database_url() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
}
