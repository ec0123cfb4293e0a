//! CLI subcommands.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Environment variables checked for the database URL, in order.
const DATABASE_URL_VARS: [&str; 2] = ["VITAFORGE_DATABASE_URL", "DATABASE_URL"];

/// Read the database URL from the environment (after loading `.env`).
///
/// Returns the name of the variable that was missing when none is set.
pub fn database_url() -> Result<SecretString, &'static str> {
    dotenvy::dotenv().ok();

    DATABASE_URL_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .map(SecretString::from)
        .ok_or(DATABASE_URL_VARS[0])
}
