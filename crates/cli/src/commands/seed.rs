//! Catalog seed command.
//!
//! Loads categories and products from a JSON file:
//!
//! ```json
//! {
//!   "categories": [{ "name": "Proteínas", "description": "..." }],
//!   "products": [{ "name": "Whey Protein 1kg", "sku": "WHEY-1KG", ... }]
//! }
//! ```
//!
//! The whole file is validated before anything is written. Entries whose
//! slug or SKU already exists are skipped, so the command can be re-run.

use std::path::Path;

use thiserror::Error;

use vitaforge_storefront::db::{PgCatalogRepository, create_pool};
use vitaforge_storefront::models::CatalogImport;
use vitaforge_storefront::services::{CatalogError, CatalogService, ImportReport};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid seed file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Parse a seed file's contents.
fn parse(content: &str) -> Result<CatalogImport, SeedError> {
    Ok(serde_json::from_str(content)?)
}

/// Import the catalog in `path`.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or the database
/// fails.
pub async fn catalog(path: &Path) -> Result<ImportReport, SeedError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?;
    let import = parse(&content)?;
    tracing::info!(
        path = %path.display(),
        categories = import.categories.len(),
        products = import.products.len(),
        "Loaded seed file"
    );

    let database_url = super::database_url().map_err(SeedError::MissingEnvVar)?;
    let pool = create_pool(&database_url).await?;

    let repo = PgCatalogRepository::new(pool);
    let report = CatalogService::new(&repo).import(&import).await?;

    tracing::info!(
        categories = report.categories,
        products = report.products,
        skipped = report.skipped,
        "Seed complete"
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_parses() {
        let import = parse(include_str!("../../data/catalog.json")).unwrap();

        let slugs: Vec<String> = import.categories.iter().map(|c| c.slug()).collect();
        assert_eq!(
            slugs,
            [
                "proteinas",
                "creatinas",
                "pre-entreno",
                "aminoacidos",
                "vitaminas",
                "quemadores",
                "otros"
            ]
        );
        assert!(
            import
                .products
                .iter()
                .all(|p| slugs.contains(&p.category))
        );
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let err = parse(r#"{"products": [{"name": "Whey"}]}"#).unwrap_err();
        assert!(matches!(err, SeedError::Parse(_)));
        assert!(err.to_string().starts_with("Invalid seed file:"));
    }
}
