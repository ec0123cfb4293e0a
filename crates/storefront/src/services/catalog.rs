//! Catalog browsing and seed imports.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use vitaforge_core::ProductId;

use crate::db::{CatalogRepository, Page, PageRequest, RepositoryError};
use crate::models::{CatalogImport, Category, NewCategory, NewProduct, Product, ProductFilter};

const MAX_CATEGORY_NAME: usize = 50;
const MAX_CATEGORY_DESCRIPTION: usize = 500;
const MAX_PRODUCT_NAME: usize = 100;
const MAX_SHORT_DESCRIPTION: usize = 200;
/// Prices are stored as NUMERIC(14, 2).
const MAX_PRICE_UNITS: i64 = 1_000_000_000_000;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("product not found")]
    NotFound,

    /// A seed entry failed validation.
    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Counts reported by [`CatalogService::import`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub categories: usize,
    pub products: usize,
    /// Entries whose slug or SKU already existed.
    pub skipped: usize,
}

/// Catalog service.
pub struct CatalogService<'a> {
    catalog: &'a dyn CatalogRepository,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(catalog: &'a dyn CatalogRepository) -> Self {
        Self { catalog }
    }

    /// Products matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database fails.
    pub async fn products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, CatalogError> {
        Ok(self
            .catalog
            .list_products(filter, page.normalized())
            .await?)
    }

    /// One product, active or not.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.catalog
            .get_product(id)
            .await?
            .ok_or(CatalogError::NotFound)
    }

    /// # Errors
    ///
    /// Returns an error if the database fails.
    pub async fn categories(&self, active_only: bool) -> Result<Vec<Category>, CatalogError> {
        Ok(self.catalog.list_categories(active_only).await?)
    }

    /// Validate every entry, then insert categories before products.
    ///
    /// Nothing is written if any entry is invalid. Entries that collide with
    /// an existing slug or SKU are skipped, so re-running a seed file is safe.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` naming the first bad entry.
    #[instrument(skip_all, fields(categories = import.categories.len(), products = import.products.len()))]
    pub async fn import(&self, import: &CatalogImport) -> Result<ImportReport, CatalogError> {
        for category in &import.categories {
            validate_category(category)?;
        }
        for product in &import.products {
            validate_product(product)?;
        }

        let mut report = ImportReport::default();

        for category in &import.categories {
            match self.catalog.create_category(category).await {
                Ok(_) => report.categories += 1,
                Err(RepositoryError::Conflict(_)) => {
                    tracing::info!(name = %category.name, "Category exists, skipping");
                    report.skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        for product in &import.products {
            match self.catalog.create_product(product).await {
                Ok(_) => report.products += 1,
                Err(RepositoryError::Conflict(_)) => {
                    tracing::info!(sku = %product.sku, "Product exists, skipping");
                    report.skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(
            categories = report.categories,
            products = report.products,
            skipped = report.skipped,
            "Catalog imported"
        );
        Ok(report)
    }
}

fn invalid(what: &str, name: &str, problem: &str) -> CatalogError {
    CatalogError::Invalid(format!("{what} {name:?}: {problem}"))
}

fn validate_category(category: &NewCategory) -> Result<(), CatalogError> {
    let name = category.name.trim();
    if name.is_empty() || category.slug().is_empty() {
        return Err(invalid("category", name, "name is required"));
    }
    if name.chars().count() > MAX_CATEGORY_NAME {
        return Err(invalid(
            "category",
            name,
            &format!("name must be at most {MAX_CATEGORY_NAME} characters"),
        ));
    }
    if category
        .description
        .as_ref()
        .is_some_and(|d| d.chars().count() > MAX_CATEGORY_DESCRIPTION)
    {
        return Err(invalid(
            "category",
            name,
            &format!("description must be at most {MAX_CATEGORY_DESCRIPTION} characters"),
        ));
    }
    Ok(())
}

fn validate_product(product: &NewProduct) -> Result<(), CatalogError> {
    let name = product.name.trim();
    let required = [
        ("name", name),
        ("description", product.description.trim()),
        ("shortDescription", product.short_description.trim()),
        ("sku", product.sku.trim()),
        ("category", product.category.trim()),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
        return Err(invalid("product", name, &format!("{field} is required")));
    }
    if product.slug().is_empty() {
        return Err(invalid("product", name, "name must contain letters or digits"));
    }
    if name.chars().count() > MAX_PRODUCT_NAME {
        return Err(invalid(
            "product",
            name,
            &format!("name must be at most {MAX_PRODUCT_NAME} characters"),
        ));
    }
    if product.short_description.chars().count() > MAX_SHORT_DESCRIPTION {
        return Err(invalid(
            "product",
            name,
            &format!("shortDescription must be at most {MAX_SHORT_DESCRIPTION} characters"),
        ));
    }
    for (field, price) in [
        ("price", Some(product.price)),
        ("compareAtPrice", product.compare_at_price),
    ] {
        if let Some(price) = price
            && (price < Decimal::ZERO
                || price.normalize().scale() > 2
                || price >= Decimal::from(MAX_PRICE_UNITS))
        {
            return Err(invalid(
                "product",
                name,
                &format!("{field} must be a non-negative amount with at most 2 decimal places"),
            ));
        }
    }
    if i32::try_from(product.stock).is_err() {
        return Err(invalid("product", name, "stock is too large"));
    }
    if product
        .nutritional_info
        .as_ref()
        .is_some_and(|info| info.servings_per_container == 0)
    {
        return Err(invalid(
            "product",
            name,
            "servingsPerContainer must be at least 1",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::NutritionalInfo;

    fn product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            description: "Proteína de suero".to_owned(),
            short_description: "24 g de proteína".to_owned(),
            price: Decimal::new(2_500_000, 2),
            compare_at_price: None,
            stock: 10,
            sku: "WHEY-1KG".to_owned(),
            images: Vec::new(),
            category: "proteinas".to_owned(),
            tags: Vec::new(),
            ingredients: Vec::new(),
            nutritional_info: None,
            featured: false,
            is_active: true,
        }
    }

    fn message(err: CatalogError) -> String {
        match err {
            CatalogError::Invalid(msg) => msg,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_valid_product_passes() {
        assert!(validate_product(&product("Whey Protein 1kg")).is_ok());
    }

    #[test]
    fn test_product_rules() {
        let mut sku_missing = product("Whey");
        sku_missing.sku = "  ".to_owned();
        assert_eq!(
            message(validate_product(&sku_missing).unwrap_err()),
            "product \"Whey\": sku is required"
        );

        let mut negative = product("Whey");
        negative.price = Decimal::from(-1);
        assert!(validate_product(&negative).is_err());

        let mut fractional = product("Whey");
        fractional.compare_at_price = Some(Decimal::new(10_001, 3));
        assert!(validate_product(&fractional).is_err());

        let mut no_servings = product("Whey");
        no_servings.nutritional_info = Some(NutritionalInfo {
            serving_size: "30 g".to_owned(),
            servings_per_container: 0,
            calories: None,
            protein: None,
            carbs: None,
            fat: None,
            additional_info: std::collections::BTreeMap::new(),
        });
        assert!(validate_product(&no_servings).is_err());

        assert!(validate_product(&product(&"x".repeat(101))).is_err());
        assert!(validate_product(&product("¡¿!?")).is_err());
    }

    #[test]
    fn test_category_rules() {
        let category = |name: &str| NewCategory {
            name: name.to_owned(),
            description: None,
            image: None,
            is_active: true,
        };

        assert!(validate_category(&category("Proteínas")).is_ok());
        assert!(validate_category(&category(" ")).is_err());
        assert!(validate_category(&category(&"x".repeat(51))).is_err());
    }
}
