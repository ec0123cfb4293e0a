//! Public catalog routes.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};

use vitaforge_core::ProductId;

use crate::db::{Page, PageRequest};
use crate::error::{AppError, Result};
use crate::models::{Category, Product, ProductFilter};
use crate::services::CatalogService;
use crate::state::AppState;

/// Query parameters for the product listing.
///
/// Flags are strings so unknown values disable the filter instead of
/// failing the request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Category slug; `all` or empty means any.
    pub category: Option<String>,
    pub search: Option<String>,
    pub featured: Option<String>,
    /// Defaults to `true`; any value other than `true`/`false` lists both.
    pub active: Option<String>,
}

fn flag(value: Option<&str>) -> Option<bool> {
    match value {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

impl ProductQuery {
    fn into_parts(self) -> (ProductFilter, PageRequest) {
        let defaults = PageRequest::default();
        let filter = ProductFilter {
            category: self
                .category
                .filter(|c| !c.trim().is_empty() && c != "all"),
            search: self.search.filter(|s| !s.trim().is_empty()),
            featured: flag(self.featured.as_deref()),
            active: flag(Some(self.active.as_deref().unwrap_or("true"))),
        };
        let page = PageRequest {
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        };
        (filter, page)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<Product>,
    pub pagination: ProductPagination,
}

impl From<Page<Product>> for ProductList {
    fn from(page: Page<Product>) -> Self {
        Self {
            pagination: ProductPagination {
                total: page.total,
                page: page.request.page,
                limit: page.request.limit,
                total_pages: page.pages(),
            },
            products: page.items,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CategoryQuery {
    pub active: Option<String>,
}

/// Products, newest first, active only unless `active` says otherwise.
pub async fn products(
    State(state): State<AppState>,
    query: std::result::Result<Query<ProductQuery>, QueryRejection>,
) -> Result<Json<ProductList>> {
    let Query(query) = query?;
    let (filter, page) = query.into_parts();

    let products = CatalogService::new(state.catalog())
        .products(&filter, page)
        .await?;

    Ok(Json(products.into()))
}

/// One product by id.
pub async fn product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let id: ProductId = id
        .parse()
        .map_err(|_| AppError::NotFound("Product not found".to_string()))?;

    let product = CatalogService::new(state.catalog()).product(id).await?;

    Ok(Json(product))
}

/// Categories by name; `?active=true` hides inactive ones.
pub async fn categories(
    State(state): State<AppState>,
    query: std::result::Result<Query<CategoryQuery>, QueryRejection>,
) -> Result<Json<Vec<Category>>> {
    let Query(query) = query?;
    let active_only = query.active.as_deref() == Some("true");

    let categories = CatalogService::new(state.catalog())
        .categories(active_only)
        .await?;

    Ok(Json(categories))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults_to_active_products() {
        let (filter, page) = ProductQuery::default().into_parts();

        assert_eq!(
            filter,
            ProductFilter {
                active: Some(true),
                ..ProductFilter::default()
            }
        );
        assert_eq!(page, PageRequest::default());
    }

    #[test]
    fn test_query_flags_and_category() {
        let (filter, _) = ProductQuery {
            category: Some("all".to_owned()),
            featured: Some("false".to_owned()),
            active: Some("any".to_owned()),
            search: Some("  ".to_owned()),
            ..ProductQuery::default()
        }
        .into_parts();

        assert_eq!(filter.category, None);
        assert_eq!(filter.featured, Some(false));
        assert_eq!(filter.active, None);
        assert_eq!(filter.search, None);
    }
}
