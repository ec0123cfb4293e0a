//! Catalog repository.
//!
//! Images and nutritional info are stored as JSONB, tags and ingredients as
//! `TEXT[]`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use vitaforge_core::{CategoryId, ProductId};

use super::{Page, PageRequest, RepositoryError, to_i64, to_u64};
use crate::models::{
    Category, Image, NewCategory, NewProduct, NutritionalInfo, Product, ProductFilter,
};

/// Port for catalog persistence.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Products matching `filter`, newest first.
    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Categories ordered by name.
    async fn list_categories(&self, active_only: bool) -> Result<Vec<Category>, RepositoryError>;

    /// Returns [`RepositoryError::Conflict`] if the slug or SKU is taken.
    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError>;

    /// Returns [`RepositoryError::Conflict`] if the name or slug is taken.
    async fn create_category(&self, category: &NewCategory) -> Result<Category, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    slug: String,
    description: String,
    short_description: String,
    price: Decimal,
    compare_at_price: Option<Decimal>,
    stock: i32,
    sku: String,
    images: Json<Vec<Image>>,
    category: String,
    tags: Vec<String>,
    ingredients: Vec<String>,
    nutritional_info: Option<Json<NutritionalInfo>>,
    featured: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let stock = u32::try_from(row.stock).map_err(|_| {
            RepositoryError::DataCorruption(format!("product {} has negative stock", row.id))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            short_description: row.short_description,
            price: row.price,
            compare_at_price: row.compare_at_price,
            stock,
            sku: row.sku,
            images: row.images.0,
            category: row.category,
            tags: row.tags,
            ingredients: row.ingredients,
            nutritional_info: row.nutritional_info.map(|info| info.0),
            featured: row.featured,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: String,
    description: Option<String>,
    image: Option<Json<Image>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            image: row.image.map(|image| image.0),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, slug, description, short_description, price, \
     compare_at_price, stock, sku, images, category, tags, ingredients, nutritional_info, \
     featured, is_active, created_at, updated_at";

const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, image, is_active, created_at, updated_at";

const PRODUCT_FILTER: &str = "($1::text IS NULL OR category = $1)
       AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%' ESCAPE '\\')
       AND ($3::boolean IS NULL OR featured = $3)
       AND ($4::boolean IS NULL OR is_active = $4)";

/// Escape `LIKE` wildcards so a search matches literally.
fn like_literal(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len());
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `PostgreSQL` implementation of [`CatalogRepository`].
#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        let search = filter.search.as_deref().map(like_literal);

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE {PRODUCT_FILTER}
             ORDER BY created_at DESC, id DESC
             LIMIT $5 OFFSET $6"
        ))
        .bind(filter.category.as_deref())
        .bind(search.as_deref())
        .bind(filter.featured)
        .bind(filter.active)
        .bind(i64::from(page.limit))
        .bind(to_i64(page.offset()))
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM products WHERE {PRODUCT_FILTER}"))
                .bind(filter.category.as_deref())
                .bind(search.as_deref())
                .bind(filter.featured)
                .bind(filter.active)
                .fetch_one(&self.pool)
                .await?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<_, _>>()?,
            total: to_u64(total),
            request: page,
        })
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_categories(&self, active_only: bool) -> Result<Vec<Category>, RepositoryError> {
        let rows: Vec<CategoryRow> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories
             WHERE NOT $1 OR is_active
             ORDER BY name ASC"
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let stock = i32::try_from(product.stock)
            .map_err(|_| RepositoryError::DataCorruption("stock out of range".to_owned()))?;

        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO products (
                 name, slug, description, short_description, price, compare_at_price, stock,
                 sku, images, category, tags, ingredients, nutritional_info, featured, is_active
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&product.name)
        .bind(product.slug())
        .bind(&product.description)
        .bind(&product.short_description)
        .bind(product.price)
        .bind(product.compare_at_price)
        .bind(stock)
        .bind(&product.sku)
        .bind(Json(&product.images))
        .bind(&product.category)
        .bind(&product.tags)
        .bind(&product.ingredients)
        .bind(product.nutritional_info.as_ref().map(Json))
        .bind(product.featured)
        .bind(product.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "product slug or sku"))?;

        row.try_into()
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, RepositoryError> {
        let row: CategoryRow = sqlx::query_as(&format!(
            "INSERT INTO categories (name, slug, description, image, is_active)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(&category.name)
        .bind(category.slug())
        .bind(&category.description)
        .bind(category.image.as_ref().map(Json))
        .bind(category.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "category"))?;

        Ok(row.into())
    }
}
