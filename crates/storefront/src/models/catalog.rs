//! Catalog domain types.
//!
//! Products reference their category by slug. The catalog is read-only over
//! HTTP; entries are loaded with `vf-cli seed`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vitaforge_core::{CategoryId, ProductId, slugify};

/// A stored image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    /// Storage path, used when the image is replaced.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Label data printed on the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionalInfo {
    pub serving_size: String,
    pub servings_per_container: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<Decimal>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_info: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub short_description: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Decimal>,
    pub stock: u32,
    pub sku: String,
    pub images: Vec<Image>,
    /// Category slug.
    pub category: String,
    pub tags: Vec<String>,
    pub ingredients: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutritional_info: Option<NutritionalInfo>,
    pub featured: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const fn default_active() -> bool {
    true
}

/// A product to insert. The slug is derived from the name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub price: Decimal,
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub stock: u32,
    pub sku: String,
    #[serde(default)]
    pub images: Vec<Image>,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub nutritional_info: Option<NutritionalInfo>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl NewProduct {
    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

/// A category to insert. The slug is derived from the name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl NewCategory {
    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

/// Contents of a catalog seed file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogImport {
    #[serde(default)]
    pub categories: Vec<NewCategory>,
    #[serde(default)]
    pub products: Vec<NewProduct>,
}

/// Product listing filter. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Category slug.
    pub category: Option<String>,
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub active: Option<bool>,
}

impl ProductFilter {
    /// Whether `product` passes every set criterion.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.category.as_ref().is_none_or(|c| *c == product.category)
            && self
                .search
                .as_ref()
                .is_none_or(|s| product.name.to_lowercase().contains(&s.to_lowercase()))
            && self.featured.is_none_or(|f| f == product.featured)
            && self.active.is_none_or(|a| a == product.is_active)
    }
}
