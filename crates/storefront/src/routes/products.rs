//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use kicks_core::catalog::{self, FilterCriteria};
use kicks_core::{Price, Product, ProductId, Size};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::backend::ProductQuery;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product card data for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub price_display: String,
    pub image: Option<String>,
    pub color: String,
    pub featured: bool,
    pub in_stock: bool,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            price_display: product.price.display(),
            image: product.primary_image().map(String::from),
            color: product.color.clone(),
            featured: product.featured,
            in_stock: product.is_in_stock(),
        }
    }
}

/// Size button data for the detail view.
#[derive(Debug, Clone, Serialize)]
pub struct SizeView {
    pub size: String,
    pub stock: u32,
    /// Sold-out sizes are shown but cannot be selected.
    pub available: bool,
}

impl From<&Size> for SizeView {
    fn from(size: &Size) -> Self {
        Self {
            size: size.size.clone(),
            stock: size.stock,
            available: size.is_available(),
        }
    }
}

/// Product detail data.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetailView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub price_display: String,
    pub images: Vec<String>,
    pub category: String,
    pub color: String,
    pub featured: bool,
    pub sizes: Vec<SizeView>,
    pub in_stock: bool,
}

impl From<Product> for ProductDetailView {
    fn from(product: Product) -> Self {
        let sizes = product.sizes.iter().map(SizeView::from).collect();
        let in_stock = product.is_in_stock();
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price_display: product.price.display(),
            price: product.price,
            images: product.images,
            category: product.category,
            color: product.color,
            featured: product.featured,
            sizes,
            in_stock,
        }
    }
}

/// Catalog query parameters.
///
/// Kept as raw strings: the shop filter form sends empty fields, and
/// anything that does not parse simply does not constrain.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub min_price: String,
    #[serde(default)]
    pub max_price: String,
    #[serde(default)]
    pub featured: String,
}

impl CatalogQuery {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria::from_form(&self.color, &self.min_price, &self.max_price)
    }

    fn product_query(&self) -> ProductQuery {
        let featured = match self.featured.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        };
        ProductQuery { featured }
    }
}

/// Filtered catalog listing.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogView {
    pub products: Vec<ProductSummary>,
    /// Products matching the filters.
    pub count: usize,
    /// Every color in the unfiltered list, for the color facet.
    pub colors: Vec<String>,
    pub filters: FilterCriteria,
}

impl CatalogView {
    /// Apply `criteria` to `products`.
    #[must_use]
    pub fn build(products: &[Product], criteria: FilterCriteria) -> Self {
        let filtered = catalog::filter(products, &criteria);
        Self {
            count: filtered.len(),
            products: filtered.iter().map(ProductSummary::from).collect(),
            colors: catalog::available_colors(products),
            filters: criteria,
        }
    }
}

/// List products, filtered by color and price range.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogView>> {
    let products = state
        .backend()
        .list_products(query.product_query())
        .await
        .map_err(AppError::action("Failed to load products"))?;

    Ok(Json(CatalogView::build(&products, query.criteria())))
}

/// Featured products for the landing page.
#[instrument(skip(state))]
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<ProductSummary>>> {
    let products = state
        .backend()
        .list_products(ProductQuery::featured())
        .await
        .map_err(AppError::action("Failed to load featured products"))?;

    Ok(Json(products.iter().map(ProductSummary::from).collect()))
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetailView>> {
    let product = state
        .backend()
        .get_product(&ProductId::new(id))
        .await
        .map_err(AppError::lookup("Product", "Failed to load product"))?;

    Ok(Json(ProductDetailView::from(product)))
}
