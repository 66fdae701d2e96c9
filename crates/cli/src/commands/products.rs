//! Product commands.
//!
//! # Usage
//!
//! ```bash
//! kicks products list --color black --min-price 100
//! kicks products show <ID>
//! kicks products add --name ... --price 129.99 --sizes "9:10, 10:5" ...
//! kicks products update <ID> --price 99 --featured false
//! kicks products delete <ID>
//! ```

use kicks_core::catalog::{self, FilterCriteria, parse_price_bound};
use kicks_core::forms::{parse_images, parse_price, parse_sizes};
use kicks_core::{Product, ProductForm, ProductId, ProductUpdate, Size};
use kicks_storefront::backend::{BackendClient, ProductQuery};
use tracing::info;

use super::CommandError;

/// Filters for `products list`.
#[derive(Debug, Default)]
pub struct ListFilters {
    pub color: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub featured: bool,
}

impl ListFilters {
    fn criteria(&self) -> FilterCriteria {
        let color = self.color.as_deref().map(str::trim).unwrap_or_default();
        FilterCriteria {
            color: (!color.is_empty()).then(|| color.to_string()),
            min_price: self.min_price.as_deref().and_then(parse_price_bound),
            max_price: self.max_price.as_deref().and_then(parse_price_bound),
        }
    }

    const fn query(&self) -> ProductQuery {
        if self.featured {
            ProductQuery::featured()
        } else {
            ProductQuery::all()
        }
    }
}

/// Optional fields for `products update`, still as typed.
#[derive(Debug, Default)]
pub struct UpdateFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub images: Option<String>,
    pub color: Option<String>,
    pub sizes: Option<String>,
    pub featured: Option<bool>,
}

impl UpdateFields {
    /// Parse the typed fields into a partial update.
    ///
    /// # Errors
    ///
    /// Fails on an invalid price, an image or size list that parses to
    /// nothing, or when no field is set.
    pub fn into_update(self) -> Result<ProductUpdate, CommandError> {
        let images = self.images.as_deref().map(parse_images);
        if images.as_ref().is_some_and(Vec::is_empty) {
            return Err(kicks_core::ProductFormError::NoImages.into());
        }

        let sizes = self.sizes.as_deref().map(parse_sizes);
        if sizes.as_ref().is_some_and(Vec::is_empty) {
            return Err(kicks_core::ProductFormError::NoSizes.into());
        }

        let update = ProductUpdate {
            name: non_blank(self.name),
            description: non_blank(self.description),
            price: self.price.as_deref().map(parse_price).transpose()?,
            images,
            category: None,
            color: non_blank(self.color),
            sizes,
            featured: self.featured,
        };

        if update.is_empty() {
            return Err(CommandError::EmptyUpdate);
        }
        Ok(update)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn format_sizes(sizes: &[Size]) -> String {
    sizes
        .iter()
        .map(|s| {
            if s.is_available() {
                format!("{}({})", s.size, s.stock)
            } else {
                format!("{}(sold out)", s.size)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn log_product(product: &Product) {
    info!(
        "{}  {}  {}  {}{}",
        product.id,
        product.name,
        product.price,
        product.color,
        if product.featured { "  [featured]" } else { "" }
    );
}

/// List products matching the filters.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached.
pub async fn list(
    client: &BackendClient,
    filters: &ListFilters,
) -> Result<(), Box<dyn std::error::Error>> {
    let products = client.list_products(filters.query()).await?;
    let criteria = filters.criteria();
    let matching = catalog::filter(&products, &criteria);

    for product in &matching {
        log_product(product);
    }
    info!("{} of {} products", matching.len(), products.len());
    Ok(())
}

/// Show a product with its sizes and images.
///
/// # Errors
///
/// Returns an error if the product does not exist.
pub async fn show(client: &BackendClient, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let product = client.get_product(&ProductId::new(id)).await?;

    log_product(&product);
    info!("  {}", product.description);
    info!("  sizes: {}", format_sizes(&product.sizes));
    for image in &product.images {
        info!("  image: {image}");
    }
    Ok(())
}

/// Create a product from the admin form fields.
///
/// # Errors
///
/// Returns an error if the form does not validate or the backend rejects it.
pub async fn add(
    client: &BackendClient,
    form: ProductForm,
) -> Result<(), Box<dyn std::error::Error>> {
    let new_product = form.into_new_product().map_err(CommandError::from)?;
    let product = client.create_product(&new_product).await?;

    info!(id = %product.id, "Product created");
    log_product(&product);
    Ok(())
}

/// Apply a partial update to a product.
///
/// # Errors
///
/// Returns an error if no field is set, a field does not parse, or the
/// product does not exist.
pub async fn update(
    client: &BackendClient,
    id: &str,
    fields: UpdateFields,
) -> Result<(), Box<dyn std::error::Error>> {
    let update = fields.into_update()?;
    let product = client.update_product(&ProductId::new(id), &update).await?;

    info!(id = %product.id, "Product updated");
    log_product(&product);
    Ok(())
}

/// Delete a product.
///
/// # Errors
///
/// Returns an error if the product does not exist.
pub async fn delete(client: &BackendClient, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    client.delete_product(&ProductId::new(id)).await?;
    info!(id, "Product deleted");
    Ok(())
}
