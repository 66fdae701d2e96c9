//! Kicks CLI - catalog administration and shopping from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog with filters
//! kicks products list --color black --max-price 150
//!
//! # Add a product (admin)
//! kicks products add --name "Court Classic" --description "Low-top leather" \
//!     --price 129.99 --images https://cdn.example.com/cc.jpg --color white \
//!     --sizes "8:10, 9:15, 10:20" --featured
//!
//! # Shop as a guest
//! kicks session new
//! kicks cart add --session guest_k3x9q0a1z <PRODUCT_ID> 9
//! kicks cart show --session guest_k3x9q0a1z
//!
//! # Drops
//! kicks subscribe fan@example.com
//! kicks subscribers
//! ```
//!
//! # Environment Variables
//!
//! - `KICKS_API_URL` - Backend REST API base URL (or `--api-url`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::time::Duration;

use clap::{Parser, Subcommand};
use kicks_storefront::backend::BackendClient;
use kicks_storefront::config::{BackendConfig, DEFAULT_API_URL};
use url::Url;

mod commands;

#[derive(Parser)]
#[command(name = "kicks")]
#[command(author, version, about = "Kicks CLI tools")]
struct Cli {
    /// Backend REST API base URL
    #[arg(long, global = true, env = "KICKS_API_URL", default_value = DEFAULT_API_URL)]
    api_url: Url,

    /// Backend request timeout in seconds
    #[arg(long, global = true, env = "KICKS_API_TIMEOUT_SECS", default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Inspect and change a guest cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage guest sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Subscribe an email to drop announcements
    Subscribe {
        /// Email address
        email: String,
    },
    /// List drop subscribers
    Subscribers,
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products, optionally filtered
    List {
        /// Only products of this color (case-insensitive)
        #[arg(long)]
        color: Option<String>,

        /// Minimum price, inclusive
        #[arg(long)]
        min_price: Option<String>,

        /// Maximum price, inclusive
        #[arg(long)]
        max_price: Option<String>,

        /// Only featured products
        #[arg(long)]
        featured: bool,
    },
    /// Show one product with its sizes
    Show {
        /// Product ID
        id: String,
    },
    /// Create a product
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,

        /// Price in dollars, e.g. 129.99
        #[arg(long)]
        price: String,

        /// Comma-separated image URLs
        #[arg(long)]
        images: String,

        #[arg(long)]
        color: String,

        /// Comma-separated `size:stock` pairs, e.g. "8:10, 9:15"
        #[arg(long)]
        sizes: String,

        /// Show on the landing page
        #[arg(long)]
        featured: bool,
    },
    /// Change some fields of a product
    Update {
        /// Product ID
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Price in dollars
        #[arg(long)]
        price: Option<String>,

        /// Comma-separated image URLs
        #[arg(long)]
        images: Option<String>,

        #[arg(long)]
        color: Option<String>,

        /// Comma-separated `size:stock` pairs
        #[arg(long)]
        sizes: Option<String>,

        /// Featured flag (true or false)
        #[arg(long)]
        featured: Option<bool>,
    },
    /// Delete a product
    Delete {
        /// Product ID
        id: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the priced cart
    Show {
        /// Guest session token
        #[arg(short, long)]
        session: String,
    },
    /// Add a product in a size
    Add {
        /// Guest session token
        #[arg(short, long)]
        session: String,

        /// Product ID
        product_id: String,

        /// Size label, e.g. 9 or 10.5
        size: String,

        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
    },
    /// Set the quantity of a cart line
    Update {
        /// Guest session token
        #[arg(short, long)]
        session: String,

        /// Cart line ID
        line_id: String,

        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
    },
    /// Remove a cart line
    Remove {
        /// Guest session token
        #[arg(short, long)]
        session: String,

        /// Cart line ID
        line_id: String,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Generate a new guest session token
    New,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kicks_cli=info,kicks_storefront=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = BackendConfig {
        timeout: Duration::from_secs(cli.timeout),
        ..BackendConfig::new(cli.api_url)
    };
    let client = BackendClient::new(&config)?;

    match cli.command {
        Commands::Products { action } => match action {
            ProductAction::List {
                color,
                min_price,
                max_price,
                featured,
            } => {
                let filters = commands::products::ListFilters {
                    color,
                    min_price,
                    max_price,
                    featured,
                };
                commands::products::list(&client, &filters).await?;
            }
            ProductAction::Show { id } => commands::products::show(&client, &id).await?,
            ProductAction::Add {
                name,
                description,
                price,
                images,
                color,
                sizes,
                featured,
            } => {
                let form = kicks_core::forms::ProductForm {
                    name,
                    description,
                    price,
                    images,
                    color,
                    sizes,
                    featured,
                };
                commands::products::add(&client, form).await?;
            }
            ProductAction::Update {
                id,
                name,
                description,
                price,
                images,
                color,
                sizes,
                featured,
            } => {
                let fields = commands::products::UpdateFields {
                    name,
                    description,
                    price,
                    images,
                    color,
                    sizes,
                    featured,
                };
                commands::products::update(&client, &id, fields).await?;
            }
            ProductAction::Delete { id } => commands::products::delete(&client, &id).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show { session } => commands::cart::show(&client, &session).await?,
            CartAction::Add {
                session,
                product_id,
                size,
                quantity,
            } => commands::cart::add(&client, &session, &product_id, &size, quantity).await?,
            CartAction::Update {
                session,
                line_id,
                quantity,
            } => commands::cart::update(&client, &session, &line_id, quantity).await?,
            CartAction::Remove { session, line_id } => {
                commands::cart::remove(&client, &session, &line_id).await?;
            }
        },
        Commands::Session { action } => match action {
            SessionAction::New => commands::cart::new_session(),
        },
        Commands::Subscribe { email } => commands::drops::subscribe(&client, &email).await?,
        Commands::Subscribers => commands::drops::list(&client).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_rejects_zero_quantity() {
        let parsed = Cli::try_parse_from([
            "kicks", "cart", "update", "--session", "guest_abc", "line-1", "0",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_parses_product_filters() {
        let cli = Cli::try_parse_from([
            "kicks",
            "--api-url",
            "http://127.0.0.1:9000/api",
            "products",
            "list",
            "--color",
            "black",
            "--featured",
        ]);
        assert!(cli.is_ok());
    }
}
