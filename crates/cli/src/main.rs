//! Sandpiper CLI - drives the storefront client runtime from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Authenticate against the remote API
//! sandpiper login -e shopper@example.com -p 'secret'
//!
//! # Browse the catalog
//! sandpiper products list
//! sandpiper products show desk-lamp
//!
//! # Work with the local cart (persists across invocations)
//! sandpiper cart add desk-lamp --quantity 2
//! sandpiper cart list
//!
//! # Place an order from the cart contents
//! sandpiper order place --full-name "Ada Lovelace" --phone 5550100 \
//!     --line1 "1 Analytical Way" --city London --state LDN \
//!     --postal-code "E1 6AN" --country GB
//! ```
//!
//! # Environment Variables
//!
//! - `SANDPIPER_API_URL` - Base URL of the remote storefront API (required)
//! - `SANDPIPER_DATA_DIR` - Directory for persisted state (default: `.sandpiper`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use sandpiper_client::{ClientConfig, StorefrontRuntime};

mod commands;

#[derive(Parser)]
#[command(name = "sandpiper")]
#[command(author, version, about = "Sandpiper storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to the remote API
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Create an account and log in
    Register {
        /// First name
        #[arg(long)]
        first_name: String,

        /// Last name
        #[arg(long)]
        last_name: String,

        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Discard stored credentials (the cart is kept)
    Logout,
    /// Show the currently authenticated user
    Whoami,
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage the local cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place and review orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products
    List {
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Search query
        #[arg(long)]
        search: Option<String>,
    },
    /// Show a single product by slug
    Show {
        /// Product slug
        slug: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and subtotal
    List,
    /// Add a product (by slug) to the cart
    Add {
        /// Product slug
        slug: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Variant ID to add
        #[arg(long)]
        variant: Option<String>,
    },
    /// Remove an item from the cart
    Remove {
        /// Product ID
        product_id: String,

        /// Variant ID
        #[arg(long)]
        variant: Option<String>,
    },
    /// Set an item's quantity (0 removes it)
    Set {
        /// Product ID
        product_id: String,

        /// New quantity
        quantity: u32,

        /// Variant ID
        #[arg(long)]
        variant: Option<String>,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrderAction {
    /// Place an order from the current cart contents
    Place {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        line1: String,
        #[arg(long)]
        line2: Option<String>,
        #[arg(long)]
        city: String,
        #[arg(long)]
        state: String,
        #[arg(long)]
        postal_code: String,
        #[arg(long)]
        country: String,
        /// Payment method identifier
        #[arg(long, default_value = "cod")]
        payment_method: String,
    },
    /// List past orders
    List,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let mut runtime = StorefrontRuntime::init(config)?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&mut runtime, &email, &password).await?;
        }
        Commands::Register {
            first_name,
            last_name,
            email,
            password,
        } => {
            commands::auth::register(&mut runtime, &first_name, &last_name, &email, &password)
                .await?;
        }
        Commands::Logout => commands::auth::logout(&mut runtime)?,
        Commands::Whoami => commands::auth::whoami(&mut runtime).await?,
        Commands::Products { action } => match action {
            ProductsAction::List { page, search } => {
                commands::catalog::list(&runtime, page, search.as_deref()).await?;
            }
            ProductsAction::Show { slug } => commands::catalog::show(&runtime, &slug).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::List => commands::cart::list(&runtime),
            CartAction::Add {
                slug,
                quantity,
                variant,
            } => commands::cart::add(&mut runtime, &slug, quantity, variant).await?,
            CartAction::Remove {
                product_id,
                variant,
            } => commands::cart::remove(&mut runtime, &product_id, variant)?,
            CartAction::Set {
                product_id,
                quantity,
                variant,
            } => commands::cart::set(&mut runtime, &product_id, quantity, variant)?,
            CartAction::Clear => commands::cart::clear(&mut runtime)?,
        },
        Commands::Order { action } => match action {
            OrderAction::Place {
                full_name,
                phone,
                line1,
                line2,
                city,
                state,
                postal_code,
                country,
                payment_method,
            } => {
                let address = sandpiper_client::ShippingAddress {
                    full_name,
                    phone,
                    address_line1: line1,
                    address_line2: line2,
                    city,
                    state,
                    postal_code,
                    country,
                };
                commands::order::place(&mut runtime, address, &payment_method).await?;
            }
            OrderAction::List => commands::order::list(&runtime).await?,
        },
    }
    Ok(())
}
