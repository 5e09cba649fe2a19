//! Shopfront CLI - a terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! shop products --search "running shoes"
//! shop product 64f0c1a2e4b0a1b2c3d4e5f6
//!
//! # Fill the cart (works as a guest)
//! shop cart add 64f0c1a2e4b0a1b2c3d4e5f6 --size M
//! shop cart update 1 3
//!
//! # Sign in; the guest cart is merged into the account cart
//! shop login -e asha@example.com
//!
//! # Coupons need an account
//! shop coupon apply SAVE10
//!
//! # Check out
//! shop orders place --city Pune --phone 9999999999
//! ```
//!
//! # Commands
//!
//! - `products`, `product`, `suggest` - Browse the catalog
//! - `cart` - Show and change the cart
//! - `coupon` - Apply or remove a coupon
//! - `login`, `register`, `logout`, `whoami` - Manage the session
//! - `orders` - Place, list and cancel orders
//!
//! Every invocation restores the stored session, loads the cart, performs
//! one action and exits. Records live in `SHOPFRONT_PROFILE_DIR`.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use shopfront_client::ClientConfig;
use shopfront_client::api::ApiClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{CommandError, Shop};

#[derive(Parser)]
#[command(name = "shop")]
#[command(author, version, about = "Shopfront terminal storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products {
        /// Full-text search
        #[arg(short, long)]
        search: Option<String>,

        /// Restrict to a category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one product and cheaper alternatives
    Product {
        /// Product ID
        id: String,
    },
    /// Autocomplete product names
    Suggest {
        /// Partial query
        query: String,
    },
    /// Show and change the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Apply or remove a coupon
    Coupon {
        #[command(subcommand)]
        action: CouponAction,
    },
    /// Sign in
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Create an account and sign in
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Sign out
    Logout,
    /// Show who is signed in
    Whoami,
    /// Place, list and cancel orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart (default)
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        product: String,

        /// Size to add
        #[arg(short, long)]
        size: Option<String>,
    },
    /// Remove a line (by position or line ID)
    Remove {
        line: String,
    },
    /// Set the quantity of a line; 0 removes it
    Update {
        line: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum CouponAction {
    /// Apply a coupon code
    Apply {
        code: String,
    },
    /// Remove the applied coupon
    Remove,
}

#[derive(Subcommand)]
enum OrderAction {
    /// Order the cart contents
    Place(commands::orders::PlaceArgs),
    /// List past orders
    History,
    /// Cancel an order
    Cancel {
        /// Order ID
        id: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(config.sentry_environment.clone().into()),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Warnings and errors become Sentry events; info and debug become breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopfront_client=warn,shopfront_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli, &config).await {
        tracing::debug!(error = ?e, "Command failed");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), CommandError> {
    let api = ApiClient::new(&config.api);

    // Catalog commands need neither a session nor a cart.
    match &cli.command {
        Commands::Products { search, category } => {
            return commands::catalog::list(&api, search.as_deref(), category.as_deref()).await;
        }
        Commands::Product { id } => return commands::catalog::show(&api, id).await,
        Commands::Suggest { query } => return commands::catalog::suggest(&api, query).await,
        _ => {}
    }

    let mut shop = Shop::open(api, config).await?;
    match cli.command {
        Commands::Cart { action } => match action.unwrap_or(CartAction::Show) {
            CartAction::Show => commands::cart::show(&shop),
            CartAction::Add { product, size } => {
                commands::cart::add(&mut shop, &product, size).await?;
            }
            CartAction::Remove { line } => commands::cart::remove(&mut shop, &line).await?,
            CartAction::Update { line, quantity } => {
                commands::cart::update(&mut shop, &line, quantity).await?;
            }
            CartAction::Clear => commands::cart::clear(&mut shop).await,
        },
        Commands::Coupon { action } => match action {
            CouponAction::Apply { code } => commands::cart::apply_coupon(&mut shop, &code).await?,
            CouponAction::Remove => commands::cart::remove_coupon(&mut shop),
        },
        Commands::Login { email } => commands::account::login(&mut shop, &email).await?,
        Commands::Register { name, email } => {
            commands::account::register(&mut shop, &name, &email).await?;
        }
        Commands::Logout => commands::account::logout(&mut shop).await,
        Commands::Whoami => commands::account::whoami(&shop),
        Commands::Orders { action } => match action {
            OrderAction::Place(args) => commands::orders::place(&mut shop, args).await?,
            OrderAction::History => commands::orders::history(&shop).await?,
            OrderAction::Cancel { id } => commands::orders::cancel(&shop, &id).await?,
        },
        Commands::Products { .. } | Commands::Product { .. } | Commands::Suggest { .. } => {}
    }
    Ok(())
}
