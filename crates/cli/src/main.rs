//! Bazaar CLI - cart, coupon and wishlist management.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart with totals
//! bazaar cart show
//!
//! # Add a product
//! bazaar cart add --id 42 --name "Cold Brew Kit" --sku CB-1 --price 500
//!
//! # Apply a coupon
//! bazaar coupon apply SAVE10
//!
//! # Prepare an order
//! bazaar checkout --json
//! ```
//!
//! # Commands
//!
//! - `cart` - Show and edit the cart
//! - `coupon` - Apply or remove a coupon code
//! - `wishlist` - Products saved for later
//! - `checkout` - Re-validate the coupon and print an order draft

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io;
use std::process::ExitCode;

use bazaar_core::ProductId;
use bazaar_storefront::config::StorefrontConfig;
use bazaar_storefront::{AppError, AppState};
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{CliError, ProductArgs};

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Apply or remove a coupon code
    Coupon {
        #[command(subcommand)]
        action: CouponAction,
    },
    /// Manage products saved for later
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Re-validate the coupon and prepare an order draft
    Checkout {
        /// Print the order draft as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show line items and totals
    Show,
    /// Add a product with quantity 1
    Add(ProductArgs),
    /// Set the quantity of a line item (values below 1 are ignored)
    Update {
        /// Product ID
        id: ProductId,
        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line item
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Move a line item to the wishlist
    Save {
        /// Product ID
        id: ProductId,
    },
    /// Empty the cart and drop the coupon
    Clear,
}

#[derive(Subcommand)]
enum CouponAction {
    /// Validate a code against the current subtotal and apply it
    Apply {
        /// Coupon code
        code: String,
    },
    /// Remove the applied coupon
    Remove,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// List saved products
    Show,
    /// Save a product
    Add(ProductArgs),
    /// Remove a saved product
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Move a saved product into the cart
    Move {
        /// Product ID
        id: ProductId,
    },
    /// Remove every saved product
    Clear,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber. Logs go to stderr so stdout stays clean.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bazaar_storefront=info,bazaar_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            CliError::from(AppError::from(e)).report();
            return ExitCode::FAILURE;
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), CliError> {
    let mut state = AppState::new(config)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state, &mut out)?,
            CartAction::Add(product) => commands::cart::add(&mut state, product, &mut out)?,
            CartAction::Update { id, quantity } => {
                commands::cart::update(&mut state, id, quantity, &mut out)?;
            }
            CartAction::Remove { id } => commands::cart::remove(&mut state, id, &mut out)?,
            CartAction::Save { id } => commands::cart::save_for_later(&mut state, id, &mut out)?,
            CartAction::Clear => commands::cart::clear(&mut state, &mut out)?,
        },
        Commands::Coupon { action } => match action {
            CouponAction::Apply { code } => {
                commands::coupon::apply(&mut state, &code, &mut out).await?;
            }
            CouponAction::Remove => commands::coupon::remove(&mut state, &mut out)?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show(&state, &mut out)?,
            WishlistAction::Add(product) => {
                commands::wishlist::add(&mut state, product, &mut out)?;
            }
            WishlistAction::Remove { id } => commands::wishlist::remove(&mut state, id, &mut out)?,
            WishlistAction::Move { id } => commands::wishlist::move_to_cart(&mut state, id, &mut out)?,
            WishlistAction::Clear => commands::wishlist::clear(&mut state, &mut out)?,
        },
        Commands::Checkout { json } => commands::checkout::run(&mut state, json, &mut out).await?,
    }
    Ok(())
}
