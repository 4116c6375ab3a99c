//! GoMarketplace CLI - Inspect and edit the persisted cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the stored cart
//! gm-cart show
//!
//! # Add a product (or bump its quantity if already present)
//! gm-cart add --id p1 --title "Shirt" --image-url https://img/p1 --price 10.00
//!
//! # Change quantities
//! gm-cart increment p1
//! gm-cart decrement p1
//!
//! # Empty the cart (also recovers from a corrupted cart file)
//! gm-cart clear
//! ```
//!
//! # Commands
//!
//! - `show` - Log every line item and the cart totals
//! - `add` - Add one unit of a product
//! - `increment` / `decrement` - Change a line's quantity by one
//! - `clear` - Remove every line item
//!
//! Every command restores the cart, applies the change, and waits for the
//! write-through before exiting.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gomarketplace_cart::CartConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "gm-cart")]
#[command(author, version, about = "GoMarketplace cart tools")]
struct Cli {
    /// Directory holding the cart file (overrides `CART_STORAGE_DIR`)
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Storage key of the cart (overrides `CART_STORAGE_KEY`)
    #[arg(short, long, global = true)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the stored cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        #[arg(long)]
        id: String,

        /// Product display name
        #[arg(long)]
        title: String,

        /// Product image URL
        #[arg(long)]
        image_url: String,

        /// Unit price (e.g. `19.99`)
        #[arg(long)]
        price: String,
    },
    /// Add one unit to an existing line
    Increment {
        /// Product ID
        id: String,
    },
    /// Remove one unit from an existing line
    Decrement {
        /// Product ID
        id: String,
    },
    /// Remove every line item
    Clear,
}

/// Initialize Sentry error tracking when `SENTRY_DSN` is set.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok()?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
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

#[tokio::main]
async fn main() {
    // Initialize Sentry (must be done before tracing subscriber)
    let sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gomarketplace_cart=info,gm_cart=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            sentry_guard
                .as_ref()
                .map(|_| sentry_tracing::layer().event_filter(sentry_event_filter)),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CartConfig::from_env()?;
    if let Some(dir) = cli.dir {
        config.storage_dir = dir;
    }
    if let Some(key) = cli.key {
        config.storage_key = key;
    }

    let cart = match cli.command {
        Commands::Show => commands::cart::show(&config).await?,
        Commands::Add {
            id,
            title,
            image_url,
            price,
        } => commands::cart::add(&config, id, title, image_url, &price).await?,
        Commands::Increment { id } => commands::cart::increment(&config, &id).await?,
        Commands::Decrement { id } => commands::cart::decrement(&config, &id).await?,
        Commands::Clear => commands::cart::clear(&config).await?,
    };

    commands::cart::log_cart(&cart);
    Ok(())
}
