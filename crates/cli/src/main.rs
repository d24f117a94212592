//! Maisha CLI - drive the Maisha Boutique cart from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart for this machine's anonymous session
//! maisha show
//!
//! # Add two units of a product, price as displayed on the product card
//! maisha add "Denim Jacket" "Ksh4,799" jacket.jpg -q 2
//!
//! # Work on a logged-in user's cart
//! maisha --user 64f1c0de inc "Denim Jacket"
//!
//! # Print the WhatsApp order link
//! maisha whatsapp --quick
//! ```
//!
//! # Commands
//!
//! - `show` / `summary` - Render the cart
//! - `add`, `remove`, `set`, `inc`, `dec`, `clear` - Mutate the cart
//! - `whatsapp` - Compose the WhatsApp order
//! - `checkout` - Confirm payment (clears the cart)
//!
//! Configuration is read from the environment; see `maisha_cart::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use maisha_core::{CartItem, Price, Quantity};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "maisha")]
#[command(author, version, about = "Maisha Boutique cart tools")]
struct Cli {
    /// Act on this logged-in user's cart instead of the anonymous session
    #[arg(short, long, env = "MAISHA_USER", global = true)]
    user: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, env = "MAISHA_LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart lines and total
    Show,
    /// Add a product to the cart
    Add {
        /// Product name (lines are keyed by name)
        name: String,

        /// Unit price, e.g. `4799` or `Ksh4,799`
        #[arg(value_parser = Price::parse_display)]
        price: Price,

        /// Product image URL
        image: String,

        /// Number of units
        #[arg(short, long, default_value = "1", value_parser = parse_quantity)]
        quantity: Quantity,

        /// Size variant
        #[arg(long)]
        size: Option<String>,

        /// Color variant
        #[arg(long)]
        color: Option<String>,
    },
    /// Remove a line from the cart
    Remove {
        /// Product name
        name: String,
    },
    /// Set a line's quantity
    Set {
        /// Product name
        name: String,

        /// New quantity (at least 1)
        #[arg(value_parser = parse_quantity)]
        quantity: Quantity,
    },
    /// Add one unit of a line
    Inc {
        /// Product name
        name: String,
    },
    /// Remove one unit of a line (never below 1)
    Dec {
        /// Product name
        name: String,
    },
    /// Empty the cart
    Clear,
    /// Show the checkout summary
    Summary,
    /// Compose the WhatsApp order message and link
    Whatsapp {
        /// Use the short one-line-per-item format
        #[arg(long)]
        quick: bool,
    },
    /// Confirm payment and clear the cart
    Checkout,
}

fn parse_quantity(raw: &str) -> Result<Quantity, String> {
    let value = raw.parse::<u32>().map_err(|e| e.to_string())?;
    Quantity::new(value).map_err(|e| e.to_string())
}

fn init_tracing(json: bool) {
    // Logs go to stderr so stdout stays clean for cart output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "maisha_cart=info,maisha_cli=info".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let session = commands::Session::open(cli.user).await?;

    match cli.command {
        Commands::Show => commands::cart::show(&session)?,
        Commands::Add {
            name,
            price,
            image,
            quantity,
            size,
            color,
        } => {
            let item = CartItem {
                size,
                color,
                ..CartItem::new(name, price, image, quantity)
            };
            commands::cart::add(&session, item).await?;
        }
        Commands::Remove { name } => commands::cart::remove(&session, &name).await?,
        Commands::Set { name, quantity } => {
            commands::cart::set_quantity(&session, &name, quantity).await?;
        }
        Commands::Inc { name } => commands::cart::increment(&session, &name).await?,
        Commands::Dec { name } => commands::cart::decrement(&session, &name).await?,
        Commands::Clear => commands::cart::clear(&session).await?,
        Commands::Summary => commands::checkout::summary(&session)?,
        Commands::Whatsapp { quick } => commands::checkout::whatsapp(&session, quick)?,
        Commands::Checkout => commands::checkout::checkout(&session).await?,
    }
    Ok(())
}
