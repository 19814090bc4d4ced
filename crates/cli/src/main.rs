//! Mercado CLI - operator console for the product catalog.
//!
//! # Usage
//!
//! ```bash
//! # Interactive console (default)
//! mercado
//! mercado --api-url http://localhost:8000/api shell
//!
//! # One-shot commands
//! mercado list --json
//! mercado add --name Rice --price 5.50 --stock 10
//! mercado edit 3 --stock 12
//! mercado delete 3 --yes
//! mercado resolve
//! ```
//!
//! # Environment Variables
//!
//! See `mercado_client::config`. `--api-url` and `--origin` take precedence.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use mercado_client::ClientConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

mod commands;
mod console;
mod error;

use error::CliError;

#[derive(Parser)]
#[command(name = "mercado")]
#[command(author, version, about = "Mercado inventory console")]
struct Cli {
    /// Catalog service override (loopback URLs are used directly, anything
    /// else goes through the proxy)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Origin the relative `/api` base is resolved against
    #[arg(long, global = true)]
    origin: Option<Url>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive console
    Shell,
    /// Print the product listing
    List {
        /// Print the raw product records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a product
    Add {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        price: String,
        #[arg(short, long)]
        stock: String,
    },
    /// Update a product; omitted fields keep their current value
    Edit {
        id: i64,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        price: Option<String>,
        #[arg(short, long)]
        stock: Option<String>,
    },
    /// Delete a product
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Print the resolved catalog address
    Resolve,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        #[allow(clippy::print_stderr)]
        {
            eprintln!("error: {e}");
        }
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr so they never mix with console output.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mercado=info,mercado_client=warn".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

fn load_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = &cli.api_url {
        config = config.with_api_override(api_url.clone());
    }
    if let Some(origin) = &cli.origin {
        config = config.with_origin(origin.clone());
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => commands::shell::run(&config).await?,
        Commands::List { json } => commands::products::list(&config, json).await?,
        Commands::Add { name, price, stock } => {
            commands::products::add(&config, name, price, stock).await?;
        }
        Commands::Edit {
            id,
            name,
            price,
            stock,
        } => commands::products::edit(&config, id.into(), name, price, stock).await?,
        Commands::Delete { id, yes } => commands::products::delete(&config, id.into(), yes).await?,
        Commands::Resolve => commands::products::resolve(&config)?,
    }
    Ok(())
}
