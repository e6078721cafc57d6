//! Command line front end for the catalog gateway.
//!
//! ```text
//! catalog-gateway [--config gateway.toml] [--downstream] <command>
//!     list | get <id> | create --name --price --quantity
//!     update <id> --name --price --quantity | delete <id>
//! ```
//!
//! Results are printed as JSON on stdout; logs go to stderr.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

use catalog_gateway::config::{load_config, AppConfig};
use catalog_gateway::observability::{logging, metrics};
use catalog_gateway::{MemoryStore, NewProduct, ProductService, SupplyChainClient};

#[derive(Parser)]
#[command(name = "catalog-gateway")]
#[command(about = "Manage products locally or through the supply chain service", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Route the operation to the supply chain instead of the local store.
    #[arg(short, long, global = true)]
    downstream: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all products
    List,
    /// Show one product
    Get { id: String },
    /// Create a product
    Create(ProductArgs),
    /// Replace every field of an existing product
    Update {
        id: String,
        #[command(flatten)]
        fields: ProductArgs,
    },
    /// Delete a product
    Delete { id: String },
}

#[derive(Args)]
struct ProductArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    price: Decimal,
    #[arg(long)]
    quantity: u32,
}

impl From<ProductArgs> for NewProduct {
    fn from(args: ProductArgs) -> Self {
        NewProduct {
            name: args.name,
            price: args.price,
            quantity: args.quantity,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_logging(&config.observability)?;

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let store = match &config.store.path {
        Some(path) => MemoryStore::load_from_file(path)?,
        None => MemoryStore::new(),
    };
    let supply_chain = SupplyChainClient::from_config(&config)?;
    let service = ProductService::new(Arc::new(store.clone()), Arc::new(supply_chain));

    let outcome = run(&service, cli.command, cli.downstream).await;
    store.persist()?;
    outcome
}

async fn run(
    service: &ProductService,
    command: Commands,
    downstream: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::List => {
            let listing = service.list(downstream).await?;
            if listing.is_degraded() {
                eprintln!("Warning: supply chain unavailable, showing fallback data");
            }
            print_json(listing.get())
        }
        Commands::Get { id } => match service.read(&id, downstream).await? {
            Some(product) => print_json(&product),
            None => {
                eprintln!("Product {} not found", id);
                Ok(())
            }
        },
        Commands::Create(fields) => {
            let product = service.create(fields.into(), downstream).await?;
            print_json(&product)
        }
        Commands::Update { id, fields } => {
            let product = service.update(&id, fields.into(), downstream).await?;
            print_json(&product)
        }
        Commands::Delete { id } => {
            service.delete(&id, downstream).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
