use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use loppis_client::{ClientConfig, ListingService, LocalStore};

mod account;
mod checkout;
mod listings;
mod saved;

#[derive(Debug, Parser)]
#[command(name = "loppis", about = "Browse and buy on the Loppis marketplace", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
pub(crate) struct GlobalArgs {
    /// Listing Service base URL [default: $LOPPIS_API_URL or http://localhost:8000]
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Request timeout in seconds [default: $LOPPIS_TIMEOUT_SECS or 10]
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Directory for the local cart and favorites
    #[arg(long, global = true, env = "LOPPIS_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

impl GlobalArgs {
    /// Environment first, then command line flags on top.
    fn config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = ClientConfig::from_env().context("invalid client configuration in environment")?;
        if let Some(url) = &self.api_url {
            config = ClientConfig::new(url).with_timeout(config.timeout);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout_secs(secs).context("invalid --timeout-secs")?;
        }
        Ok(config)
    }

    fn service(&self) -> anyhow::Result<ListingService> {
        ListingService::new(self.config()?).context("failed to build HTTP client")
    }

    fn store(&self) -> anyhow::Result<LocalStore> {
        let dir = self.data_dir.clone().unwrap_or_else(LocalStore::default_dir);
        LocalStore::open(&dir).with_context(|| format!("failed to open data directory {}", dir.display()))
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List listings, filtered locally
    Listings(listings::ListArgs),
    /// Show one listing
    Show(listings::ShowArgs),
    /// Publish a new listing
    Create(listings::CreateArgs),
    /// Change fields of a listing
    Update(listings::UpdateArgs),
    /// Delete a listing
    Delete(listings::DeleteArgs),
    /// Print the category tree
    Categories(listings::CategoriesArgs),
    /// Buy a listing end to end
    Checkout(checkout::CheckoutArgs),
    /// Inspect or change the local cart
    Cart(saved::CartCommand),
    /// Inspect or toggle local favorites
    Favorites(saved::FavoritesCommand),
    /// Account calls
    Account(account::AccountCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> anyhow::Result<()> {
        let global = self.global;
        match self.command {
            Commands::Listings(args) => listings::list(&global, args).await,
            Commands::Show(args) => listings::show(&global, args).await,
            Commands::Create(args) => listings::create(&global, args).await,
            Commands::Update(args) => listings::update(&global, args).await,
            Commands::Delete(args) => listings::delete(&global, args).await,
            Commands::Categories(args) => listings::categories(&global, args).await,
            Commands::Checkout(args) => checkout::run(&global, args).await,
            Commands::Cart(command) => saved::cart(&global, command).await,
            Commands::Favorites(command) => saved::favorites(&global, command),
            Commands::Account(command) => account::run(&global, command).await,
        }
    }
}
