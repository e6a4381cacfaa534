//! Top-up CLI - command line storefront over the top-up service.
//!
//! Commands:
//! - `topup catalog` - List active games
//! - `topup products <slug>` - List a game's top-up packages
//! - `topup quote <product>` - Price a package, optionally with a voucher
//! - `topup purchase <product>` - Buy a package and earn points
//! - `topup redeem <voucher>` - Spend points on a discount voucher
//! - `topup vault` - Points, vouchers and recent purchases
//! - `topup profile create|show` / `topup rename` - Profile management

mod commands;
mod config;
mod output;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::{ProfileCommand, PurchaseArgs, QuoteArgs};
use config::TopupConfig;
use output::Output;
use topup_db::{Database, DbConfig};
use topup_service::TopupService;

/// Game top-up storefront
#[derive(Parser)]
#[command(name = "topup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Acting user id
    #[arg(short, long, global = true, env = "TOPUP_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List active games
    Catalog,

    /// List top-up packages for a game
    Products {
        /// Game slug, e.g. mobile-legends
        slug: String,
    },

    /// Price a package before buying
    Quote(QuoteArgs),

    /// Buy a package
    Purchase(PurchaseArgs),

    /// Redeem loyalty points for a voucher
    Redeem {
        /// Voucher catalog id
        voucher_id: String,
    },

    /// Show points, vouchers and recent purchases
    Vault,

    /// Change the profile display name
    Rename {
        /// New display name
        name: String,
    },

    /// Manage the acting user's profile
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// List accepted payment methods
    PaymentMethods,
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
/// `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn open_service(config: &TopupConfig) -> Result<TopupService<Database>> {
    if let Some(dir) = config.database.path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating data directory {}", dir.display()))?;
        }
    }

    let db = Database::new(
        DbConfig::new(config.database.path.clone()).max_connections(config.database.max_connections),
    )
    .await
    .context("opening database")?;

    Ok(TopupService::new(db).with_history_limit(config.storefront.history_limit))
}

async fn run(cli: Cli, config: &TopupConfig, out: &Output) -> Result<()> {
    if let Commands::PaymentMethods = cli.command {
        return commands::payment_methods(out);
    }

    let service = open_service(config).await?;
    let user = cli.user.as_deref();

    match cli.command {
        Commands::Catalog => commands::catalog(&service, out).await,
        Commands::Products { slug } => commands::products(&service, out, &slug).await,
        Commands::Quote(args) => commands::quote(&service, out, user, args).await,
        Commands::Purchase(args) => commands::purchase(&service, out, user, args).await,
        Commands::Redeem { voucher_id } => {
            commands::redeem(&service, out, user, &voucher_id).await
        }
        Commands::Vault => commands::vault(&service, out, user).await,
        Commands::Rename { name } => commands::rename(&service, out, user, &name).await,
        Commands::Profile(cmd) => commands::profile(&service, out, user, cmd).await,
        Commands::PaymentMethods => commands::payment_methods(out),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match TopupConfig::load(cli.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            Output::new(cli.json, "Rp").error(&format!("{:#}", e));
            std::process::exit(2);
        }
    };

    init_tracing(&config.log_filter);
    info!(db = %config.database.path.display(), "Starting topup CLI");

    let out = Output::new(cli.json, config.storefront.currency_symbol.clone());

    if let Err(e) = run(cli, &config, &out).await {
        out.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
