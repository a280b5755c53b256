use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use stockify::cli::setup::{setup, setup_at_path};
use stockify::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the portfolio dashboard
    Summary,
    /// List holdings with live prices
    List,
    /// Add a holding
    Add {
        /// Display name, e.g. "Apple"
        #[arg(long)]
        name: String,
        /// Ticker symbol, e.g. AAPL
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        quantity: u32,
        /// Price paid per share in USD
        #[arg(long)]
        buy_price: f64,
    },
    /// Edit fields of an existing holding
    Edit {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        quantity: Option<u32>,
        #[arg(long)]
        buy_price: Option<f64>,
    },
    /// Delete a holding
    Delete { id: u64 },
    /// Look up current prices for one or more tickers
    Price {
        #[arg(required = true)]
        tickers: Vec<String>,
    },
}

impl From<Commands> for stockify::AppCommand {
    fn from(cmd: Commands) -> stockify::AppCommand {
        match cmd {
            Commands::Summary => stockify::AppCommand::Summary,
            Commands::List => stockify::AppCommand::List,
            Commands::Add {
                name,
                ticker,
                quantity,
                buy_price,
            } => stockify::AppCommand::Add {
                name,
                ticker,
                quantity,
                buy_price,
            },
            Commands::Edit {
                id,
                name,
                ticker,
                quantity,
                buy_price,
            } => stockify::AppCommand::Edit {
                id,
                name,
                ticker,
                quantity,
                buy_price,
            },
            Commands::Delete { id } => stockify::AppCommand::Delete { id },
            Commands::Price { tickers } => stockify::AppCommand::Price { tickers },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => setup_at_path(path),
            None => setup(),
        },
        Some(cmd) => stockify::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
