use std::{fs::File, io, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use engine::{AssetKind, Currency, Engine, MoneyCents, NewAssetCmd};
use migration::{Migrator, MigratorTrait};

use crate::{
    error::{AppError, Result},
    settings::Settings,
};

mod error;
mod settings;

#[derive(Parser, Debug)]
#[command(name = "moneybook")]
#[command(about = "Personal ledger: assets, transactions, CSV import/export")]
struct Cli {
    /// Optional config file path (TOML). Defaults to `moneybook.toml` if present.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Database connection string; overrides the configured database.
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Acting user.
    #[arg(long, global = true, env = "MONEYBOOK_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Asset(Asset),
    /// Import transactions from a CSV file.
    Import { path: PathBuf },
    /// Export every transaction as CSV.
    Export {
        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Transactions of a month grouped by day.
    Summary {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },
    /// Rebuild asset balances from the ledger.
    Recompute,
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Add { username: String },
}

#[derive(Args, Debug)]
struct Asset {
    #[command(subcommand)]
    command: AssetCommand,
}

#[derive(Subcommand, Debug)]
enum AssetCommand {
    Add(AssetAddArgs),
    List {
        /// Include retired assets.
        #[arg(long)]
        all: bool,
    },
    /// Retire an asset given as `TYPE: Name`.
    Retire { reference: String },
}

#[derive(Args, Debug)]
struct AssetAddArgs {
    /// CASH, DEBIT_CARD, DEPOSIT, CREDIT_CARD or BROKERAGE (labels work too).
    #[arg(long, value_parser = parse_kind)]
    kind: AssetKind,
    #[arg(long)]
    name: String,
    #[arg(long)]
    currency: Option<Currency>,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    opening_balance: MoneyCents,
}

fn parse_kind(raw: &str) -> std::result::Result<AssetKind, String> {
    AssetKind::try_from(raw).map_err(|err| err.to_string())
}

async fn connect_db(url: &str) -> Result<sea_orm::DatabaseConnection> {
    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

fn require_user(cli: &Cli) -> Result<&str> {
    cli.user
        .as_deref()
        .ok_or_else(|| AppError::Usage("--user is required for this command".to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "moneybook={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .with_writer(io::stderr)
        .init();

    let url = cli
        .database_url
        .clone()
        .unwrap_or_else(|| settings.database.url());
    let db = connect_db(&url).await?;
    let engine = Engine::builder()
        .database(db)
        .config(settings.ledger.clone())
        .build()
        .await?;

    match &cli.command {
        Command::User(User {
            command: UserCommand::Add { username },
        }) => {
            engine.new_user(username).await?;
            println!("user: {username}");
        }
        Command::Asset(Asset {
            command: AssetCommand::Add(args),
        }) => {
            let user_id = require_user(&cli)?;
            let mut cmd = NewAssetCmd::new(user_id, args.kind, args.name.clone())
                .opening_balance(args.opening_balance);
            if let Some(currency) = args.currency {
                cmd = cmd.currency(currency);
            }
            let asset = engine.new_asset(cmd).await?;
            println!(
                "{} ({}) {} {}",
                asset.reference(),
                asset.id,
                asset.balance,
                asset.currency
            );
        }
        Command::Asset(Asset {
            command: AssetCommand::List { all },
        }) => {
            let user_id = require_user(&cli)?;
            for asset in engine.list_assets(user_id, *all).await? {
                let retired = if asset.is_active { "" } else { " [retired]" };
                println!(
                    "{:<40} {:>14} {}{retired}",
                    asset.reference().to_string(),
                    asset.balance.to_string(),
                    asset.currency
                );
            }
        }
        Command::Asset(Asset {
            command: AssetCommand::Retire { reference },
        }) => {
            let user_id = require_user(&cli)?;
            let asset = engine.resolve_asset(user_id, reference).await?;
            let asset = engine.set_asset_active(user_id, asset.id, false).await?;
            println!("retired: {}", asset.reference());
        }
        Command::Import { path } => {
            let user_id = require_user(&cli)?;
            let report = engine.import_csv(user_id, File::open(path)?).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Export { out } => {
            let user_id = require_user(&cli)?;
            let written = match out {
                Some(path) => engine.export_csv(user_id, File::create(path)?).await?,
                None => engine.export_csv(user_id, io::stdout().lock()).await?,
            };
            tracing::info!(written, "export done");
        }
        Command::Summary { year, month } => {
            let user_id = require_user(&cli)?;
            let summary = engine.month_summary(user_id, *year, *month).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Recompute => {
            let user_id = require_user(&cli)?;
            let drifts = engine.recompute_balances(user_id).await?;
            if drifts.is_empty() {
                println!("balances already consistent");
            }
            for drift in drifts {
                println!("{}: {} -> {}", drift.reference, drift.stored, drift.replayed);
            }
        }
    }

    Ok(())
}
