//! Command-line entry point for the relay bot

use anyhow::Context;
use clap::{Parser, Subcommand};
use relay_bot::platforms::telegram::run_polling;
use relay_bot::store::UserStore;
use relay_bot::{Database, PrivatBankSource, RelayBot, RelayConfig, TelegramApi, TelegramConfig};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "relay-bot")]
#[command(about = "Convert dollar prices in photo captions and broadcast them to channels", long_about = None)]
struct Args {
    /// SQLite database file (overrides DATABASE_PATH)
    #[arg(short, long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot with long polling (default)
    Run,
    /// Allow a Telegram user to run management commands
    GrantAdmin { user_id: i64 },
    /// Take management rights away from a Telegram user
    RevokeAdmin { user_id: i64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    relay_utils::init_tracing();

    let args = Args::parse();

    let mut config = RelayConfig::from_env().context("invalid relay configuration")?;
    if let Some(path) = args.database {
        config.database_path = path;
    }
    config.validate()?;

    let store = Arc::new(
        Database::open(&config.database_path)
            .with_context(|| format!("failed to open {}", config.database_path))?,
    );

    match args.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config, store).await,
        Commands::GrantAdmin { user_id } => {
            store.set_admin(user_id, true)?;
            info!(user_id, "admin rights granted");
            Ok(())
        }
        Commands::RevokeAdmin { user_id } => {
            store.set_admin(user_id, false)?;
            info!(user_id, "admin rights revoked");
            Ok(())
        }
    }
}

async fn run(config: RelayConfig, store: Arc<Database>) -> anyhow::Result<()> {
    let telegram = TelegramConfig::from_env().context("invalid Telegram configuration")?;
    let api = Arc::new(TelegramApi::new(telegram)?);

    let rate_source = match &config.rate_api_url {
        Some(url) => Some(Arc::new(PrivatBankSource::new(url, config.request_timeout)?)),
        None => None,
    };

    info!(
        database = %config.database_path,
        admins = config.admin_ids.len(),
        live_rate = rate_source.is_some(),
        "starting relay bot"
    );

    let mut bot = RelayBot::new(config, store, api.clone());
    if let Some(source) = rate_source {
        bot = bot.with_rate_source(source);
    }

    run_polling(&api, &bot).await?;
    info!("relay bot stopped");
    Ok(())
}
