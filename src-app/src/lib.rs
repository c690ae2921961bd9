//! Card Board App
//!
//! Layered architecture:
//! - repository: SQLite persistence gateway
//! - config: environment configuration
//! - commands: command-line handlers over the optimistic layer

pub mod commands;
pub mod config;
pub mod repository;

use card_board::{CardStore, OptimisticCards};

use commands::{Cli, Command};
use config::AppConfig;
use repository::{init_db, SqliteCardGateway};

/// Log file stem inside the log directory
pub const APP_NAME: &str = "card-board";

/// Open the database, load the owner's cards and run one command
pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    if let Command::Logs { lines } = cli.command {
        for line in rolling_logger::tail(&config.log_dir, APP_NAME, lines)? {
            println!("{}", line);
        }
        return Ok(());
    }

    let conn = init_db(&config.db_path)?;
    let gateway = std::sync::Arc::new(SqliteCardGateway::new(conn));
    let store = CardStore::new(gateway, config.owner.clone());
    let layer = OptimisticCards::new(store, config.sync_config());

    let cards = layer.load().await?;
    log::info!("Loaded {} cards for {}", cards.len(), config.owner);

    let report = commands::execute(cli.command, &layer).await?;
    commands::print_report(&report)
}
