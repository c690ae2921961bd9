//! Card Board command-line entry point

use clap::Parser;

use card_board_app::commands::Cli;
use card_board_app::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let _logger = rolling_logger::init_logger(&config.log_dir, card_board_app::APP_NAME, &config.log_filter)?;

    card_board_app::run(cli, config).await
}
