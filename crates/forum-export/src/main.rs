//! forum-export entry point
//!
//! Loads forum entities for one request and prints them as JSON.
//!
//! Run with:
//! ```bash
//! cargo run -p forum-export -- topic 42 --include user,tags
//! cargo run -p forum-export -- topics --tag Anime --tag Japan --limit 20
//! ```
//!
//! Database credentials come from environment variables or a `.env` file.

use clap::Parser;
use forum_common::{
    try_init_tracing_with_config, AppConfig, AppResult, ErrorResponse, TracingConfig,
};
use forum_db::{MySqlConnector, Session};
use tracing::{error, info};

mod commands;

use commands::{Cli, Paging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(body) => println!("{body:#}"),
        Err(e) => {
            error!(error = %e, code = e.error_code(), "Export failed");
            let body = ErrorResponse::from(&e);
            match serde_json::to_string_pretty(&body) {
                Ok(json) => println!("{json}"),
                Err(_) => eprintln!("{}: {}", body.code, body.message),
            }
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> AppResult<serde_json::Value> {
    let config = AppConfig::from_env()?;

    if let Err(e) = try_init_tracing_with_config(&TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }
    info!(
        env = ?config.app.env,
        host = %config.database.host,
        database = %config.database.database,
        "Configuration loaded"
    );

    let (start, limit) = config.listing.clamp(cli.start, cli.limit);
    let paging = Paging { start, limit };

    let mut session = Session::new(MySqlConnector::new(&config.database));
    let result = commands::execute(cli.command, &mut session, paging).await;
    session.close().await;
    result
}
