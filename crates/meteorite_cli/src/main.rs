//! Meteorite explorer service entry point.
//!
//! # Responsibility
//! - Resolve configuration from file and flags.
//! - Boot in order: logging, store, startup load, HTTP server.
//!
//! # Invariants
//! - Any boot failure is reported on stderr and exits with status 1.

mod args;

use args::Cli;
use clap::Parser;
use log::info;
use meteorite_api::{AppState, HttpServer};
use meteorite_core::db::open_db_target;
use meteorite_core::{core_version, init_logging, run_startup_load};

#[tokio::main]
async fn main() {
    if let Err(err) = run(Cli::parse()).await {
        eprintln!("meteorite-explorer: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let config = cli.resolve_config().map_err(|err| err.to_string())?;
    init_logging(&config.logging.level, config.logging.dir.as_deref())?;
    info!(
        "event=app_start module=cli status=start version={} db={}",
        core_version(),
        config.database.path
    );

    let mut conn = open_db_target(&config.database.path).map_err(|err| err.to_string())?;
    let source = config.loader.source();
    run_startup_load(&mut conn, &source, config.loader.policy)
        .map_err(|err| format!("startup load from {source} failed: {err}"))?;

    HttpServer::new(AppState::new(conn), config.server)
        .start()
        .await
        .map_err(|err| format!("http server failed: {err}"))
}
