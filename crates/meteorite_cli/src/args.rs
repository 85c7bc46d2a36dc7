//! Command-line arguments.
//!
//! Every flag is optional and overrides the matching config-file field.

use clap::Parser;
use meteorite_core::{AppConfig, ConfigError, LoadPolicy};
use std::path::PathBuf;

/// Meteorite landings explorer: loads the dataset and serves the query API.
#[derive(Parser, Debug)]
#[command(name = "meteorite-explorer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    /// SQLite file path, or `:memory:`
    #[arg(long)]
    pub db: Option<String>,

    /// CSV dataset to load instead of the bundled one
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// best_effort | fail_fast
    #[arg(long, value_parser = parse_load_policy)]
    pub load_policy: Option<LoadPolicy>,

    /// trace | debug | info | warn | error
    #[arg(long)]
    pub log_level: Option<String>,

    /// Absolute directory for rotating log files
    #[arg(long)]
    pub log_dir: Option<String>,
}

fn parse_load_policy(value: &str) -> Result<LoadPolicy, String> {
    value.parse()
}

impl Cli {
    /// Loads the config file (or defaults) and applies flag overrides.
    pub fn resolve_config(&self) -> Result<AppConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        let config = self.apply(base);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(db) = &self.db {
            config.database.path = db.clone();
        }
        if let Some(csv) = &self.csv {
            config.loader.csv_path = Some(csv.clone());
        }
        if let Some(policy) = self.load_policy {
            config.loader.policy = policy;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(dir) = &self.log_dir {
            config.logging.dir = Some(dir.clone());
        }
        config
    }
}
