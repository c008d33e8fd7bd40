//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` (any format `config` detects for `settings.*`)
//! and from `SPLITLEDGER__*` environment variables, e.g.
//! `SPLITLEDGER__SERVER__PORT=9000`.
use config::{Config, ConfigError, Environment, File};
use engine::MemberInclusion;
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    #[serde(default = "default_metrics")]
    pub metrics: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct Balances {
    #[serde(default)]
    pub member_inclusion: MemberInclusion,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub balances: Balances,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_metrics() -> bool {
    true
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("SPLITLEDGER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    #[cfg(test)]
    fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
