//! Process-env configuration (§10.3). Only the knobs §6's "Configuration
//! knobs" section names live here — everything runtime-mutable (scan
//! intervals, batch window, log level, ...) lives in the `settings` table
//! behind `longbox_core::settings::SettingsService` instead.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "longbox-server")]
#[command(about = "Self-hosted comic library server")]
pub struct Args {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    pub port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    pub host: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,

    pub database_url: String,
    pub storage_root: PathBuf,

    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,

    /// Prefix every route is served under, so a reverse proxy can mount
    /// this server at a sub-path (e.g. `/longbox`).
    pub base_url_prefix: String,
    /// Reverse proxies whose `X-Forwarded-For` the client-ip extractor
    /// trusts; empty means trust none.
    pub trusted_proxies: Vec<String>,

    pub unrar_path: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;

        Ok(Self {
            server_host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),

            database_url,
            storage_root: std::env::var("LONGBOX_STORAGE_ROOT")
                .unwrap_or_else(|_| "./storage".to_string())
                .into(),

            jwt_secret,
            access_token_ttl_minutes: std::env::var("ACCESS_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),

            base_url_prefix: std::env::var("BASE_URL_PREFIX").unwrap_or_default(),
            trusted_proxies: std::env::var("TRUSTED_PROXIES")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),

            unrar_path: std::env::var("UNRAR_PATH").unwrap_or_else(|_| "unrar".to_string()),
        })
    }
}
