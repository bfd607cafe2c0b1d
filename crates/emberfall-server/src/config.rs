use std::collections::HashMap;
use std::net::SocketAddr;

use anyhow::{Context, Result, bail};
use chrono::Duration;
use tracing::warn;

use emberfall_api::token::DEFAULT_TOKEN_TTL;
use emberfall_db::{DEFAULT_POOL_SIZE, MAX_POOL_SIZE};

/// Placeholder secrets that must never sign tokens in production.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];
const DEV_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            other => bail!("EMBERFALL_ENV must be 'production' or 'development', got '{other}'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub db_pool_size: usize,
    pub token_ttl: Duration,
}

impl Config {
    /// Read configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let environment = get("EMBERFALL_ENV")
            .map(Environment::parse)
            .transpose()?
            .unwrap_or(Environment::Production);

        let database_url = get("EMBERFALL_DATABASE_URL")
            .context("EMBERFALL_DATABASE_URL is not set")?
            .to_string();

        let jwt_secret = match get("EMBERFALL_JWT_SECRET") {
            Some(secret) if !PLACEHOLDER_SECRETS.contains(&secret) => secret.to_string(),
            _ if environment == Environment::Development => {
                warn!("EMBERFALL_JWT_SECRET unset or placeholder; using the development secret");
                DEV_SECRET.to_string()
            }
            _ => bail!("EMBERFALL_JWT_SECRET is unset or still a placeholder"),
        };

        let host = get("EMBERFALL_HOST").unwrap_or("0.0.0.0").to_string();
        let port: u16 = get("EMBERFALL_PORT")
            .unwrap_or("3000")
            .parse()
            .context("EMBERFALL_PORT must be a port number")?;

        let db_pool_size = match get("EMBERFALL_DB_POOL_SIZE") {
            Some(raw) => {
                let size: usize = raw
                    .parse()
                    .context("EMBERFALL_DB_POOL_SIZE must be a positive integer")?;
                if !(1..=MAX_POOL_SIZE).contains(&size) {
                    bail!("EMBERFALL_DB_POOL_SIZE must be between 1 and {MAX_POOL_SIZE}");
                }
                size
            }
            None => DEFAULT_POOL_SIZE,
        };

        let token_ttl = match get("EMBERFALL_TOKEN_TTL_SECS") {
            Some(raw) => {
                let secs: i64 = raw
                    .parse()
                    .context("EMBERFALL_TOKEN_TTL_SECS must be an integer")?;
                if secs <= 0 {
                    bail!("EMBERFALL_TOKEN_TTL_SECS must be positive");
                }
                Duration::seconds(secs)
            }
            None => DEFAULT_TOKEN_TTL,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            environment,
            host,
            port,
            db_pool_size,
            token_ttl,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }

    pub fn expose_errors(&self) -> bool {
        self.environment == Environment::Development
    }
}
