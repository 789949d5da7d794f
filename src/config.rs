use std::net::SocketAddr;

use anyhow::Context;
use serde::Deserialize;

/// Upper bound for any configured token lifetime: ten years.
pub const MAX_TTL_MINUTES: i64 = 10 * 365 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: String,
    pub issuer: String,
    pub audience: String,
    /// TTL used when the caller does not ask for one.
    pub default_ttl_minutes: i64,
    /// TTL of tokens handed out by the login flow.
    pub access_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` puts the server in degraded mode: storage-backed routes answer 503.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            algorithm: std::env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".into()),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "habitquest".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "habitquest-users".into()),
            default_ttl_minutes: env_ttl("JWT_DEFAULT_TTL_MINUTES", 15)?,
            access_ttl_minutes: env_ttl("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
        };
        Ok(Self {
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 10),
            jwt,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("APP_PORT", 8080),
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("APP_HOST {:?} is not an IP address", self.host))
    }
}

fn env_ttl(key: &str, default: i64) -> anyhow::Result<i64> {
    parse_ttl(key, std::env::var(key).ok(), default)
}

/// Token lifetimes must be a whole number of minutes in `1..=MAX_TTL_MINUTES`.
fn parse_ttl(key: &str, raw: Option<String>, default: i64) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let minutes: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a number of minutes, got {raw:?}"))?;
    anyhow::ensure!(
        (1..=MAX_TTL_MINUTES).contains(&minutes),
        "{key} must be between 1 and {MAX_TTL_MINUTES} minutes, got {minutes}"
    );
    Ok(minutes)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
