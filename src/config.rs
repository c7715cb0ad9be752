use std::{env, str::FromStr};

use anyhow::{Context, Result, bail};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

/// Loads configuration from the process environment.
pub fn load() -> Result<AppConfig> {
    from_lookup(|key| env::var(key).ok())
}

/// Builds configuration from an arbitrary key lookup so it can be exercised
/// without touching the real environment.
pub fn from_lookup<F>(lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

    let jwt_secret = lookup("JWT_SECRET").unwrap_or_default();
    if jwt_secret.trim().is_empty() {
        bail!("JWT_SECRET must be set to a non-empty value");
    }

    Ok(AppConfig {
        server: ServerConfig {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "PORT", 3000)?,
        },
        database: DatabaseConfig {
            url: database_url,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
        },
        jwt: JwtConfig {
            secret: jwt_secret,
            ttl_minutes: parse_or(&lookup, "JWT_TTL_MINUTES", 24 * 60)?,
        },
    })
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}
