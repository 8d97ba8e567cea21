use std::{fmt::Display, str::FromStr, time::Duration};

use anyhow::Context;
use jsonwebtoken::Algorithm;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct UsdaConfig {
    pub api_url: String,
    pub api_key: String,
    pub page_size: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub db: i64,
    /// Expiry applied to cached dish entries; `None` keeps them until evicted.
    pub cache_ttl: Option<Duration>,
    /// Upper bound for a single cache or rate-limit round trip.
    pub op_timeout: Duration,
}

impl RedisConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub limit: u64,
    pub window_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub debug: bool,
    pub jwt: JwtConfig,
    pub usda: UsdaConfig,
    pub redis: RedisConfig,
    pub rate_limit: RateLimitConfig,
}

pub const DEFAULT_USDA_API_URL: &str = "https://api.nal.usda.gov/fdc/v1/foods/search";

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, so callers other than
    /// `from_env` never have to touch the process environment.
    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                required(&var, "DB_USER")?,
                required(&var, "DB_PASSWORD")?,
                required(&var, "DB_HOST")?,
                parse_or::<u16, _>(&var, "DB_PORT", 5432)?,
                required(&var, "DB_NAME")?,
            ),
        };

        let debug = match var("DEBUG") {
            Some(v) => parse_bool(&v).with_context(|| format!("invalid DEBUG value {v:?}"))?,
            None => false,
        };

        let algorithm_name = var("JWT_ALGORITHM").unwrap_or_else(|| "HS256".into());
        let algorithm = Algorithm::from_str(&algorithm_name)
            .with_context(|| format!("unknown JWT_ALGORITHM {algorithm_name:?}"))?;
        anyhow::ensure!(
            matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512),
            "JWT_ALGORITHM must be an HMAC algorithm (HS256, HS384, HS512), got {algorithm_name}"
        );

        let jwt = JwtConfig {
            secret: required(&var, "JWT_SECRET_KEY")?,
            algorithm,
            ttl_minutes: parse_or(&var, "JWT_ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
        };

        let usda = UsdaConfig {
            api_url: var("USDA_API_URL").unwrap_or_else(|| DEFAULT_USDA_API_URL.into()),
            api_key: required(&var, "USDA_API_KEY")?,
            page_size: parse_or(&var, "USDA_PAGE_SIZE", 5)?,
            timeout: Duration::from_secs(parse_or(&var, "USDA_TIMEOUT_SECONDS", 5)?),
        };

        let cache_ttl = match var("CACHE_TTL_SECONDS") {
            Some(v) => {
                let secs: u64 = v
                    .parse()
                    .with_context(|| format!("invalid CACHE_TTL_SECONDS value {v:?}"))?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };
        let redis = RedisConfig {
            host: var("REDIS_HOST").unwrap_or_else(|| "localhost".into()),
            port: parse_or(&var, "REDIS_PORT", 6379)?,
            db: parse_or(&var, "REDIS_DB", 0)?,
            cache_ttl,
            op_timeout: Duration::from_millis(parse_or(&var, "STORE_TIMEOUT_MS", 500)?),
        };

        let rate_limit = RateLimitConfig {
            limit: parse_or(&var, "RATE_LIMIT", 1)?,
            window_seconds: parse_or(&var, "RATE_LIMIT_TIME", 5)?,
        };
        anyhow::ensure!(rate_limit.window_seconds > 0, "RATE_LIMIT_TIME must be positive");

        let server = ServerConfig {
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&var, "APP_PORT", 8080)?,
        };

        Ok(Self {
            server,
            database_url,
            debug,
            jwt,
            usda,
            redis,
            rate_limit,
        })
    }
}

fn required<F>(var: &F, key: &str) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    var(key).with_context(|| format!("{key} must be set"))
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key} value {raw:?}: {e}")),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {other:?}"),
    }
}
