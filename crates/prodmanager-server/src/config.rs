use std::fmt;

use chrono::Duration;
use prodmanager_core::AppError;
use prodmanager_core::token::{DEFAULT_TOKEN_TTL, MAX_TOKEN_TTL};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BODY_LIMIT: usize = 100 * 1024;

/// Deployment mode; development exposes 500 details in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// HTTP server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub environment: Environment,
    pub seed_demo_data: bool,
    pub body_limit: usize,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("environment", &self.environment)
            .field("seed_demo_data", &self.seed_demo_data)
            .field("body_limit", &self.body_limit)
            .finish()
    }
}

impl ServerConfig {
    /// Read configuration from environment variables.
    ///
    /// - `PORT` (default 5000)
    /// - `JWT_SECRET` (required)
    /// - `JWT_EXPIRES_IN` (default `7d`)
    /// - `APP_ENV`, falling back to `NODE_ENV` (default `production`)
    /// - `SEED_DEMO_DATA` (default `true`)
    /// - `BODY_LIMIT_BYTES` (default 102400)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET")
            .ok_or_else(|| AppError::Config("JWT_SECRET must be set".into()))?;

        let port = match get("PORT") {
            None => DEFAULT_PORT,
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid PORT '{raw}'")))?,
        };

        let token_ttl = match get("JWT_EXPIRES_IN") {
            None => DEFAULT_TOKEN_TTL,
            Some(raw) => parse_ttl(&raw)?,
        };

        let environment = match get("APP_ENV").or_else(|| get("NODE_ENV")) {
            Some(raw) if raw.trim().eq_ignore_ascii_case("development") => {
                Environment::Development
            }
            _ => Environment::Production,
        };

        let seed_demo_data = match get("SEED_DEMO_DATA") {
            None => true,
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| AppError::Config(format!("Invalid SEED_DEMO_DATA '{raw}'")))?,
        };

        let body_limit = match get("BODY_LIMIT_BYTES") {
            None => DEFAULT_BODY_LIMIT,
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or_else(|| AppError::Config(format!("Invalid BODY_LIMIT_BYTES '{raw}'")))?,
        };

        Ok(Self {
            port,
            jwt_secret,
            token_ttl,
            environment,
            seed_demo_data,
            body_limit,
        })
    }
}

/// Parse a token lifetime such as `7d`, `12h`, `30m`, `45s` or bare seconds.
///
/// Lifetimes above [`MAX_TOKEN_TTL`] are rejected.
pub fn parse_ttl(raw: &str) -> Result<Duration, AppError> {
    let raw = raw.trim();
    let invalid = || AppError::Config(format!("Invalid JWT_EXPIRES_IN '{raw}'"));

    let (digits, unit) = match raw.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&raw[..idx], Some(c)),
        _ => (raw, None),
    };
    let amount: i64 = digits.parse().map_err(|_| invalid())?;
    if amount <= 0 {
        return Err(invalid());
    }

    let ttl = match unit {
        None | Some('s') => Duration::try_seconds(amount),
        Some('m') => Duration::try_minutes(amount),
        Some('h') => Duration::try_hours(amount),
        Some('d') => Duration::try_days(amount),
        Some(_) => None,
    };
    ttl.filter(|ttl| *ttl <= MAX_TOKEN_TTL).ok_or_else(invalid)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
