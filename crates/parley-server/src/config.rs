use std::time::Duration;

use parley_core::FanoutScope;
use parley_core::registry::{DEFAULT_DELIVERY_TIMEOUT, DEFAULT_OUTBOUND_BUFFER};

/// Placeholder JWT secret used when none is configured.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

/// Longest accepted access-token lifetime: ten years.
pub const MAX_TOKEN_TTL_MINUTES: u64 = 10 * 365 * 24 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a number, got {value:?}")]
    NotANumber { var: &'static str, value: String },

    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },

    #[error("{var} must be at most {max}")]
    TooLarge { var: &'static str, max: u64 },

    #[error("PARLEY_FANOUT_SCOPE: {0}")]
    Scope(#[from] parley_core::fanout::ParseScopeError),
}

/// Process configuration, read from `PARLEY_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub delivery_timeout: Duration,
    pub outbound_buffer: usize,
    pub fanout_scope: FanoutScope,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            db_path: "parley.db".into(),
            jwt_secret: DEV_JWT_SECRET.into(),
            token_ttl: chrono::Duration::minutes(60),
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            fanout_scope: FanoutScope::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from any variable source; unset variables keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(host) = lookup("PARLEY_HOST") {
            config.host = host;
        }
        if let Some(port) = number::<u16>(&lookup, "PARLEY_PORT")? {
            config.port = port;
        }
        if let Some(path) = lookup("PARLEY_DB_PATH") {
            config.db_path = path;
        }
        if let Some(secret) = lookup("PARLEY_JWT_SECRET").filter(|s| !s.is_empty()) {
            config.jwt_secret = secret;
        }
        if let Some(minutes) = positive(&lookup, "PARLEY_TOKEN_TTL_MINUTES")? {
            config.token_ttl = i64::try_from(minutes)
                .ok()
                .filter(|_| minutes <= MAX_TOKEN_TTL_MINUTES)
                .and_then(chrono::Duration::try_minutes)
                .ok_or(ConfigError::TooLarge {
                    var: "PARLEY_TOKEN_TTL_MINUTES",
                    max: MAX_TOKEN_TTL_MINUTES,
                })?;
        }
        if let Some(ms) = positive(&lookup, "PARLEY_DELIVERY_TIMEOUT_MS")? {
            config.delivery_timeout = Duration::from_millis(ms);
        }
        if let Some(size) = positive(&lookup, "PARLEY_OUTBOUND_BUFFER")? {
            config.outbound_buffer = size as usize;
        }
        if let Some(scope) = lookup("PARLEY_FANOUT_SCOPE") {
            config.fanout_scope = scope.parse()?;
        }

        Ok(config)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::NotANumber { var, value }),
    }
}

fn positive(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u64>, ConfigError> {
    match number::<u64>(lookup, var)? {
        Some(0) => Err(ConfigError::Zero { var }),
        other => Ok(other),
    }
}
