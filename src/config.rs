//! Session-layer configuration parsed from environment variables.

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:3001";
pub const DEFAULT_COOKIE_TTL_DAYS: i64 = 7;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const HOME_PATH: &str = "/";
pub const ADMIN_PREFIX: &str = "/admin";

/// Query parameter carrying the post-login return path.
pub const RETURN_PATH_PARAM: &str = "from";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Backend origin without the `/api` suffix, e.g. `http://localhost:3001`.
    pub api_origin: String,
    /// Lifetime of the access-token cookie mirror.
    pub cookie_ttl_days: i64,
    pub timeouts: Timeouts,
    pub login_path: String,
    pub register_path: String,
    pub home_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::with_origin(DEFAULT_API_URL)
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_origin(origin: &str) -> Self {
        Self {
            api_origin: origin.trim_end_matches('/').to_owned(),
            cookie_ttl_days: DEFAULT_COOKIE_TTL_DAYS,
            timeouts: Timeouts::default(),
            login_path: LOGIN_PATH.to_owned(),
            register_path: REGISTER_PATH.to_owned(),
            home_path: HOME_PATH.to_owned(),
        }
    }

    /// Build typed session config from environment variables.
    ///
    /// Optional:
    /// - `INSIGHT_API_URL`: backend origin (default `http://localhost:3001`)
    /// - `INSIGHT_COOKIE_TTL_DAYS`: default 7
    /// - `INSIGHT_REQUEST_TIMEOUT_SECS`: default 30
    /// - `INSIGHT_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let origin = std::env::var("INSIGHT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let mut config = Self::with_origin(&origin);
        config.validate()?;

        config.cookie_ttl_days = env_parse("INSIGHT_COOKIE_TTL_DAYS", DEFAULT_COOKIE_TTL_DAYS)?;
        if config.cookie_ttl_days <= 0 {
            return Err(ConfigError::InvalidValue {
                var: "INSIGHT_COOKIE_TTL_DAYS",
                value: config.cookie_ttl_days.to_string(),
            });
        }
        config.timeouts = Timeouts {
            request_secs: env_parse("INSIGHT_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: env_parse("INSIGHT_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        Ok(config)
    }

    /// Base URL every API path is resolved against: origin + `/api`.
    #[must_use]
    pub fn api_base(&self) -> String {
        format!("{}/api", self.api_origin)
    }

    /// Check that the origin is an absolute `http`/`https` URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] otherwise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.api_origin) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
            _ => Err(ConfigError::InvalidUrl(self.api_origin.clone())),
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
