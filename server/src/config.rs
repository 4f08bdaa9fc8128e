//! Gateway settings read from the environment.

use std::path::PathBuf;

use crate::ServerError;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_UI_DIR: &str = "ui";
/// Pages that require a signed-in visitor.
pub const DEFAULT_PROTECTED_PREFIXES: [&str; 3] = ["/projects", "/admin", "/usage"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
    pub port: u16,
    pub ui_dir: PathBuf,
    pub protected_prefixes: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            ui_dir: PathBuf::from(DEFAULT_UI_DIR),
            protected_prefixes: DEFAULT_PROTECTED_PREFIXES.iter().map(|p| (*p).to_owned()).collect(),
        }
    }
}

impl GatewayConfig {
    /// Optional:
    /// - `PORT`: listen port (default 3000)
    /// - `UI_DIR`: directory holding the built front end (default `ui`)
    /// - `PROTECTED_PREFIXES`: comma-separated path prefixes behind the guard
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is set but not a port number, or if
    /// `PROTECTED_PREFIXES` contains an entry not starting with `/`.
    pub fn from_env() -> Result<Self, ServerError> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("PORT") {
            config.port = raw
                .trim()
                .parse()
                .map_err(|_| ServerError::Config(format!("invalid PORT {raw:?}")))?;
        }
        if let Ok(dir) = std::env::var("UI_DIR") {
            config.ui_dir = PathBuf::from(dir);
        }
        if let Ok(raw) = std::env::var("PROTECTED_PREFIXES") {
            config.protected_prefixes = parse_prefixes(&raw)?;
        }
        Ok(config)
    }
}

fn parse_prefixes(raw: &str) -> Result<Vec<String>, ServerError> {
    raw.split(',')
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .map(|prefix| {
            if prefix.starts_with('/') {
                Ok(prefix.to_owned())
            } else {
                Err(ServerError::Config(format!("protected prefix {prefix:?} must start with '/'")))
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
