use std::env;
use std::fmt;

use thiserror::Error;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_DATABASE: &str = "gym_management";
pub const DEFAULT_USER: &str = "postgres";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("DB_PORT must be a port number, got {0:?}")]
    InvalidPort(String),
}

/// Database endpoint. `url`, when present, wins over the discrete fields.
#[derive(Clone, PartialEq)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE.to_string(),
            user: DEFAULT_USER.to_string(),
            password: String::new(),
        }
    }
}

impl DatabaseConfig {
    /// Reads `DATABASE_URL`, or `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER`
    /// and `DB_PASSWORD` with defaults. Load a `.env` file first if one
    /// should apply.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let port = match non_empty("DB_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => defaults.port,
        };

        Ok(Self {
            url: non_empty("DATABASE_URL"),
            host: non_empty("DB_HOST").unwrap_or(defaults.host),
            port,
            database: non_empty("DB_NAME").unwrap_or(defaults.database),
            user: non_empty("DB_USER").unwrap_or(defaults.user),
            password: lookup("DB_PASSWORD").unwrap_or(defaults.password),
        })
    }

    /// URL if configured, otherwise a libpq key/value string.
    pub fn connection_string(&self) -> String {
        if let Some(ref url) = self.url {
            return url.clone();
        }

        let mut params = format!(
            "host={} port={} dbname={} user={}",
            quote_param(&self.host),
            self.port,
            quote_param(&self.database),
            quote_param(&self.user)
        );
        if !self.password.is_empty() {
            params.push_str(" password=");
            params.push_str(&quote_param(&self.password));
        }
        params
    }

    /// Endpoint description safe to log.
    pub fn describe(&self) -> String {
        match self.url {
            Some(_) => "DATABASE_URL".to_string(),
            None => format!(
                "{}@{}:{}/{}",
                self.user, self.host, self.port, self.database
            ),
        }
    }
}

fn quote_param(value: &str) -> String {
    if !value.is_empty() && !value.contains(|c: char| c.is_whitespace() || c == '\'' || c == '\\') {
        return value.to_string();
    }
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
