//! Process settings from the environment (`.env` is loaded by the binary via dotenvy).

use crate::error::ConfigError;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub enum DatabaseSettings {
    /// Full connection string from `DATABASE_URL`.
    Url(String),
    Parts {
        host: String,
        port: u16,
        user: Option<String>,
        password: Option<String>,
        database: Option<String>,
        ssl: bool,
    },
}

impl DatabaseSettings {
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        match self {
            DatabaseSettings::Url(url) => PgConnectOptions::from_str(url).map_err(|e| ConfigError::Setting {
                name: "DATABASE_URL",
                message: e.to_string(),
            }),
            DatabaseSettings::Parts {
                host,
                port,
                user,
                password,
                database,
                ssl,
            } => {
                let mut opts = PgConnectOptions::new()
                    .host(host)
                    .port(*port)
                    .ssl_mode(if *ssl { PgSslMode::Require } else { PgSslMode::Disable });
                if let Some(u) = user {
                    opts = opts.username(u);
                }
                if let Some(p) = password {
                    opts = opts.password(p);
                }
                if let Some(d) = database {
                    opts = opts.database(d);
                }
                Ok(opts)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub host: IpAddr,
    pub port: u16,
    pub database: DatabaseSettings,
    pub max_connections: u32,
    /// Catalog file; the embedded catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
    pub auto_migrate: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database = match get("DATABASE_URL") {
            Some(url) => DatabaseSettings::Url(url),
            None => DatabaseSettings::Parts {
                host: get("DB_HOST").unwrap_or_else(|| "localhost".into()),
                port: parse_or(get("DB_PORT"), "DB_PORT", 5432)?,
                user: get("DB_USER"),
                password: lookup("DB_PASSWORD").filter(|v| !v.is_empty()),
                database: get("DB_NAME"),
                ssl: get("DB_SSL").is_some_and(|v| v.eq_ignore_ascii_case("true")),
            },
        };

        Ok(Settings {
            host: parse_or(get("HOST"), "HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or(get("PORT"), "PORT", 2001)?,
            database,
            max_connections: parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 5)?,
            catalog_path: get("MASTERS_CATALOG").map(PathBuf::from),
            auto_migrate: get("AUTO_MIGRATE").is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1"),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Setting {
            name,
            message: format!("'{}': {}", v, e),
        }),
    }
}
