use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::{Context, bail};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Postgres { database_url: String },
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub bind_addr: String,
    pub max_connections: u32,
    pub store_timeout: Duration,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let backend = match try_load::<String>(&lookup, "FRONTROW_STORE", "postgres")?.as_str() {
            "postgres" => Backend::Postgres {
                database_url: lookup("DATABASE_URL").context("DATABASE_URL must be set")?,
            },
            "memory" => Backend::Memory,
            other => bail!("Invalid FRONTROW_STORE value: {other} (expected postgres or memory)"),
        };

        Ok(Self {
            backend,
            bind_addr: try_load(&lookup, "BIND_ADDR", "0.0.0.0:3000")?,
            max_connections: try_load(&lookup, "DB_MAX_CONNECTIONS", "5")?,
            store_timeout: Duration::from_millis(try_load(&lookup, "STORE_TIMEOUT_MS", "5000")?),
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("Invalid {key} value {raw:?}: {e}"))
}
