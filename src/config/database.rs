use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::env;
use std::time::Duration;

/// Where rows live. `memory` keeps everything in-process and is meant for
/// local runs; data is gone on restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    pub fn from_env() -> Result<Self> {
        match env::var("STORAGE_BACKEND") {
            Ok(raw) => Self::parse(&raw),
            Err(_) => Ok(StorageBackend::Postgres),
        }
    }

    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow::anyhow!(
                "STORAGE_BACKEND must be 'postgres' or 'memory', got '{}'",
                other
            )),
        }
    }
}

pub async fn get_database() -> Result<DatabaseConnection> {
    let database_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    let max_connections: u32 = env::var("DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);

    let min_connections: u32 = env::var("DB_MIN_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2);

    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(max_connections)
        .min_connections(min_connections)
        .connect_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true);

    Ok(Database::connect(opt).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_backend() {
        assert_eq!(StorageBackend::parse("Memory").unwrap(), StorageBackend::Memory);
        assert_eq!(StorageBackend::parse("postgres").unwrap(), StorageBackend::Postgres);
        assert!(StorageBackend::parse("sqlite").is_err());
    }
}
