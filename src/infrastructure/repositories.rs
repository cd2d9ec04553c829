//! Repository implementations

use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::application::errors::StorageError;
use crate::config::DatabaseConfig;
use crate::domain::{ScanRecord, SeverityFilter, VulnerabilityEntry};

/// Persistence sink for canonical scan records
#[async_trait]
pub trait ScanRecordRepository: Send + Sync {
    /// Store one record as an independent insert
    async fn store(&self, record: &ScanRecord) -> Result<(), StorageError>;

    /// Every stored vulnerability whose severity equals `severity` exactly
    async fn find_by_severity(
        &self,
        severity: &str,
    ) -> Result<Vec<VulnerabilityEntry>, StorageError>;

    /// Cheap liveness probe of the backing store
    async fn ping(&self) -> Result<(), StorageError>;
}

/// SQLite-backed scan record repository
pub struct SqliteScanRecordRepository {
    pool: SqlitePool,
}

impl SqliteScanRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database named by `config.url`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        info!(url = %config.url, "connected to scan database");
        Ok(Self::new(pool))
    }

    /// Create the scan table, dropping any existing one first when `reset`
    pub async fn init_schema(&self, reset: bool) -> Result<(), StorageError> {
        if reset {
            sqlx::query("DROP TABLE IF EXISTS VulnerabilityScan")
                .execute(&self.pool)
                .await?;
            debug!("dropped VulnerabilityScan table");
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS VulnerabilityScan (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_file TEXT NOT NULL,
                scan_time TEXT NOT NULL,
                json_payload TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ScanRecordRepository for SqliteScanRecordRepository {
    async fn store(&self, record: &ScanRecord) -> Result<(), StorageError> {
        let payload = serde_json::to_string(&record.payload)?;

        sqlx::query(
            r#"
            INSERT INTO VulnerabilityScan (source_file, scan_time, json_payload)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&record.source_file)
        .bind(record.scan_time.to_rfc3339())
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(file = %record.source_file, "failed to store scan record: {}", e);
            StorageError::Database(e)
        })?;

        Ok(())
    }

    async fn find_by_severity(
        &self,
        severity: &str,
    ) -> Result<Vec<VulnerabilityEntry>, StorageError> {
        let rows = sqlx::query("SELECT json_payload FROM VulnerabilityScan ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut entries = Vec::new();
        for row in rows {
            let Some(text) = row.try_get::<Option<String>, _>("json_payload")? else {
                continue;
            };
            let payload: Value =
                serde_json::from_str(&text).map_err(|e| StorageError::Corrupt {
                    column: "json_payload".to_string(),
                    message: e.to_string(),
                })?;
            entries.extend(SeverityFilter::matching(&payload, severity));
        }

        debug!(severity, matches = entries.len(), "severity query complete");
        Ok(entries)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Process-local repository for tests and ephemeral runs
#[derive(Default)]
pub struct InMemoryScanRecordRepository {
    records: RwLock<Vec<ScanRecord>>,
}

impl InMemoryScanRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<ScanRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl ScanRecordRepository for InMemoryScanRecordRepository {
    async fn store(&self, record: &ScanRecord) -> Result<(), StorageError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn find_by_severity(
        &self,
        severity: &str,
    ) -> Result<Vec<VulnerabilityEntry>, StorageError> {
        let records = self.records.read().await;
        Ok(SeverityFilter::matching_records(records.iter(), severity))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
