//! PostgreSQL source-of-truth client.
//!
//! [`SensorDb`] wraps a deadpool-postgres pool and implements the
//! [`SensorSource`] seam the cache layer consumes. Connections are checked
//! out per call and released on every exit path when the pooled object
//! drops; nothing in this module holds a connection across awaits it does
//! not own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts};
use std::time::Duration;
use tokio_postgres::{NoTls, Row};

use pulse_cache::SensorSource;
use pulse_core::{DataSourceError, QueryParams, SensorMetadata, SensorRecord};

use crate::error::{ApiError, ApiResult};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Checkout wait timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "pulse".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("PULSE_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("PULSE_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("PULSE_DB_NAME").unwrap_or_else(|_| "pulse".to_string()),
            user: std::env::var("PULSE_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("PULSE_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("PULSE_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("PULSE_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(PoolConfig {
            max_size: self.max_size,
            timeouts: Timeouts {
                wait: Some(self.timeout),
                ..Timeouts::default()
            },
            ..PoolConfig::default()
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::internal_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

const SELECT_COLUMNS: &str = "machine_id, timestamp, temperature, vibration, energy_consumption, \
     data_type, \
     metadata_material_type, metadata_pressure_range, metadata_material_thickness, \
     metadata_cutting_speed, metadata_coolant_type, \
     metadata_product_type, metadata_line_speed, metadata_batch_size";

/// Sensor-data client over a pooled PostgreSQL connection.
#[derive(Clone)]
pub struct SensorDb {
    pool: Pool,
}

impl SensorDb {
    /// Create a new client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> Result<deadpool_postgres::Object, DataSourceError> {
        self.pool.get().await.map_err(|e| DataSourceError::Pool {
            reason: e.to_string(),
        })
    }

    /// Liveness probe for health endpoints.
    pub async fn ping(&self) -> Result<(), DataSourceError> {
        let conn = self.get_conn().await?;
        conn.simple_query("SELECT 1")
            .await
            .map(|_| ())
            .map_err(|e| DataSourceError::Query {
                reason: e.to_string(),
            })
    }
}

fn decode_row(row: &Row) -> Result<SensorRecord, DataSourceError> {
    let decode = |e: tokio_postgres::Error| DataSourceError::Decode {
        reason: e.to_string(),
    };
    Ok(SensorRecord {
        machine_id: row.try_get("machine_id").map_err(decode)?,
        timestamp: row
            .try_get::<_, DateTime<Utc>>("timestamp")
            .map_err(decode)?,
        temperature: row.try_get("temperature").map_err(decode)?,
        vibration: row.try_get("vibration").map_err(decode)?,
        energy_consumption: row.try_get("energy_consumption").map_err(decode)?,
        data_type: row
            .try_get::<_, Option<String>>("data_type")
            .map_err(decode)?
            .unwrap_or_else(|| "default".to_string()),
        metadata: SensorMetadata {
            material_type: row.try_get("metadata_material_type").map_err(decode)?,
            pressure_range: row.try_get("metadata_pressure_range").map_err(decode)?,
            material_thickness: row.try_get("metadata_material_thickness").map_err(decode)?,
            cutting_speed: row.try_get("metadata_cutting_speed").map_err(decode)?,
            coolant_type: row.try_get("metadata_coolant_type").map_err(decode)?,
            product_type: row.try_get("metadata_product_type").map_err(decode)?,
            line_speed: row.try_get("metadata_line_speed").map_err(decode)?,
            batch_size: row.try_get("metadata_batch_size").map_err(decode)?,
        },
    })
}

#[async_trait]
impl SensorSource for SensorDb {
    async fn query_records(
        &self,
        params: &QueryParams,
    ) -> Result<Vec<SensorRecord>, DataSourceError> {
        let conn = self.get_conn().await?;
        let query = format!(
            "SELECT {SELECT_COLUMNS}
             FROM sensor_data
             WHERE ($1::timestamptz IS NULL OR timestamp >= $1)
               AND ($2::timestamptz IS NULL OR timestamp <= $2)
             ORDER BY timestamp DESC
             LIMIT $3 OFFSET $4"
        );
        let rows = conn
            .query(
                &query,
                &[
                    &params.start_time(),
                    &params.end_time(),
                    &params.limit(),
                    &params.offset(),
                ],
            )
            .await
            .map_err(|e| DataSourceError::Query {
                reason: e.to_string(),
            })?;
        rows.iter().map(decode_row).collect()
    }

    async fn query_recent_window(
        &self,
        window: Duration,
    ) -> Result<Vec<SensorRecord>, DataSourceError> {
        let cutoff = Utc::now() - chrono::Duration::seconds(window.as_secs() as i64);
        let conn = self.get_conn().await?;
        let query = format!(
            "SELECT {SELECT_COLUMNS}
             FROM sensor_data
             WHERE timestamp >= $1
             ORDER BY timestamp DESC"
        );
        let rows = conn
            .query(&query, &[&cutoff])
            .await
            .map_err(|e| DataSourceError::Query {
                reason: e.to_string(),
            })?;
        rows.iter().map(decode_row).collect()
    }

    async fn insert_records(&self, records: &[SensorRecord]) -> Result<u64, DataSourceError> {
        let conn = self.get_conn().await?;
        let statement = conn
            .prepare_cached(
                "INSERT INTO sensor_data (machine_id, timestamp, temperature, vibration, \
                 energy_consumption, data_type, \
                 metadata_material_type, metadata_pressure_range, metadata_material_thickness, \
                 metadata_cutting_speed, metadata_coolant_type, \
                 metadata_product_type, metadata_line_speed, metadata_batch_size) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
            )
            .await
            .map_err(|e| DataSourceError::Query {
                reason: e.to_string(),
            })?;

        let mut written = 0u64;
        for record in records {
            written += conn
                .execute(
                    &statement,
                    &[
                        &record.machine_id,
                        &record.timestamp,
                        &record.temperature,
                        &record.vibration,
                        &record.energy_consumption,
                        &record.data_type,
                        &record.metadata.material_type,
                        &record.metadata.pressure_range,
                        &record.metadata.material_thickness,
                        &record.metadata.cutting_speed,
                        &record.metadata.coolant_type,
                        &record.metadata.product_type,
                        &record.metadata.line_speed,
                        &record.metadata.batch_size,
                    ],
                )
                .await
                .map_err(|e| DataSourceError::Query {
                    reason: e.to_string(),
                })?;
        }
        Ok(written)
    }
}
