//! Warehouse client wrapper.

use crate::config::WarehouseConfig;
use etl_core::{Error, Result};
use tokio_postgres::NoTls;
use tracing::{error, info};

/// Wrapper over a tokio-postgres connection to the warehouse.
///
/// The connection driver task is owned here and aborted on drop, so a
/// failure partway through a run doesn't leak the connection.
pub struct WarehouseClient {
    inner: tokio_postgres::Client,
    driver: tokio::task::JoinHandle<()>,
    config: WarehouseConfig,
}

impl WarehouseClient {
    /// Connect to the warehouse.
    pub async fn connect(config: WarehouseConfig) -> Result<Self> {
        let (inner, connection) = tokio_postgres::connect(&config.connection_string(), NoTls)
            .await
            .map_err(|e| Error::sql("connect", e))?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "Warehouse connection error");
            }
        });

        info!(
            host = %config.host,
            port = config.port,
            dbname = %config.dbname,
            "Connected to warehouse"
        );

        Ok(Self {
            inner,
            driver,
            config,
        })
    }

    /// Returns the inner tokio-postgres client.
    pub fn inner(&self) -> &tokio_postgres::Client {
        &self.inner
    }

    /// Returns the configuration.
    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Execute one named statement. Each statement commits on its own;
    /// there is no wrapping transaction.
    pub async fn execute_named(&self, name: &'static str, sql: &str) -> Result<u64> {
        self.inner
            .execute(sql, &[])
            .await
            .map_err(|e| Error::sql(name, e))
    }

    /// Execute a batch of semicolon-separated statements.
    pub async fn batch_execute(&self, name: &'static str, sql: &str) -> Result<()> {
        self.inner
            .batch_execute(sql)
            .await
            .map_err(|e| Error::sql(name, e))
    }
}

impl Drop for WarehouseClient {
    fn drop(&mut self) {
        self.driver.abort();
    }
}
