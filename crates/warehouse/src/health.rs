//! Warehouse health and catalog checks.

use crate::client::WarehouseClient;
use crate::schema::SCHEMA_NAME;
use etl_core::{Error, Result};
use tracing::{debug, error};

/// Check warehouse connection health.
pub async fn check_connection(client: &WarehouseClient) -> bool {
    match client.inner().query_one("SELECT 1", &[]).await {
        Ok(_) => {
            debug!("Warehouse connection healthy");
            true
        }
        Err(e) => {
            error!(error = %e, "Warehouse health check failed");
            false
        }
    }
}

/// Whether a table exists in the analytics schema.
pub async fn table_exists(client: &WarehouseClient, table: &str) -> Result<bool> {
    let row = client
        .inner()
        .query_one(
            "SELECT EXISTS (
                 SELECT 1 FROM information_schema.tables
                 WHERE table_schema = $1 AND table_name = $2
             )",
            &[&SCHEMA_NAME, &table],
        )
        .await
        .map_err(|e| Error::sql("table_exists", e))?;
    Ok(row.get(0))
}

/// Column names of a table in the analytics schema, in declaration order.
pub async fn table_columns(client: &WarehouseClient, table: &str) -> Result<Vec<String>> {
    let rows = client
        .inner()
        .query(
            "SELECT column_name FROM information_schema.columns
             WHERE table_schema = $1 AND table_name = $2
             ORDER BY ordinal_position",
            &[&SCHEMA_NAME, &table],
        )
        .await
        .map_err(|e| Error::sql("table_columns", e))?;
    Ok(rows.iter().map(|r| r.get(0)).collect())
}

/// Names of the primary-key columns of a table in the analytics schema.
pub async fn primary_key_columns(client: &WarehouseClient, table: &str) -> Result<Vec<String>> {
    let rows = client
        .inner()
        .query(
            "SELECT kcu.column_name
             FROM information_schema.table_constraints tc
             JOIN information_schema.key_column_usage kcu
               ON tc.constraint_name = kcu.constraint_name
              AND tc.table_schema = kcu.table_schema
             WHERE tc.table_schema = $1
               AND tc.table_name = $2
               AND tc.constraint_type = 'PRIMARY KEY'
             ORDER BY kcu.ordinal_position",
            &[&SCHEMA_NAME, &table],
        )
        .await
        .map_err(|e| Error::sql("primary_key_columns", e))?;
    Ok(rows.iter().map(|r| r.get(0)).collect())
}
