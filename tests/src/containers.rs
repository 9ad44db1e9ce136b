//! Testcontainer setup for the warehouse.
//!
//! The target cluster speaks the Postgres wire protocol, so a throwaway
//! Postgres container stands in for it. Set DWH_TEST_WAREHOUSE_HOST (and
//! friends) to point at an existing database instead.

use testcontainers_modules::{
    postgres::Postgres,
    testcontainers::{runners::AsyncRunner, ContainerAsync},
};
use warehouse::{WarehouseClient, WarehouseConfig};

/// Container handle for the throwaway warehouse.
pub struct TestWarehouse {
    #[allow(dead_code)]
    container: Option<ContainerAsync<Postgres>>,
    pub config: WarehouseConfig,
}

impl TestWarehouse {
    /// Start a Postgres container (or reuse an externally provided one).
    pub async fn start() -> Self {
        if let Some(host) = std::env::var("DWH_TEST_WAREHOUSE_HOST")
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            let config = WarehouseConfig {
                host,
                port: std::env::var("DWH_TEST_WAREHOUSE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(5432),
                dbname: std::env::var("DWH_TEST_WAREHOUSE_DB")
                    .unwrap_or_else(|_| "postgres".to_string()),
                user: std::env::var("DWH_TEST_WAREHOUSE_USER")
                    .unwrap_or_else(|_| "postgres".to_string()),
                password: std::env::var("DWH_TEST_WAREHOUSE_PASSWORD")
                    .unwrap_or_else(|_| "postgres".to_string()),
            };
            return Self {
                container: None,
                config,
            };
        }

        let container = Postgres::default()
            .start()
            .await
            .expect("Failed to start Postgres container");

        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to resolve mapped Postgres port");

        let config = WarehouseConfig {
            host: "127.0.0.1".to_string(),
            port,
            dbname: "postgres".to_string(),
            user: "postgres".to_string(),
            password: "postgres".to_string(),
        };

        Self {
            container: Some(container),
            config,
        }
    }

    /// Connect a warehouse client to the container.
    pub async fn client(&self) -> WarehouseClient {
        WarehouseClient::connect(self.config.clone())
            .await
            .expect("Failed to connect to test warehouse")
    }

    /// Connect and rebuild the schema from scratch.
    pub async fn fresh_client(&self) -> WarehouseClient {
        let client = self.client().await;
        warehouse::schema::drop_schema(&client)
            .await
            .expect("Failed to drop schema");
        warehouse::schema::init_schema(&client)
            .await
            .expect("Failed to create schema");
        client
    }
}
