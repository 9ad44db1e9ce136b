//! Warehouse connection configuration.

use serde::{Deserialize, Serialize};

/// Connection parameters for the warehouse database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Cluster endpoint host
    #[serde(default = "default_host")]
    pub host: String,
    /// Database listening port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database name
    #[serde(default = "default_dbname")]
    pub dbname: String,
    /// Master username
    #[serde(default = "default_user")]
    pub user: String,
    /// Master password
    #[serde(default)]
    pub password: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5439
}

fn default_dbname() -> String {
    "dwh".to_string()
}

fn default_user() -> String {
    "dwh_admin".to_string()
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dbname: default_dbname(),
            user: default_user(),
            password: String::new(),
        }
    }
}

impl WarehouseConfig {
    /// Key-value connection string for tokio-postgres.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.dbname, self.user, self.password
        )
    }
}
