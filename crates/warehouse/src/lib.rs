//! Warehouse client and star-schema ETL statements.

pub mod client;
pub mod config;
pub mod copy;
pub mod health;
pub mod schema;
pub mod transform;

pub use client::WarehouseClient;
pub use config::WarehouseConfig;
pub use copy::{load_staging, CopyStatement, SourceConfig};
pub use transform::run_transform;
