//! Warehouse ETL
//!
//! Two-stage pipeline for building a star-schema analytics database:
//! - provision: access role, cluster creation, bounded status wait, ingress
//! - load: drop/create the seven tables, bulk COPY the staging tables,
//!   transform them into the dimensional model

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use provision::{AwsControlPlane, ClusterRequest, ProvisionConfig, Provisioner};
use telemetry::init_tracing_from_env;
use warehouse::{SourceConfig, WarehouseClient, WarehouseConfig};

#[derive(Parser)]
#[command(name = "warehouse-etl", version, about = "Provision a warehouse cluster and build the star schema")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Provision the cluster and print its endpoint and role ARN
    Provision,
    /// Delete the cluster, skipping the final snapshot
    Teardown,
    /// Drop and recreate the seven tables
    CreateTables,
    /// Drop the seven tables
    DropTables,
    /// Bulk-load the staging tables from object storage
    Load {
        /// Access-role ARN authorizing the COPY (printed by `provision`)
        #[arg(long)]
        role_arn: String,
    },
    /// Populate dimension and fact tables from the staging tables
    Transform,
    /// Full rebuild: create-tables, load, transform
    Run {
        /// Access-role ARN authorizing the COPY (printed by `provision`)
        #[arg(long)]
        role_arn: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default)]
    provision: ProvisionConfig,

    #[serde(default)]
    warehouse: WarehouseConfig,

    #[serde(default)]
    sources: SourceConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing_from_env();

    let cli = Cli::parse();
    let config = load_config()?;

    match cli.command {
        Command::Provision => provision_cluster(&config).await,
        Command::Teardown => teardown_cluster(&config).await,
        Command::CreateTables => {
            let client = connect(&config).await?;
            warehouse::schema::drop_schema(&client).await?;
            warehouse::schema::init_schema(&client).await?;
            Ok(())
        }
        Command::DropTables => {
            let client = connect(&config).await?;
            warehouse::schema::drop_schema(&client).await?;
            Ok(())
        }
        Command::Load { role_arn } => {
            let client = connect(&config).await?;
            warehouse::load_staging(&client, &config.sources, &role_arn).await?;
            Ok(())
        }
        Command::Transform => {
            let client = connect(&config).await?;
            warehouse::run_transform(&client).await?;
            Ok(())
        }
        Command::Run { role_arn } => {
            let client = connect(&config).await?;
            warehouse::schema::drop_schema(&client).await?;
            warehouse::schema::init_schema(&client).await?;
            warehouse::load_staging(&client, &config.sources, &role_arn).await?;
            warehouse::run_transform(&client).await?;
            info!("Warehouse rebuild complete");
            Ok(())
        }
    }
}

async fn provision_cluster(config: &Config) -> Result<()> {
    let control_plane = Arc::new(AwsControlPlane::new(&config.provision.region).await);
    let provisioner = Provisioner::new(control_plane, config.provision.clone());

    let request = ClusterRequest {
        identifier: config.provision.cluster_identifier.clone(),
        cluster_type: config.provision.cluster_type.clone(),
        node_type: config.provision.node_type.clone(),
        number_of_nodes: config.provision.number_of_nodes,
        db_name: config.warehouse.dbname.clone(),
        db_port: config.warehouse.port,
        master_username: config.warehouse.user.clone(),
        master_user_password: config.warehouse.password.clone(),
        role_arn: None,
    };

    let cluster = provisioner
        .provision(request)
        .await
        .context("Provisioning failed")?;

    // Stdout carries the two values downstream stages need; everything else
    // goes through tracing.
    println!("endpoint={}", cluster.endpoint);
    println!("role_arn={}", cluster.role_arn);
    Ok(())
}

async fn teardown_cluster(config: &Config) -> Result<()> {
    let control_plane = Arc::new(AwsControlPlane::new(&config.provision.region).await);
    let provisioner = Provisioner::new(control_plane, config.provision.clone());

    provisioner
        .teardown(&config.provision.cluster_identifier)
        .await
        .context("Teardown failed")?;
    Ok(())
}

async fn connect(config: &Config) -> Result<WarehouseClient> {
    let client = WarehouseClient::connect(config.warehouse.clone())
        .await
        .context("Failed to connect to warehouse")?;

    if !warehouse::health::check_connection(&client).await {
        anyhow::bail!("Warehouse did not answer the health probe");
    }

    Ok(client)
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("DWH")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Manual overrides for nested values the env separator handles poorly
    if let Ok(host) = std::env::var("DWH_WAREHOUSE_HOST") {
        config.warehouse.host = host;
    }
    if let Ok(password) = std::env::var("DWH_WAREHOUSE_PASSWORD") {
        config.warehouse.password = password;
    }
    if let Ok(cluster) = std::env::var("DWH_CLUSTER_IDENTIFIER") {
        config.provision.cluster_identifier = cluster;
    }

    Ok(config)
}
