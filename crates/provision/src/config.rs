//! Provisioning configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cluster provisioning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// Cloud region
    #[serde(default = "default_region")]
    pub region: String,
    /// Cluster identifier
    #[serde(default = "default_cluster_identifier")]
    pub cluster_identifier: String,
    /// Cluster type (single-node, multi-node)
    #[serde(default = "default_cluster_type")]
    pub cluster_type: String,
    /// Hardware node type
    #[serde(default = "default_node_type")]
    pub node_type: String,
    /// Number of nodes
    #[serde(default = "default_number_of_nodes")]
    pub number_of_nodes: i32,
    /// Name of the access role trusted by the warehouse service
    #[serde(default = "default_iam_role_name")]
    pub iam_role_name: String,
    /// CIDR allowed through the ingress rule. Defaults open for parity with
    /// throwaway clusters; narrow it for anything longer-lived.
    #[serde(default = "default_ingress_cidr")]
    pub ingress_cidr: String,
    /// Seconds between status polls while waiting on the cluster
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Maximum number of status polls before giving up
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_cluster_identifier() -> String {
    "dwh-cluster".to_string()
}

fn default_cluster_type() -> String {
    "multi-node".to_string()
}

fn default_node_type() -> String {
    "dc2.large".to_string()
}

fn default_number_of_nodes() -> i32 {
    4
}

fn default_iam_role_name() -> String {
    "dwh-s3-read-role".to_string()
}

fn default_ingress_cidr() -> String {
    "0.0.0.0/0".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_poll_attempts() -> u32 {
    120
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            cluster_identifier: default_cluster_identifier(),
            cluster_type: default_cluster_type(),
            node_type: default_node_type(),
            number_of_nodes: default_number_of_nodes(),
            iam_role_name: default_iam_role_name(),
            ingress_cidr: default_ingress_cidr(),
            poll_interval_secs: default_poll_interval_secs(),
            max_poll_attempts: default_max_poll_attempts(),
        }
    }
}

impl ProvisionConfig {
    /// Wait budget for the status poll loop.
    pub fn wait(&self) -> WaitConfig {
        WaitConfig {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_attempts: self.max_poll_attempts,
        }
    }
}

/// Bounded fixed-interval wait budget.
#[derive(Debug, Clone, Copy)]
pub struct WaitConfig {
    /// Time between polls
    pub interval: Duration,
    /// Number of polls before returning a timeout
    pub max_attempts: u32,
}
