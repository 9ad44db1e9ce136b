//! Control-plane seam.
//!
//! The provisioning flow only talks to the cloud through this trait, so
//! tests can script cluster status transitions without a cloud account.

use async_trait::async_trait;
use etl_core::{ClusterDescription, Result};

/// Parameters for a cluster-creation request.
#[derive(Debug, Clone)]
pub struct ClusterRequest {
    pub identifier: String,
    pub cluster_type: String,
    pub node_type: String,
    pub number_of_nodes: i32,
    pub db_name: String,
    pub db_port: u16,
    pub master_username: String,
    pub master_user_password: String,
    /// ARN of the access role attached at creation, resolved by the
    /// provisioner before the request is issued.
    pub role_arn: Option<String>,
}

/// One ingress rule on the cluster's network boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressRule {
    pub cidr: String,
    pub port: u16,
}

/// Cloud control-plane operations the provisioner needs.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Ensure the access role trusted by the warehouse service exists with
    /// read access to the object store. Returns the role's identifier (ARN).
    /// An already-existing role is success.
    async fn ensure_access_role(&self, role_name: &str) -> Result<String>;

    /// Request cluster creation. An already-existing cluster is success.
    async fn create_cluster(&self, request: &ClusterRequest) -> Result<()>;

    /// Fetch the current cluster state. A missing cluster is reported as
    /// `ClusterStatus::NotFound`, not an error.
    async fn describe_cluster(&self, identifier: &str) -> Result<ClusterDescription>;

    /// Open one ingress rule on the default security group of the cluster's
    /// VPC. A pre-existing identical rule is success.
    async fn authorize_ingress(&self, vpc_id: &str, rule: &IngressRule) -> Result<()>;

    /// Request cluster deletion, skipping the final snapshot.
    async fn delete_cluster(&self, identifier: &str) -> Result<()>;
}
