//! Cluster provisioning flow.
//!
//! Role, cluster, bounded status wait, ingress. The ingress rule is
//! best-effort: a failure there leaves a reachable-from-inside cluster, and
//! the run keeps going the way the rest of the flow would.

use std::sync::Arc;
use tokio::time::sleep;
use tracing::{info, warn};

use etl_core::{ClusterDescription, ClusterStatus, Error, ProvisionedCluster, Result};

use crate::config::{ProvisionConfig, WaitConfig};
use crate::control_plane::{ClusterRequest, ControlPlane, IngressRule};

/// Drives the control plane through the provisioning sequence.
pub struct Provisioner<C: ControlPlane> {
    control_plane: Arc<C>,
    config: ProvisionConfig,
}

impl<C: ControlPlane> Provisioner<C> {
    pub fn new(control_plane: Arc<C>, config: ProvisionConfig) -> Self {
        Self {
            control_plane,
            config,
        }
    }

    /// Provision the cluster end to end and return what downstream stages
    /// need: the endpoint to connect to and the role ARN for bulk COPY.
    pub async fn provision(&self, mut request: ClusterRequest) -> Result<ProvisionedCluster> {
        info!(role = %self.config.iam_role_name, "Ensuring access role");
        let role_arn = self
            .control_plane
            .ensure_access_role(&self.config.iam_role_name)
            .await?;
        request.role_arn = Some(role_arn.clone());

        let db_port = request.db_port;
        info!(cluster = %request.identifier, "Creating cluster");
        self.control_plane.create_cluster(&request).await?;

        let description = self
            .wait_until_available(&request.identifier, self.config.wait())
            .await?;

        let endpoint = description
            .endpoint
            .ok_or_else(|| Error::missing_field("cluster.endpoint"))?;
        // Prefer the ARN the cluster actually reports; it is the one COPY
        // will authenticate with.
        let role_arn = description.role_arn.unwrap_or(role_arn);

        info!(endpoint = %endpoint, role_arn = %role_arn, "Cluster available");

        let rule = IngressRule {
            cidr: self.config.ingress_cidr.clone(),
            port: db_port,
        };
        match description.vpc_id {
            Some(vpc_id) => {
                if let Err(e) = self.control_plane.authorize_ingress(&vpc_id, &rule).await {
                    warn!(error = %e, "Failed to open ingress rule, continuing");
                }
            }
            None => warn!("Cluster reported no VPC, skipping ingress rule"),
        }

        Ok(ProvisionedCluster { endpoint, role_arn })
    }

    /// Tear the cluster down and wait, bounded, until it is gone.
    pub async fn teardown(&self, identifier: &str) -> Result<()> {
        self.control_plane.delete_cluster(identifier).await?;
        self.wait_until_gone(identifier, self.config.wait()).await?;
        info!(cluster = identifier, "Cluster deleted");
        Ok(())
    }

    /// Poll on a fixed interval until the cluster reports `available`.
    ///
    /// The attempt budget is the redesigned replacement for the original
    /// unbounded loop: exhausting it returns `Error::Timeout`, and a
    /// terminal status aborts early instead of burning the whole budget.
    async fn wait_until_available(
        &self,
        identifier: &str,
        wait: WaitConfig,
    ) -> Result<ClusterDescription> {
        for attempt in 1..=wait.max_attempts {
            let description = self.control_plane.describe_cluster(identifier).await?;
            let status = description
                .status
                .clone()
                .unwrap_or(ClusterStatus::NotFound);

            match status {
                ClusterStatus::Available => return Ok(description),
                status if status.is_terminal_failure() => {
                    return Err(Error::cloud(
                        "wait_until_available",
                        format!("cluster entered terminal status {}", status),
                    ));
                }
                status => {
                    info!(
                        cluster = identifier,
                        status = %status,
                        attempt,
                        max_attempts = wait.max_attempts,
                        "Still waiting for cluster"
                    );
                }
            }

            if attempt < wait.max_attempts {
                sleep(wait.interval).await;
            }
        }

        Err(Error::timeout(wait.max_attempts, wait.interval))
    }

    async fn wait_until_gone(&self, identifier: &str, wait: WaitConfig) -> Result<()> {
        for attempt in 1..=wait.max_attempts {
            let description = self.control_plane.describe_cluster(identifier).await?;
            match description.status {
                Some(ClusterStatus::NotFound) | None => return Ok(()),
                Some(status) => {
                    info!(
                        cluster = identifier,
                        status = %status,
                        attempt,
                        "Waiting for cluster deletion"
                    );
                }
            }

            if attempt < wait.max_attempts {
                sleep(wait.interval).await;
            }
        }

        Err(Error::timeout(wait.max_attempts, wait.interval))
    }
}
