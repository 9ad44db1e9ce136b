//! AWS implementation of the control-plane seam.
//!
//! Three service clients: IAM for the access role, Redshift for the cluster
//! itself, EC2 for the security-group ingress rule. Credentials come from
//! the SDK's default chain (environment, profile, instance metadata), never
//! from this repo's config file.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ec2::error::ProvideErrorMetadata;
use aws_sdk_ec2::types::{Filter, IpPermission, IpRange};
use etl_core::{ClusterDescription, ClusterEndpoint, ClusterStatus, Error, Result};
use tracing::{debug, info};

use crate::control_plane::{ClusterRequest, ControlPlane, IngressRule};

/// Managed policy granting read access to the object store holding the
/// source files.
const S3_READ_ONLY_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AmazonS3ReadOnlyAccess";

/// AWS control plane backed by the IAM, Redshift and EC2 service clients.
pub struct AwsControlPlane {
    iam: aws_sdk_iam::Client,
    redshift: aws_sdk_redshift::Client,
    ec2: aws_sdk_ec2::Client,
}

impl AwsControlPlane {
    /// Build the service clients for a region using the default credential
    /// chain.
    pub async fn new(region: &str) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            iam: aws_sdk_iam::Client::new(&shared),
            redshift: aws_sdk_redshift::Client::new(&shared),
            ec2: aws_sdk_ec2::Client::new(&shared),
        }
    }

    /// Trust policy allowing the warehouse service to assume the role.
    fn assume_role_policy() -> String {
        serde_json::json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Action": "sts:AssumeRole",
                "Effect": "Allow",
                "Principal": { "Service": "redshift.amazonaws.com" }
            }]
        })
        .to_string()
    }
}

#[async_trait]
impl ControlPlane for AwsControlPlane {
    async fn ensure_access_role(&self, role_name: &str) -> Result<String> {
        let create = self
            .iam
            .create_role()
            .path("/")
            .role_name(role_name)
            .description("Allows the warehouse cluster to read source files from S3")
            .assume_role_policy_document(Self::assume_role_policy())
            .send()
            .await;

        match create {
            Ok(_) => info!(role = role_name, "Created access role"),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_entity_already_exists_exception() {
                    debug!(role = role_name, "Access role already exists");
                } else {
                    return Err(Error::cloud(
                        "create_role",
                        aws_sdk_iam::error::DisplayErrorContext(&service_err),
                    ));
                }
            }
        }

        // Idempotent, safe to re-attach on every run.
        self.iam
            .attach_role_policy()
            .role_name(role_name)
            .policy_arn(S3_READ_ONLY_POLICY_ARN)
            .send()
            .await
            .map_err(|e| {
                Error::cloud(
                    "attach_role_policy",
                    aws_sdk_iam::error::DisplayErrorContext(&e),
                )
            })?;

        let role = self
            .iam
            .get_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| Error::cloud("get_role", aws_sdk_iam::error::DisplayErrorContext(&e)))?;

        let arn = role
            .role()
            .map(|r| r.arn().to_string())
            .ok_or_else(|| Error::missing_field("role.arn"))?;

        info!(role = role_name, arn = %arn, "Access role ready");
        Ok(arn)
    }

    async fn create_cluster(&self, request: &ClusterRequest) -> Result<()> {
        let role_arn = request
            .role_arn
            .clone()
            .ok_or_else(|| Error::missing_field("request.role_arn"))?;

        let result = self
            .redshift
            .create_cluster()
            .cluster_type(&request.cluster_type)
            .node_type(&request.node_type)
            .number_of_nodes(request.number_of_nodes)
            .db_name(&request.db_name)
            .port(i32::from(request.db_port))
            .cluster_identifier(&request.identifier)
            .master_username(&request.master_username)
            .master_user_password(&request.master_user_password)
            .iam_roles(role_arn)
            .send()
            .await;

        match result {
            Ok(_) => {
                info!(cluster = %request.identifier, "Requested cluster creation");
                Ok(())
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_cluster_already_exists_fault() {
                    debug!(cluster = %request.identifier, "Cluster already exists");
                    Ok(())
                } else {
                    Err(Error::cloud(
                        "create_cluster",
                        aws_sdk_redshift::error::DisplayErrorContext(&service_err),
                    ))
                }
            }
        }
    }

    async fn describe_cluster(&self, identifier: &str) -> Result<ClusterDescription> {
        let response = self
            .redshift
            .describe_clusters()
            .cluster_identifier(identifier)
            .send()
            .await;

        let output = match response {
            Ok(output) => output,
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_cluster_not_found_fault() {
                    return Ok(ClusterDescription {
                        status: Some(ClusterStatus::NotFound),
                        ..Default::default()
                    });
                }
                return Err(Error::cloud(
                    "describe_cluster",
                    aws_sdk_redshift::error::DisplayErrorContext(&service_err),
                ));
            }
        };

        let cluster = match output.clusters().first() {
            Some(cluster) => cluster.clone(),
            None => {
                return Ok(ClusterDescription {
                    status: Some(ClusterStatus::NotFound),
                    ..Default::default()
                })
            }
        };

        let endpoint = cluster.endpoint().and_then(|ep| {
            let host = ep.address()?.to_string();
            let port = ep.port().and_then(|p| u16::try_from(p).ok())?;
            Some(ClusterEndpoint { host, port })
        });

        Ok(ClusterDescription {
            status: cluster.cluster_status().map(ClusterStatus::parse),
            endpoint,
            role_arn: cluster
                .iam_roles()
                .first()
                .and_then(|r| r.iam_role_arn())
                .map(String::from),
            vpc_id: cluster.vpc_id().map(String::from),
        })
    }

    async fn authorize_ingress(&self, vpc_id: &str, rule: &IngressRule) -> Result<()> {
        let groups = self
            .ec2
            .describe_security_groups()
            .filters(Filter::builder().name("vpc-id").values(vpc_id).build())
            .filters(Filter::builder().name("group-name").values("default").build())
            .send()
            .await
            .map_err(|e| {
                Error::cloud(
                    "describe_security_groups",
                    aws_sdk_ec2::error::DisplayErrorContext(&e),
                )
            })?;

        let group_id = groups
            .security_groups()
            .first()
            .and_then(|g| g.group_id())
            .ok_or_else(|| Error::missing_field("security_group.group_id"))?
            .to_string();

        let permission = IpPermission::builder()
            .ip_protocol("tcp")
            .from_port(i32::from(rule.port))
            .to_port(i32::from(rule.port))
            .ip_ranges(IpRange::builder().cidr_ip(&rule.cidr).build())
            .build();

        let result = self
            .ec2
            .authorize_security_group_ingress()
            .group_id(&group_id)
            .ip_permissions(permission)
            .send()
            .await;

        match result {
            Ok(_) => {
                info!(
                    group = %group_id,
                    cidr = %rule.cidr,
                    port = rule.port,
                    "Opened ingress rule"
                );
                Ok(())
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.code() == Some("InvalidPermission.Duplicate") {
                    debug!(group = %group_id, "Ingress rule already present");
                    Ok(())
                } else {
                    Err(Error::cloud(
                        "authorize_ingress",
                        aws_sdk_ec2::error::DisplayErrorContext(&service_err),
                    ))
                }
            }
        }
    }

    async fn delete_cluster(&self, identifier: &str) -> Result<()> {
        let result = self
            .redshift
            .delete_cluster()
            .cluster_identifier(identifier)
            .skip_final_cluster_snapshot(true)
            .send()
            .await;

        match result {
            Ok(_) => {
                info!(cluster = identifier, "Requested cluster deletion");
                Ok(())
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_cluster_not_found_fault() {
                    debug!(cluster = identifier, "Cluster already gone");
                    Ok(())
                } else {
                    Err(Error::cloud(
                        "delete_cluster",
                        aws_sdk_redshift::error::DisplayErrorContext(&service_err),
                    ))
                }
            }
        }
    }
}
