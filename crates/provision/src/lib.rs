//! Cluster provisioning for the warehouse ETL.

pub mod aws;
pub mod config;
pub mod control_plane;
pub mod provisioner;

pub use aws::AwsControlPlane;
pub use config::{ProvisionConfig, WaitConfig};
pub use control_plane::{ClusterRequest, ControlPlane, IngressRule};
pub use provisioner::Provisioner;
