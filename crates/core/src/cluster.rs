//! Shared cluster value types returned by the control plane.

use serde::{Deserialize, Serialize};

/// Lifecycle status reported by the control plane for a cluster.
///
/// Anything outside the states we act on is carried through as `Other` so a
/// new provider-side status doesn't turn into a parse failure mid-wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterStatus {
    Creating,
    Available,
    Deleting,
    Failed,
    NotFound,
    Other(String),
}

impl ClusterStatus {
    /// Parse the provider's status string.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "creating" => Self::Creating,
            "available" => Self::Available,
            "deleting" => Self::Deleting,
            "failed" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    /// A terminal state the wait loop should give up on rather than
    /// re-polling until the attempt budget runs out.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, Self::Deleting | Self::Failed | Self::NotFound)
    }
}

impl std::fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Creating => write!(f, "creating"),
            Self::Available => write!(f, "available"),
            Self::Deleting => write!(f, "deleting"),
            Self::Failed => write!(f, "failed"),
            Self::NotFound => write!(f, "not-found"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Network endpoint of a running cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEndpoint {
    pub host: String,
    pub port: u16,
}

impl std::fmt::Display for ClusterEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One `describe_cluster` snapshot.
#[derive(Debug, Clone, Default)]
pub struct ClusterDescription {
    pub status: Option<ClusterStatus>,
    pub endpoint: Option<ClusterEndpoint>,
    pub role_arn: Option<String>,
    pub vpc_id: Option<String>,
}

/// What downstream stages need from a finished provisioning run: where to
/// connect, and which role authorizes the bulk COPY.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedCluster {
    pub endpoint: ClusterEndpoint,
    pub role_arn: String,
}
