//! Provisioning flow tests against the mock control plane.

use std::sync::Arc;

use etl_core::ClusterStatus;
use integration_tests::mocks::MockControlPlane;
use provision::{ClusterRequest, ProvisionConfig, Provisioner};

fn fast_config(max_poll_attempts: u32) -> ProvisionConfig {
    ProvisionConfig {
        poll_interval_secs: 0,
        max_poll_attempts,
        ..Default::default()
    }
}

fn request() -> ClusterRequest {
    ClusterRequest {
        identifier: "dwh-cluster".to_string(),
        cluster_type: "multi-node".to_string(),
        node_type: "dc2.large".to_string(),
        number_of_nodes: 4,
        db_name: "dwh".to_string(),
        db_port: 5439,
        master_username: "dwh_admin".to_string(),
        master_user_password: "Passw0rd".to_string(),
        role_arn: None,
    }
}

#[tokio::test]
async fn polls_exactly_three_times_then_surfaces_endpoint_and_role() {
    let mock = Arc::new(MockControlPlane::with_raw_statuses(&[
        "creating",
        "creating",
        "available",
    ]));
    let provisioner = Provisioner::new(mock.clone(), fast_config(10));

    let cluster = provisioner.provision(request()).await.unwrap();

    assert_eq!(mock.describe_calls(), 3);
    assert_eq!(&cluster.endpoint, mock.endpoint());
    assert_eq!(cluster.role_arn, mock.role_arn());
}

#[tokio::test]
async fn exhausted_attempt_budget_is_a_timeout() {
    let mock = Arc::new(MockControlPlane::with_raw_statuses(&["creating"]));
    let provisioner = Provisioner::new(mock.clone(), fast_config(3));

    let err = provisioner.provision(request()).await.unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got: {}", err);
    assert_eq!(mock.describe_calls(), 3);
}

#[tokio::test]
async fn terminal_status_aborts_before_the_budget_runs_out() {
    let mock = Arc::new(MockControlPlane::with_raw_statuses(&["creating", "failed"]));
    let provisioner = Provisioner::new(mock.clone(), fast_config(50));

    let err = provisioner.provision(request()).await.unwrap_err();

    assert!(!err.is_timeout());
    assert_eq!(mock.describe_calls(), 2);
}

#[tokio::test]
async fn cluster_request_carries_the_resolved_role() {
    let mock = Arc::new(MockControlPlane::with_raw_statuses(&["available"]));
    let provisioner = Provisioner::new(mock.clone(), fast_config(5));

    provisioner.provision(request()).await.unwrap();

    let created = mock.created_requests();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].role_arn.as_deref(), Some(mock.role_arn()));
}

#[tokio::test]
async fn ingress_rule_uses_the_database_port() {
    let mock = Arc::new(MockControlPlane::with_raw_statuses(&["available"]));
    let provisioner = Provisioner::new(mock.clone(), fast_config(5));

    provisioner.provision(request()).await.unwrap();

    let rules = mock.ingress_rules();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].1.port, 5439);
    assert_eq!(rules[0].1.cidr, "0.0.0.0/0");
}

#[tokio::test]
async fn ingress_failure_does_not_fail_provisioning() {
    let mock = Arc::new(MockControlPlane::with_raw_statuses(&["available"]));
    mock.set_fail_ingress(true);
    let provisioner = Provisioner::new(mock.clone(), fast_config(5));

    let cluster = provisioner.provision(request()).await;
    assert!(cluster.is_ok(), "ingress is best-effort");
}

#[tokio::test]
async fn teardown_waits_until_the_cluster_is_gone() {
    let statuses = vec![
        ClusterStatus::Deleting,
        ClusterStatus::Deleting,
        ClusterStatus::NotFound,
    ];
    let mock = Arc::new(MockControlPlane::new(statuses));
    let provisioner = Provisioner::new(mock.clone(), fast_config(10));

    provisioner.teardown("dwh-cluster").await.unwrap();

    assert_eq!(mock.deleted_clusters(), vec!["dwh-cluster".to_string()]);
    assert_eq!(mock.describe_calls(), 3);
}
