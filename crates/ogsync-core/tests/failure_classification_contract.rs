//! Contract Test: Failure Classification
//!
//! Each way a device interaction can fail surfaces as its own error variant,
//! exactly once.
//!
//! Constraints verified:
//! - Rejected credentials are `Authentication`
//! - An unanswered connect is `ConnectTimeout`
//! - An unanswered read or push is `ReadTimeout`
//! - An unanswered persistence step is `WriteTimeout`, including a
//!   route-group batch that carries its own commit
//! - Nothing is retried: one connect per attempt, one send per command
//!
//! Timers run on a paused clock; hung calls resolve through the engine's own
//! timeouts without real waiting.

mod common;

use common::*;
use ogsync_core::{AutoApprove, Error, ReconcileEvent, Reconciler};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn rejected_credentials_are_authentication() {
    let transport = acl_device(&["10.0.0.1"]).fault(Fault::RejectCredentials);
    let log = transport.log();
    let (reconciler, mut events) = Reconciler::new(Box::new(transport), test_config()).unwrap();

    let err = reconciler
        .reconcile(&acl_router(), &set(&["10.0.0.2"]), &credentials(), &AutoApprove)
        .await
        .unwrap_err();

    assert!(matches!(&err, Error::Authentication { host } if host == "10.255.0.1"));
    assert!(!err.is_retryable());
    assert_eq!(log.connects(), 1);
    assert!(log.sent().is_empty());

    let events = drain_events(&mut events);
    assert!(matches!(events.as_slice(), [ReconcileEvent::Failed { .. }]));
}

#[tokio::test(start_paused = true)]
async fn unanswered_connect_is_connect_timeout() {
    let transport = acl_device(&["10.0.0.1"]).fault(Fault::HangOnConnect);
    let log = transport.log();
    let (reconciler, _events) = Reconciler::new(Box::new(transport), test_config()).unwrap();

    let err = reconciler
        .reconcile(&acl_router(), &set(&["10.0.0.2"]), &credentials(), &AutoApprove)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::ConnectTimeout { timeout, .. } if timeout == Duration::from_secs(5)
    ));
    assert_eq!(log.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn transport_reported_connect_timeout_passes_through() {
    let transport = acl_device(&["10.0.0.1"]).fault(Fault::ReportConnectTimeout);
    let (reconciler, _events) = Reconciler::new(Box::new(transport), test_config()).unwrap();

    let err = reconciler
        .diff_device(&acl_router(), &set(&["10.0.0.2"]), &credentials())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ConnectTimeout { .. }));
}

#[tokio::test(start_paused = true)]
async fn unanswered_read_is_read_timeout() {
    let transport = acl_device(&["10.0.0.1"])
        .fault(Fault::HangOnCommand("show ip access-lists TO-OPEN-GARDEN".to_string()));
    let log = transport.log();
    let (reconciler, _events) = Reconciler::new(Box::new(transport), test_config()).unwrap();

    let err = reconciler
        .reconcile(&acl_router(), &set(&["10.0.0.2"]), &credentials(), &AutoApprove)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::ReadTimeout { timeout, .. } if timeout == Duration::from_secs(10)
    ));
    assert!(err.is_retryable());
    assert!(log.batches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unanswered_push_is_read_timeout_and_stops_the_push() {
    let transport = acl_device(&[]).fault(Fault::HangOnBatch(1));
    let log = transport.log();
    let (reconciler, _events) = Reconciler::new(Box::new(transport), test_config()).unwrap();

    // 2 * 30 + 8 = 68 commands, three batches
    let desired: Vec<String> = (1..=30).map(|i| format!("198.51.100.{i}")).collect();
    let desired = ogsync_core::IpSet::from_literals(&desired).unwrap();

    let err = reconciler
        .reconcile(&acl_router(), &desired, &credentials(), &AutoApprove)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ReadTimeout { .. }));
    assert_eq!(log.batches().len(), 2, "no batch after the stalled one");
    assert!(!log.sent().iter().any(|c| c == "write"));
}

#[tokio::test(start_paused = true)]
async fn unanswered_write_is_write_timeout() {
    let transport = acl_device(&["10.0.0.1"]).fault(Fault::HangOnCommand("write".to_string()));
    let log = transport.log();
    let (reconciler, _events) = Reconciler::new(Box::new(transport), test_config()).unwrap();

    let err = reconciler
        .reconcile(&acl_router(), &set(&["10.0.0.2"]), &credentials(), &AutoApprove)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::WriteTimeout { timeout, .. } if timeout == Duration::from_secs(20)
    ));
    assert!(err.needs_manual_verification());
    assert_eq!(log.sent().iter().filter(|c| *c == "write").count(), 1);
}

#[tokio::test(start_paused = true)]
async fn stalled_route_group_commit_is_write_timeout() {
    let transport = route_group_device(&["10.0.0.1"]).fault(Fault::HangOnBatch(0));
    let (reconciler, _events) = Reconciler::new(Box::new(transport), test_config()).unwrap();

    let err = reconciler
        .reconcile(&route_group_router(), &set(&["10.0.0.2"]), &credentials(), &AutoApprove)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::WriteTimeout { .. }));
}

#[tokio::test(start_paused = true)]
async fn transport_timeout_on_commit_batch_is_write_timeout() {
    let transport = route_group_device(&["10.0.0.1"]).fault(Fault::ReportTimeoutOnBatch(0));
    let (reconciler, _events) = Reconciler::new(Box::new(transport), test_config()).unwrap();

    let err = reconciler
        .reconcile(&route_group_router(), &set(&["10.0.0.2"]), &credentials(), &AutoApprove)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::WriteTimeout { host, .. } if host == "10.255.0.2"));
}

#[tokio::test]
async fn mid_push_transport_failure_is_not_retried() {
    let transport = acl_device(&[]).fault(Fault::FailBatch(0));
    let log = transport.log();
    let (reconciler, _events) = Reconciler::new(Box::new(transport), test_config()).unwrap();

    let err = reconciler
        .reconcile(&acl_router(), &set(&["10.0.0.2"]), &credentials(), &AutoApprove)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(log.connects(), 1);
    assert_eq!(log.batches().len(), 1);
}
