//! End-to-end orchestrator behavior: dependency order, idempotence,
//! guarded teardown, confirmation gating.

mod common;

use agentflow_cloud::{CloudError, DeleteOutcome, Deployer, RemoveOutcome, StateStore, StepOutcome};
use agentflow_core::{ComputeUri, ResourceKind};
use common::{FakeDirectory, RecordingGate, deploy_spec, test_settings};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn deployer(
    directory: &Arc<FakeDirectory>,
    root: &TempDir,
    gate: Arc<RecordingGate>,
) -> Deployer {
    Deployer::new(
        directory.clone(),
        &test_settings(),
        StateStore::new(root.path()),
        gate,
    )
}

#[tokio::test]
async fn test_up_creates_all_three_in_dependency_order() {
    let directory = Arc::new(FakeDirectory::new());
    let root = TempDir::new().unwrap();
    let deployer = deployer(&directory, &root, Arc::new(RecordingGate::new(true)));

    let report = deployer.up(&deploy_spec()).await.unwrap();

    assert_eq!(directory.count("computeResources"), 1);
    assert_eq!(directory.count("authorizations"), 1);
    assert_eq!(directory.count("agents"), 1);
    assert!(report.unverified_services.is_empty());

    // Binding creation must come after both prior identities exist
    let compute_create = directory.call_index("POST /computeResources").unwrap();
    let auth_create = directory.call_index("POST /authorizations").unwrap();
    let binding_create = directory.call_index("POST /agents").unwrap();
    assert!(compute_create < auth_create);
    assert!(auth_create < binding_create);

    // The binding links both identities
    let binding = &directory.docs("agents")[0];
    assert_eq!(binding["linkedComputeUri"].as_str().unwrap(), report.compute_uri);
    assert_eq!(
        binding["linkedAuthorizationIds"],
        json!([report.authorization_id])
    );

    // The store holds exactly the three identities
    let record = StateStore::new(root.path()).load().await.unwrap();
    assert_eq!(record.get(ResourceKind::Compute), Some(report.compute_uri.as_str()));
    assert_eq!(
        record.get(ResourceKind::Authorization),
        Some(report.authorization_id.as_str())
    );
    assert_eq!(record.get(ResourceKind::Binding), Some(report.binding_id.as_str()));
}

#[tokio::test]
async fn test_up_twice_is_idempotent() {
    let directory = Arc::new(FakeDirectory::new());
    let root = TempDir::new().unwrap();
    let deployer = deployer(&directory, &root, Arc::new(RecordingGate::new(true)));
    let spec = deploy_spec();

    let first = deployer.up(&spec).await.unwrap();
    let second = deployer.up(&spec).await.unwrap();

    // Exactly one of each resource; the second run updated, not duplicated
    assert_eq!(directory.count("computeResources"), 1);
    assert_eq!(directory.count("authorizations"), 1);
    assert_eq!(directory.count("agents"), 1);
    assert_eq!(first.binding_id, second.binding_id);

    let calls = directory.calls();
    assert_eq!(calls.iter().filter(|c| c.starts_with("POST /agents")).count(), 1);
    assert_eq!(calls.iter().filter(|c| c.starts_with("PATCH /agents")).count(), 1);
    assert_eq!(
        calls.iter().filter(|c| c.starts_with("POST /computeResources")).count(),
        1
    );
}

#[tokio::test]
async fn test_up_resumes_after_lost_store_write() {
    let directory = Arc::new(FakeDirectory::new());
    let root = TempDir::new().unwrap();
    let deployer = deployer(&directory, &root, Arc::new(RecordingGate::new(true)));
    let spec = deploy_spec();

    // Simulate a crash between the remote binding create and the store
    // write: the binding exists remotely but the record does not know it
    directory.seed(
        "agents",
        json!({ "displayName": "agent-1", "description": "stale" }),
    );

    deployer.up(&spec).await.unwrap();

    // Found by list-and-match and patched, not duplicated
    assert_eq!(directory.count("agents"), 1);
    assert_eq!(directory.docs("agents")[0]["description"], "test agent");
}

#[tokio::test]
async fn test_up_aborts_on_first_failure_keeping_prior_steps() {
    let directory = Arc::new(FakeDirectory::new());
    let root = TempDir::new().unwrap();
    let deployer = deployer(&directory, &root, Arc::new(RecordingGate::new(true)));

    directory.reject("POST", "authorizations", 422, "bad client id");

    let err = deployer.up(&deploy_spec()).await.unwrap_err();
    match &err {
        CloudError::Step { step, .. } => assert_eq!(*step, "authorization"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(err.root(), CloudError::RemoteValidation { .. }));

    // Step 1 completed and stays in place; step 3 never ran
    assert_eq!(directory.count("computeResources"), 1);
    assert_eq!(directory.count("agents"), 0);
    let record = StateStore::new(root.path()).load().await.unwrap();
    assert!(record.get(ResourceKind::Compute).is_some());
    assert!(record.get(ResourceKind::Binding).is_none());
}

#[tokio::test]
async fn test_down_deletes_in_reverse_order() {
    let directory = Arc::new(FakeDirectory::new());
    let root = TempDir::new().unwrap();
    let gate = Arc::new(RecordingGate::new(true));
    let deployer = deployer(&directory, &root, gate.clone());

    deployer.up(&deploy_spec()).await.unwrap();
    let report = deployer.down().await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.steps.len(), 3);
    assert!(matches!(report.steps[0], StepOutcome::Removed { kind: ResourceKind::Binding, .. }));

    let binding_delete = directory.call_index("DELETE /agents").unwrap();
    let auth_delete = directory.call_index("DELETE /authorizations").unwrap();
    let compute_delete = directory.call_index("DELETE /computeResources").unwrap();
    assert!(binding_delete < auth_delete);
    assert!(auth_delete < compute_delete);

    // One confirmation per delete, store empty afterwards
    assert_eq!(gate.seen().len(), 3);
    let record = StateStore::new(root.path()).load().await.unwrap();
    assert!(record.is_empty());
}

#[tokio::test]
async fn test_down_skips_referenced_authorization() {
    let directory = Arc::new(FakeDirectory::new());
    let root = TempDir::new().unwrap();
    let deployer = deployer(&directory, &root, Arc::new(RecordingGate::new(true)));

    let report = deployer.up(&deploy_spec()).await.unwrap();

    // A second binding, created out-of-band, still uses the authorization
    directory.seed(
        "agents",
        json!({
            "displayName": "agent-2",
            "linkedAuthorizationIds": [report.authorization_id],
        }),
    );

    let teardown = deployer.down().await.unwrap();
    assert!(!teardown.is_complete());

    let blocked = teardown
        .steps
        .iter()
        .find_map(|s| match s {
            StepOutcome::Blocked { kind: ResourceKind::Authorization, blockers, .. } => {
                Some(blockers.clone())
            }
            _ => None,
        })
        .expect("authorization step should be blocked");
    assert_eq!(blocked, vec!["agent-2"]);

    // No delete attempt was made for the blocked step; compute proceeded
    assert!(directory.call_index("DELETE /authorizations").is_none());
    assert!(directory.call_index("DELETE /computeResources").is_some());
    assert_eq!(directory.count("authorizations"), 1);
}

#[tokio::test]
async fn test_blocked_delete_reports_every_blocker() {
    let directory = Arc::new(FakeDirectory::new());
    let root = TempDir::new().unwrap();
    let deployer = deployer(&directory, &root, Arc::new(RecordingGate::new(true)));

    directory.seed("authorizations", json!({ "id": "auth-1" }));
    directory.seed(
        "agents",
        json!({ "displayName": "agent-1", "linkedAuthorizationIds": ["auth-1"] }),
    );
    directory.seed(
        "agents",
        json!({ "displayName": "agent-2", "linkedAuthorizationIds": ["auth-1"] }),
    );
    StateStore::new(root.path())
        .put(ResourceKind::Authorization, "auth-1")
        .await
        .unwrap();

    let teardown = deployer.down().await.unwrap();
    match &teardown.steps[1] {
        StepOutcome::Blocked { blockers, .. } => {
            assert_eq!(blockers, &vec!["agent-1".to_string(), "agent-2".to_string()]);
        }
        other => panic!("unexpected step outcome: {other:?}"),
    }
    assert!(directory.call_index("DELETE /authorizations").is_none());
}

#[tokio::test]
async fn test_declined_gate_issues_no_delete() {
    let directory = Arc::new(FakeDirectory::new());
    let root = TempDir::new().unwrap();
    let allow = Arc::new(RecordingGate::new(true));
    let deny = Arc::new(RecordingGate::new(false));

    Deployer::new(
        directory.clone(),
        &test_settings(),
        StateStore::new(root.path()),
        allow,
    )
    .up(&deploy_spec())
    .await
    .unwrap();

    let deployer = Deployer::new(
        directory.clone(),
        &test_settings(),
        StateStore::new(root.path()),
        deny,
    );
    let report = deployer.down().await.unwrap();

    assert!(!report.is_complete());
    assert!(
        !directory
            .calls()
            .iter()
            .any(|c| c.starts_with("DELETE")),
        "no DELETE may be issued when the gate declines"
    );
    // Everything still present, record untouched
    assert_eq!(directory.count("agents"), 1);
    let record = StateStore::new(root.path()).load().await.unwrap();
    assert!(!record.is_empty());
}

#[tokio::test]
async fn test_remove_compute_blocked_then_allowed() {
    let directory = Arc::new(FakeDirectory::new());
    let root = TempDir::new().unwrap();
    let deployer = deployer(&directory, &root, Arc::new(RecordingGate::new(true)));

    let report = deployer.up(&deploy_spec()).await.unwrap();
    let uri = ComputeUri::parse(&report.compute_uri).unwrap();

    // Blocked while the binding still references it
    let err = deployer.remove_compute(&uri).await.unwrap_err();
    match err {
        CloudError::ReferenceInUse { blockers, .. } => {
            assert_eq!(blockers, vec!["agent-1"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(directory.call_index("DELETE /computeResources").is_none());

    // After unregistering the binding, the delete goes through
    deployer.unregister("agent-1").await.unwrap();
    let outcome = deployer.remove_compute(&uri).await.unwrap();
    assert_eq!(outcome, RemoveOutcome::Deleted);
    assert_eq!(directory.count("computeResources"), 0);
}

#[tokio::test]
async fn test_unregister_unrelated_name_keeps_record() {
    let directory = Arc::new(FakeDirectory::new());
    let root = TempDir::new().unwrap();
    let deployer = deployer(&directory, &root, Arc::new(RecordingGate::new(true)));

    let report = deployer.up(&deploy_spec()).await.unwrap();

    let outcome = deployer.unregister("no-such-binding").await.unwrap();
    assert_eq!(outcome, DeleteOutcome::AlreadyAbsent);

    // The deployed binding and its record entry are untouched
    assert_eq!(directory.count("agents"), 1);
    let record = StateStore::new(root.path()).load().await.unwrap();
    assert_eq!(
        record.get(ResourceKind::Binding),
        Some(report.binding_id.as_str())
    );
}

#[tokio::test]
async fn test_unregister_recorded_binding_clears_record() {
    let directory = Arc::new(FakeDirectory::new());
    let root = TempDir::new().unwrap();
    let deployer = deployer(&directory, &root, Arc::new(RecordingGate::new(true)));

    deployer.up(&deploy_spec()).await.unwrap();

    let outcome = deployer.unregister("agent-1").await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(directory.count("agents"), 0);

    let record = StateStore::new(root.path()).load().await.unwrap();
    assert!(record.get(ResourceKind::Binding).is_none());
}

#[tokio::test]
async fn test_register_requires_existing_compute() {
    let directory = Arc::new(FakeDirectory::new());
    let root = TempDir::new().unwrap();
    let deployer = deployer(&directory, &root, Arc::new(RecordingGate::new(true)));

    let ghost = ComputeUri::new("demo-project", "us-central1", "ghost");
    let err = deployer
        .register(&ghost, &deploy_spec().binding)
        .await
        .unwrap_err();
    assert!(matches!(err, CloudError::NotFound { kind: ResourceKind::Compute, .. }));
    assert_eq!(directory.count("agents"), 0);
}

#[tokio::test]
async fn test_register_links_existing_compute() {
    let directory = Arc::new(FakeDirectory::new());
    let root = TempDir::new().unwrap();
    let deployer = deployer(&directory, &root, Arc::new(RecordingGate::new(true)));

    directory.seed("computeResources", json!({ "id": "c-9" }));
    let uri = ComputeUri::new("demo-project", "us-central1", "c-9");

    let binding = deployer.register(&uri, &deploy_spec().binding).await.unwrap();
    assert_eq!(binding.display_name.as_deref(), Some("agent-1"));
    assert_eq!(
        directory.docs("agents")[0]["linkedComputeUri"].as_str().unwrap(),
        uri.to_string()
    );

    let record = StateStore::new(root.path()).load().await.unwrap();
    assert_eq!(record.get(ResourceKind::Binding), Some(binding.id.as_str()));
}

#[tokio::test]
async fn test_status_reports_stale_entries() {
    let directory = Arc::new(FakeDirectory::new());
    let root = TempDir::new().unwrap();
    let deployer = deployer(&directory, &root, Arc::new(RecordingGate::new(true)));

    let report = deployer.up(&deploy_spec()).await.unwrap();

    // Remove the binding behind the orchestrator's back
    directory.reject("GET", &format!("agents/{}", report.binding_id), 404, "gone");

    let entries = deployer.status().await.unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().any(|e| e.kind == ResourceKind::Compute && e.present));
    assert!(entries.iter().any(|e| e.kind == ResourceKind::Binding && !e.present));
}
