//! End-to-end scenarios for the requires side, driven over the in-memory
//! relation with the simulated provider on the far end.

use std::sync::Arc;

use skybridge::{Capability, FeatureRequest, RelationEvent, RequirerError};
use skybridge_core::{EndpointName, RelationRole};
use skybridge_relation::RelationModel;
use skybridge_state::MemoryStateStore;
use skybridge_testkit::{init_tracing, unit, TestHarness};

#[tokio::test]
async fn identical_requests_publish_exactly_once() {
    init_tracing();
    let harness = TestHarness::new().await;
    let mut requirer = harness.requirer("worker/0").await;

    let ask = FeatureRequest::new()
        .credentials(true)
        .capabilities([Capability::NetworkManagement]);

    requirer.request(ask.clone()).await.unwrap();
    requirer.request(ask.clone()).await.unwrap();
    requirer.request(ask).await.unwrap();

    assert_eq!(harness.model.publish_count(&unit("worker/0")).await, 1);
}

#[tokio::test]
async fn request_fulfillment_and_widening_revokes_ready() {
    init_tracing();
    let mut harness = TestHarness::new().await;
    let mut requirer = harness.requirer("worker/0").await;

    requirer
        .request(
            FeatureRequest::new()
                .credentials(true)
                .capabilities([Capability::NetworkManagement]),
        )
        .await
        .unwrap();

    // Joined but nothing provisioned yet: pending, not an error.
    requirer.on_relation_event(RelationEvent::Joined).await.unwrap();
    assert!(requirer.is_joined());
    assert!(!requirer.is_ready());
    assert!(matches!(
        requirer.credentials(),
        Err(RequirerError::NotReady(_))
    ));

    harness.provider.reconcile().await.unwrap();
    requirer.on_relation_event(RelationEvent::Changed).await.unwrap();

    assert!(requirer.is_ready());
    let credentials = requirer.credentials().unwrap();
    assert_eq!(credentials["auth-url"], "https://cloud.test:5000/v3");
    assert!(requirer.identifier("security-group").unwrap().is_some());

    // Widen the ask: readiness must drop before the provider answers.
    requirer.enable_block_storage_management().await.unwrap();
    assert!(requirer.is_joined());
    assert!(!requirer.is_ready());
    assert!(requirer.credentials().is_err());

    // And come back once the provider catches up with the new content.
    harness.provider.reconcile().await.unwrap();
    requirer.on_relation_event(RelationEvent::Changed).await.unwrap();
    assert!(requirer.is_ready());
}

#[tokio::test]
async fn ready_always_implies_joined() {
    let mut harness = TestHarness::new().await;
    let mut requirer = harness.requirer("worker/0").await;

    requirer.request_credentials().await.unwrap();
    harness.provider.reconcile().await.unwrap();
    requirer.on_relation_event(RelationEvent::Changed).await.unwrap();
    assert!(requirer.is_ready() && requirer.is_joined());

    harness.model.break_relation().await;
    requirer.on_relation_event(RelationEvent::Broken).await.unwrap();
    assert!(!requirer.is_ready());
    assert!(!requirer.is_joined());
}

#[tokio::test]
async fn broken_while_ready_clears_flags_without_panics() {
    let mut harness = TestHarness::new().await;
    let mut requirer = harness.requirer("worker/0").await;

    requirer.request_credentials().await.unwrap();
    harness.provider.reconcile().await.unwrap();
    requirer.on_relation_event(RelationEvent::Changed).await.unwrap();
    assert!(requirer.is_ready());

    harness.model.break_relation().await;
    requirer.on_relation_event(RelationEvent::Broken).await.unwrap();

    assert!(!requirer.is_ready());
    assert!(!requirer.is_joined());
    // Accessors fail soft, they never panic or return stale data.
    assert!(matches!(
        requirer.credentials(),
        Err(RequirerError::NotReady(_))
    ));
    assert!(matches!(
        requirer.identifiers(),
        Err(RequirerError::NotReady(_))
    ));

    // Publishing into a broken relation surfaces the transport fault.
    assert!(matches!(
        requirer.enable_dns_management().await,
        Err(RequirerError::Relation(_))
    ));
}

#[tokio::test]
async fn unknown_capability_is_rejected_without_a_write() {
    init_tracing();
    let harness = TestHarness::new().await;
    let mut requirer = harness.requirer("worker/0").await;

    requirer
        .request_named(&["network-management"])
        .await
        .unwrap();
    let slot_before = harness.model.slot(&unit("worker/0")).await.unwrap();

    let err = requirer
        .request_named(&["network-management", "quantum-teleport"])
        .await
        .unwrap_err();
    assert!(matches!(err, RequirerError::Configuration(_)));

    // No publish happened and the previous request is untouched.
    assert_eq!(harness.model.publish_count(&unit("worker/0")).await, 1);
    assert_eq!(
        harness.model.slot(&unit("worker/0")).await.unwrap(),
        slot_before
    );
}

#[tokio::test]
async fn narrowing_one_unit_never_shrinks_the_aggregate() {
    let mut harness = TestHarness::new().await;
    let mut a = harness.requirer("worker/0").await;
    let mut b = harness.requirer("worker/1").await;

    a.request(
        FeatureRequest::new()
            .capabilities([Capability::NetworkManagement, Capability::SecurityManagement]),
    )
    .await
    .unwrap();
    b.request(FeatureRequest::new().capabilities([Capability::DnsManagement]))
        .await
        .unwrap();
    harness.provider.reconcile().await.unwrap();

    // Unit A narrows its own ask; the union must keep every grant.
    a.request(FeatureRequest::new().capabilities([Capability::NetworkManagement]))
        .await
        .unwrap();
    harness.provider.reconcile().await.unwrap();

    for cap in [
        Capability::NetworkManagement,
        Capability::SecurityManagement,
        Capability::DnsManagement,
    ] {
        assert!(harness.provider.policy().contains(&cap));
    }
}

#[tokio::test]
async fn provider_error_marker_blocks_readiness() {
    let mut harness = TestHarness::new().await;
    let mut requirer = harness.requirer("worker/0").await;

    requirer.request_credentials().await.unwrap();
    harness
        .provider
        .inject_error(unit("worker/0"), "quota exceeded");
    harness.provider.reconcile().await.unwrap();
    requirer.on_relation_event(RelationEvent::Changed).await.unwrap();

    assert!(requirer.is_joined());
    assert!(!requirer.is_ready());
}

#[tokio::test]
async fn provider_reprovisioning_revokes_ready() {
    let mut harness = TestHarness::new().await;
    let mut requirer = harness.requirer("worker/0").await;

    requirer.request_credentials().await.unwrap();
    harness.provider.reconcile().await.unwrap();
    requirer.on_relation_event(RelationEvent::Changed).await.unwrap();
    assert!(requirer.is_ready());

    // The provider withdraws its completion marker mid-reprovision.
    harness.provider.begin_reprovisioning();
    harness.provider.reconcile().await.unwrap();
    requirer.on_relation_event(RelationEvent::Changed).await.unwrap();
    assert!(requirer.is_joined());
    assert!(!requirer.is_ready());

    harness.provider.complete_reprovisioning();
    harness.provider.reconcile().await.unwrap();
    requirer.on_relation_event(RelationEvent::Changed).await.unwrap();
    assert!(requirer.is_ready());
}

#[tokio::test]
async fn state_survives_process_restart() {
    let mut harness = TestHarness::new().await;
    let store = Arc::new(MemoryStateStore::new());

    {
        let mut requirer = harness.requirer_with_state("worker/0", store.clone()).await;
        requirer.request_credentials().await.unwrap();
        harness.provider.reconcile().await.unwrap();
        requirer.on_relation_event(RelationEvent::Changed).await.unwrap();
        assert!(requirer.is_ready());
    }

    // A fresh wake-up restores flags and the published request.
    let mut requirer = harness.requirer_with_state("worker/0", store).await;
    assert!(requirer.is_ready());
    assert!(requirer.credentials().is_ok());

    // Re-declaring the same ask publishes nothing new.
    requirer.request_credentials().await.unwrap();
    assert_eq!(harness.model.publish_count(&unit("worker/0")).await, 1);
}

#[tokio::test]
async fn sqlite_state_survives_reopen() {
    let mut harness = TestHarness::new().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("endpoint-state.db");

    {
        let relation = harness
            .model
            .attach(unit("worker/0"), RelationRole::Requirer)
            .await;
        let store = skybridge_state::SqliteStateStore::open(&path).unwrap();
        let mut requirer = skybridge::IntegrationRequirer::new(relation, store)
            .await
            .unwrap();
        requirer.request_credentials().await.unwrap();
        harness.provider.reconcile().await.unwrap();
        requirer.on_relation_event(RelationEvent::Changed).await.unwrap();
        assert!(requirer.is_ready());
    }

    let relation = harness
        .model
        .attach(unit("worker/0"), RelationRole::Requirer)
        .await;
    let store = skybridge_state::SqliteStateStore::open(&path).unwrap();
    let requirer = skybridge::IntegrationRequirer::new(relation, store)
        .await
        .unwrap();
    assert!(requirer.is_ready());
    assert!(requirer.credentials().is_ok());
}

#[tokio::test]
async fn unjoined_relation_reports_neither_flag() {
    let endpoint = EndpointName::new("cloud").unwrap();
    let model = RelationModel::new(endpoint);
    let relation = model.attach(unit("worker/0"), RelationRole::Requirer).await;
    let mut requirer = skybridge::IntegrationRequirer::new(relation, MemoryStateStore::new())
        .await
        .unwrap();

    requirer.request_credentials().await.unwrap();
    requirer.on_relation_event(RelationEvent::Changed).await.unwrap();

    assert!(!requirer.is_joined());
    assert!(!requirer.is_ready());
}
