mod common;

use accord_broadcast::{BroadcastError, DeliveryState};
use accord_definitions::{CoordinatorConfig, DefinitionError, ErrorKind, MockIdentityResolver, MockOutcome};
use accord_storage::DefinitionReader;
use accord_types::{DefinitionType, Interrupt, OperatingMode, RequestContext};
use common::*;

#[tokio::test]
async fn publish_prepares_then_sends_and_marks_published() {
    let h = harness(OperatingMode::Multiparty);
    let seeded = seed(&h.store, ffi("ffi1", "1.0", false)).await;

    let published = h
        .coordinator
        .publish(&RequestContext::background(), "ffi1", "1.0", "ffi1-shared", false)
        .await
        .unwrap();

    assert_eq!(h.broadcast.prepared(), 1);
    assert_eq!(h.broadcast.sent(), 1);
    assert!(published.header.published);
    assert_eq!(published.header.id, seeded.header.id);
    assert_eq!(published.header.network_name.as_deref(), Some("ffi1-shared"));
    assert_eq!(published.header.hash.as_deref(), Some("hash:ffi1-shared"));

    // Content was re-resolved under the network name.
    let seen = h.resolver.seen();
    assert_eq!(seen.last().unwrap().network_name.as_deref(), Some("ffi1-shared"));

    let stored = stored(&h.store, "ffi1", "1.0").await.unwrap();
    assert!(stored.header.published);
    let by_network = h
        .store
        .get_by_network_name(DefinitionType::Interface, NS, "ffi1-shared", "1.0")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_network.header.id, seeded.header.id);

    let envelope = &h.broadcast.envelopes()[0];
    assert_eq!(envelope.payload["network_name"], "ffi1-shared");
    assert_eq!(envelope.payload["name"], "ffi1");
}

#[tokio::test]
async fn empty_network_name_defaults_to_local_name() {
    let h = harness(OperatingMode::Multiparty);
    seed(&h.store, ffi("ffi1", "1.0", false)).await;

    let published = h
        .coordinator
        .publish(&RequestContext::background(), "ffi1", "1.0", "", false)
        .await
        .unwrap();
    assert_eq!(published.header.network_name.as_deref(), Some("ffi1"));
}

#[tokio::test]
async fn publish_of_published_definition_conflicts_and_changes_nothing() {
    let h = harness(OperatingMode::Multiparty);
    seed(&h.store, ffi("ffi1", "1.0", true)).await;
    let before = stored(&h.store, "ffi1", "1.0").await.unwrap();

    let err = h
        .coordinator
        .publish(&RequestContext::background(), "ffi1", "1.0", "ffi1-shared", false)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(matches!(err, DefinitionError::AlreadyPublished { .. }));
    assert_eq!(h.broadcast.built(), 0);
    assert_eq!(stored(&h.store, "ffi1", "1.0").await.unwrap(), before);
}

#[tokio::test]
async fn second_publish_conflicts() {
    let h = harness(OperatingMode::Multiparty);
    let ctx = RequestContext::background();
    seed(&h.store, ffi("ffi1", "1.0", false)).await;

    h.coordinator
        .publish(&ctx, "ffi1", "1.0", "ffi1-shared", false)
        .await
        .unwrap();
    let err = h
        .coordinator
        .publish(&ctx, "ffi1", "1.0", "ffi1-shared", false)
        .await
        .unwrap_err();

    assert!(matches!(err, DefinitionError::AlreadyPublished { .. }));
    assert_eq!(h.broadcast.sent(), 1);
}

#[tokio::test]
async fn missing_definition_is_query_error() {
    let h = harness(OperatingMode::Multiparty);

    let err = h
        .coordinator
        .publish(&RequestContext::background(), "ffi1", "1.0", "ffi1-shared", false)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Query);
    assert_eq!(h.resolver.calls(), 0);
}

#[tokio::test]
async fn gateway_publish_not_allowed() {
    let h = harness(OperatingMode::Gateway);
    seed(&h.store, ffi("ffi1", "1.0", false)).await;

    let err = h
        .coordinator
        .publish(&RequestContext::background(), "ffi1", "1.0", "ffi1-shared", false)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotAllowed);
    assert_eq!(h.resolver.calls(), 0);
    assert!(!stored(&h.store, "ffi1", "1.0").await.unwrap().header.published);
}

#[tokio::test]
async fn network_name_owned_by_other_definition_conflicts() {
    let h = harness(OperatingMode::Multiparty);
    let ctx = RequestContext::background();
    seed(&h.store, ffi("ffi1", "1.0", false)).await;
    seed(&h.store, ffi("ffi2", "1.0", false)).await;
    h.coordinator
        .publish(&ctx, "ffi2", "1.0", "shared", false)
        .await
        .unwrap();

    let err = h
        .coordinator
        .publish(&ctx, "ffi1", "1.0", "shared", false)
        .await
        .unwrap_err();

    assert!(matches!(err, DefinitionError::AlreadyDefined { .. }));
    assert!(!stored(&h.store, "ffi1", "1.0").await.unwrap().header.published);
    assert_eq!(h.broadcast.sent(), 1);
}

#[tokio::test]
async fn prepare_failure_aborts_before_send() {
    let h = harness(OperatingMode::Multiparty);
    seed(&h.store, ffi("ffi1", "1.0", false)).await;
    h.broadcast.fail_prepare_with("pop");

    let err = h
        .coordinator
        .publish(&RequestContext::background(), "ffi1", "1.0", "ffi1-shared", false)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TransportFailed);
    assert_eq!(err.to_string(), "failed to stage payload blob: pop");
    assert_eq!(h.broadcast.prepared(), 1);
    assert_eq!(h.broadcast.sent(), 0);
    assert!(!stored(&h.store, "ffi1", "1.0").await.unwrap().header.published);
    assert!(h
        .store
        .get_by_network_name(DefinitionType::Interface, NS, "ffi1-shared", "1.0")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn send_failure_leaves_definition_unpublished() {
    let h = harness(OperatingMode::Multiparty);
    seed(&h.store, ffi("ffi1", "1.0", false)).await;
    h.broadcast.fail_send_with("pop");

    let err = h
        .coordinator
        .publish(&RequestContext::background(), "ffi1", "1.0", "ffi1-shared", false)
        .await
        .unwrap_err();

    assert!(matches!(err, DefinitionError::Broadcast(BroadcastError::Transport(_))));
    assert!(!stored(&h.store, "ffi1", "1.0").await.unwrap().header.published);
}

#[tokio::test]
async fn resolve_failure_propagates_verbatim() {
    let h = harness(OperatingMode::Multiparty);
    seed(&h.store, ffi("ffi1", "1.0", false)).await;
    h.resolver.fail_with("pop");

    let err = h
        .coordinator
        .publish(&RequestContext::background(), "ffi1", "1.0", "ffi1-shared", false)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "missing required field: pop");
    assert_eq!(h.broadcast.built(), 0);
}

#[tokio::test]
async fn missing_root_org_rolls_back() {
    let h = harness_with(
        CoordinatorConfig::new(NS, OperatingMode::Multiparty),
        MockIdentityResolver::without_root(),
    );
    seed(&h.store, ffi("ffi1", "1.0", false)).await;

    let err = h
        .coordinator
        .publish(&RequestContext::background(), "ffi1", "1.0", "ffi1-shared", false)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PreconditionMissing);
    assert!(!stored(&h.store, "ffi1", "1.0").await.unwrap().header.published);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_publishes_send_once() {
    let h = harness(OperatingMode::Multiparty);
    seed(&h.store, ffi("ffi1", "1.0", false)).await;

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let coordinator = h.coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .publish(&RequestContext::background(), "ffi1", "1.0", "ffi1-shared", false)
                    .await
            })
        })
        .collect();

    let results: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| e.kind() == ErrorKind::Conflict));
    assert_eq!(h.broadcast.sent(), 1);
}

#[tokio::test]
async fn cancelled_wait_after_publish_keeps_it_published() {
    let h = harness(OperatingMode::Multiparty);
    seed(&h.store, ffi("ffi1", "1.0", false)).await;
    h.broadcast.set_outcome(MockOutcome::Pending);
    let (ctx, cancel) = RequestContext::cancellable();

    let (result, _) = tokio::join!(
        h.coordinator.publish(&ctx, "ffi1", "1.0", "ffi1-shared", true),
        async {
            while h.broadcast.sent() == 0 {
                tokio::task::yield_now().await;
            }
            cancel.cancel();
        }
    );

    assert!(matches!(
        result,
        Err(DefinitionError::Broadcast(BroadcastError::Interrupted(
            Interrupt::Cancelled
        )))
    ));
    assert!(stored(&h.store, "ffi1", "1.0").await.unwrap().header.published);

    let retry = h
        .coordinator
        .publish(&RequestContext::background(), "ffi1", "1.0", "ffi1-shared", false)
        .await
        .unwrap_err();
    assert_eq!(retry.kind(), ErrorKind::Conflict);

    h.broadcast.settle_all(DeliveryState::Confirmed);
}

#[tokio::test]
async fn publish_with_confirmation() {
    let h = harness(OperatingMode::Multiparty);
    seed(&h.store, ffi("ffi1", "1.0", false)).await;

    let published = h
        .coordinator
        .publish(&RequestContext::background(), "ffi1", "1.0", "ffi1-shared", true)
        .await
        .unwrap();
    assert!(published.header.published);
}
