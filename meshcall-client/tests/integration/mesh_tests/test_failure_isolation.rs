use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{Call, MeshMember, eventually};
use meshcall_client::{LinkState, PeerState};

#[tokio::test]
async fn test_failed_answer_only_drops_that_pair() {
    init_tracing();
    let relay = create_test_relay();

    let mut a = MeshMember::join(&relay, "r1", "a").await;
    let mut b = MeshMember::join(&relay, "r1", "b").await;
    a.wait_connected_to(b.id).await;

    a.factory.fail_answers();
    let mut c = MeshMember::join(&relay, "r1", "c").await;
    let c_id = c.id;

    c.wait_connected_to(b.id).await;
    b.wait_connected_to(c_id).await;
    let a_view = a
        .wait_for(|s| s.peer_state(c_id) == Some(PeerState::Closed))
        .await;

    assert_eq!(a_view.peer_state(b.id), Some(PeerState::Connected));
    assert!(a_view.slot_of(c_id).is_none());
    // c never got an answer from a
    assert_eq!(c.state.borrow().peer_state(a.id), Some(PeerState::Offering));
}

#[tokio::test]
async fn test_transport_failure_tears_down_once() {
    init_tracing();
    let relay = create_test_relay();

    let mut a = MeshMember::join(&relay, "r1", "a").await;
    let mut b = MeshMember::join(&relay, "r1", "b").await;
    b.wait_connected_to(a.id).await;
    a.wait_connected_to(b.id).await;
    let a_id = a.id;

    b.factory.report_state(a_id, LinkState::Failed).await;
    b.factory.report_state(a_id, LinkState::Disconnected).await;

    let b_view = b
        .wait_for(|s| s.peer_state(a_id) == Some(PeerState::Closed))
        .await;
    assert!(b_view.slot_of(a_id).is_none());

    // the close triggers one more Closed report, which must be ignored too
    let factory = b.factory.clone();
    eventually("b to close its connection to a", || {
        let factory = factory.clone();
        async move { factory.count(&Call::Close(a_id)).await >= 1 }
    })
    .await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(b.factory.count(&Call::Close(a_id)).await, 1);
    assert_eq!(b.factory.count(&Call::ReleaseTracks(a_id)).await, 1);

    // a is unaffected until the platform tells it otherwise
    assert_eq!(a.state.borrow().peer_state(b.id), Some(PeerState::Connected));
}
