use meshcall_core::{SessionDescription, SignalMessage};
use meshcall_server::RelayOutcome;

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::TestMember;

#[test]
fn test_message_to_departed_member_dropped() {
    init_tracing();

    let relay = create_test_relay();
    let mut m1 = TestMember::join(&relay, "r1", "alice").unwrap();
    let mut m2 = TestMember::join(&relay, "r1", "bob").unwrap();
    m2.drain();

    m1.leave(&relay);

    let outcome = m2.send(
        &relay,
        SignalMessage::Answer {
            to: m1.id,
            from: None,
            data: SessionDescription::answer("v=0"),
        },
    );

    assert_eq!(outcome, RelayOutcome::Dropped);
    assert_eq!(m2.drain(), vec![SignalMessage::PeerLeft { user_id: m1.id }]);
}

#[test]
fn test_messages_from_closed_session_ignored() {
    let relay = create_test_relay();
    let mut m1 = TestMember::join(&relay, "r1", "alice").unwrap();
    let mut m2 = TestMember::join(&relay, "r1", "bob").unwrap();
    m1.drain();
    m2.leave(&relay);
    m1.drain();

    let outcome = m2.send(
        &relay,
        SignalMessage::Offer {
            to: m1.id,
            from: None,
            data: SessionDescription::offer("v=0"),
        },
    );

    assert_eq!(outcome, RelayOutcome::Dropped);
    assert!(m1.drain().is_empty());
}

#[test]
fn test_cross_room_message_dropped() {
    let relay = create_test_relay();
    let mut m1 = TestMember::join(&relay, "r1", "alice").unwrap();
    let m2 = TestMember::join(&relay, "r2", "bob").unwrap();
    m1.drain();

    let outcome = m2.send(
        &relay,
        SignalMessage::Offer {
            to: m1.id,
            from: None,
            data: SessionDescription::offer("v=0"),
        },
    );

    assert_eq!(outcome, RelayOutcome::Dropped);
    assert!(m1.drain().is_empty());
}
