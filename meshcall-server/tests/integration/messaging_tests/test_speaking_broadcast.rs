use meshcall_core::SignalMessage;
use meshcall_server::RelayOutcome;

use crate::integration::create_test_relay;
use crate::utils::TestMember;

#[test]
fn test_speaking_broadcast_is_stamped() {
    let relay = create_test_relay();
    let mut m1 = TestMember::join(&relay, "r1", "alice").unwrap();
    let mut m2 = TestMember::join(&relay, "r1", "bob").unwrap();
    let mut m3 = TestMember::join(&relay, "r1", "carol").unwrap();
    for m in [&mut m1, &mut m2, &mut m3] {
        m.drain();
    }

    let outcome = m2.send(
        &relay,
        SignalMessage::Speaking {
            user_id: Some(m1.id),
            speaking: true,
        },
    );

    assert_eq!(outcome, RelayOutcome::Broadcast(2));
    let expected = SignalMessage::Speaking {
        user_id: Some(m2.id),
        speaking: true,
    };
    assert_eq!(m1.drain(), vec![expected.clone()]);
    assert_eq!(m3.drain(), vec![expected]);
    assert!(m2.drain().is_empty());
}
