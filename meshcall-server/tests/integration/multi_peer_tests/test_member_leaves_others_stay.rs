use meshcall_core::{RoomId, SignalMessage};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::TestMember;

#[test]
fn test_member_leaves_others_stay() {
    init_tracing();

    let relay = create_test_relay();
    let mut a = TestMember::join(&relay, "r1", "a").unwrap();
    let mut b = TestMember::join(&relay, "r1", "b").unwrap();
    let mut c = TestMember::join(&relay, "r1", "c").unwrap();
    for m in [&mut a, &mut b, &mut c] {
        m.drain();
    }

    b.leave(&relay);

    let left = SignalMessage::PeerLeft { user_id: b.id };
    assert_eq!(a.drain(), vec![left.clone()]);
    assert_eq!(c.drain(), vec![left]);
    assert_eq!(
        relay.registry().list_members(&RoomId::from("r1")),
        vec![a.info(), c.info()]
    );

    // A late joiner sees the survivors in their original join order.
    let mut d = TestMember::join(&relay, "r1", "d").unwrap();
    assert_eq!(d.take_greeting(), vec![a.info(), c.info()]);
}
