use meshcall_core::SignalMessage;

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::TestMember;

#[test]
fn test_three_members_join() {
    init_tracing();

    let relay = create_test_relay();

    let mut a = TestMember::join(&relay, "r1", "a").unwrap();
    let a_peers = a.take_greeting();

    let mut b = TestMember::join(&relay, "r1", "b").unwrap();
    let b_peers = b.take_greeting();

    let mut c = TestMember::join(&relay, "r1", "c").unwrap();
    let c_peers = c.take_greeting();

    // Only the newcomer gets a peer list, and it never lists itself.
    assert!(a_peers.is_empty());
    assert_eq!(b_peers, vec![a.info()]);
    assert_eq!(c_peers, vec![a.info(), b.info()]);

    assert_eq!(
        a.drain(),
        vec![
            SignalMessage::PeerJoined {
                user_id: b.id,
                name: "b".into()
            },
            SignalMessage::PeerJoined {
                user_id: c.id,
                name: "c".into()
            },
        ]
    );
    assert_eq!(
        b.drain(),
        vec![SignalMessage::PeerJoined {
            user_id: c.id,
            name: "c".into()
        }]
    );
    assert!(c.drain().is_empty());
}

#[test]
fn test_member_ids_are_unique() {
    let relay = create_test_relay();
    let members: Vec<TestMember> = ["a", "b", "c", "d"]
        .iter()
        .map(|n| TestMember::join(&relay, "r1", n).unwrap())
        .collect();

    let mut ids: Vec<_> = members.iter().map(|m| m.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), members.len());
}
