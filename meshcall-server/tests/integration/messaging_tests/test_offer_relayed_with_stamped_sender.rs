use meshcall_core::{IceCandidate, MemberId, SessionDescription, SignalMessage};
use meshcall_server::RelayOutcome;

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::TestMember;

#[test]
fn test_offer_relayed_with_stamped_sender() {
    init_tracing();

    let relay = create_test_relay();
    let mut m1 = TestMember::join(&relay, "r1", "alice").unwrap();
    let mut m2 = TestMember::join(&relay, "r1", "bob").unwrap();
    m1.drain();
    m2.drain();

    let spoofed = SignalMessage::Offer {
        to: m1.id,
        from: Some(MemberId(9999)),
        data: SessionDescription::offer("v=0\r\n"),
    };
    assert_eq!(m2.send(&relay, spoofed), RelayOutcome::Forwarded(m1.id));

    assert_eq!(
        m1.drain(),
        vec![SignalMessage::Offer {
            to: m1.id,
            from: Some(m2.id),
            data: SessionDescription::offer("v=0\r\n"),
        }]
    );
    assert!(m2.drain().is_empty(), "sender gets nothing back");
}

#[test]
fn test_candidates_keep_arrival_order() {
    let relay = create_test_relay();
    let mut m1 = TestMember::join(&relay, "r1", "alice").unwrap();
    let m2 = TestMember::join(&relay, "r1", "bob").unwrap();
    m1.drain();

    m2.send(
        &relay,
        SignalMessage::Offer {
            to: m1.id,
            from: None,
            data: SessionDescription::offer("v=0"),
        },
    );
    for i in 0..3 {
        m2.send(
            &relay,
            SignalMessage::IceCandidate {
                to: m1.id,
                from: None,
                data: IceCandidate {
                    candidate: format!("candidate:{i}"),
                    sdp_mid: Some("0".into()),
                    sdp_m_line_index: Some(0),
                    username_fragment: None,
                },
            },
        );
    }

    let kinds: Vec<String> = m1
        .drain()
        .iter()
        .map(|m| match m {
            SignalMessage::IceCandidate { data, .. } => data.candidate.clone(),
            other => other.kind().to_owned(),
        })
        .collect();
    assert_eq!(kinds, ["offer", "candidate:0", "candidate:1", "candidate:2"]);
}

#[test]
fn test_self_addressed_message_dropped() {
    let relay = create_test_relay();
    let mut m1 = TestMember::join(&relay, "r1", "alice").unwrap();
    m1.drain();

    let outcome = m1.send(
        &relay,
        SignalMessage::Answer {
            to: m1.id,
            from: None,
            data: SessionDescription::answer("v=0"),
        },
    );

    assert_eq!(outcome, RelayOutcome::Dropped);
    assert!(m1.drain().is_empty());
}
