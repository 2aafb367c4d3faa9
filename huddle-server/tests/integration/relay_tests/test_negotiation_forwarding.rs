use huddle_core::{Envelope, IceCandidate, ParticipantId, SessionDescription};
use huddle_server::{DropReason, RelayOutcome, SignalingRelay};

use crate::integration::init_tracing;
use crate::utils::RelayPeer;

#[test]
fn test_offer_is_forwarded_verbatim_to_target() {
    init_tracing();
    let relay = SignalingRelay::default();
    let mut u1 = RelayPeer::connect(&relay);
    let mut u2 = RelayPeer::connect(&relay);
    u1.join("r1", "U1");
    u2.join("r1", "U2");
    u1.received();

    // Field order and spacing chosen to differ from what serde would emit.
    let raw = r#"{"payload": {"from":"U1","offer":{"sdp":"v=0\r\n","type":"offer"},"targetId":"U2"}, "type":"offer"}"#;
    let outcome = u1.send_text(raw);

    assert_eq!(
        outcome,
        RelayOutcome::Forwarded {
            target: ParticipantId::from("U2")
        }
    );
    assert_eq!(u2.received(), vec![raw.to_owned()]);
    assert!(u1.received().is_empty());
}

#[test]
fn test_answer_and_candidates_reach_exactly_one_recipient() {
    init_tracing();
    let relay = SignalingRelay::default();
    let mut u1 = RelayPeer::connect(&relay);
    let mut u2 = RelayPeer::connect(&relay);
    let mut u3 = RelayPeer::connect(&relay);
    u1.join("r1", "U1");
    u2.join("r1", "U2");
    u3.join("r1", "U3");
    u1.received();
    u2.received();

    let answer = Envelope::answer("U1".into(), "U2".into(), SessionDescription::answer("v=0"));
    let candidate = Envelope::candidate(
        "U1".into(),
        "U2".into(),
        IceCandidate::new("candidate:1 1 udp 2122260223 192.168.1.2 50000 typ host"),
    );
    u2.send(&answer);
    u2.send(&candidate);

    assert_eq!(u1.received_envelopes(), vec![answer, candidate]);
    assert!(u3.received().is_empty());
}

#[test]
fn test_unknown_target_is_dropped_without_feedback() {
    init_tracing();
    let relay = SignalingRelay::default();
    let mut u1 = RelayPeer::connect(&relay);
    u1.join("r1", "U1");

    let offer = Envelope::offer("ghost".into(), "U1".into(), SessionDescription::offer("v=0"));
    let outcome = u1.send(&offer);

    assert_eq!(outcome, RelayOutcome::Dropped(DropReason::UnknownTarget));
    assert!(u1.received().is_empty());
}

#[test]
fn test_target_in_other_room_is_not_reachable() {
    init_tracing();
    let relay = SignalingRelay::default();
    let mut u1 = RelayPeer::connect(&relay);
    let mut u2 = RelayPeer::connect(&relay);
    u1.join("r1", "U1");
    u2.join("r2", "U2");

    let offer = Envelope::offer("U2".into(), "U1".into(), SessionDescription::offer("v=0"));

    assert_eq!(
        u1.send(&offer),
        RelayOutcome::Dropped(DropReason::UnknownTarget)
    );
    assert!(u2.received().is_empty());
}

#[test]
fn test_rapid_candidates_keep_order() {
    init_tracing();
    let relay = SignalingRelay::default();
    let mut u1 = RelayPeer::connect(&relay);
    let mut u2 = RelayPeer::connect(&relay);
    u1.join("r1", "U1");
    u2.join("r1", "U2");
    u1.received();

    let sent: Vec<Envelope> = (0..50)
        .map(|i| {
            Envelope::candidate(
                "U2".into(),
                "U1".into(),
                IceCandidate::new(format!("candidate:{i} 1 udp 1 10.0.0.1 {} typ host", 5000 + i)),
            )
        })
        .collect();
    for env in &sent {
        u1.send(env);
    }

    assert_eq!(u2.received_envelopes(), sent);
}
