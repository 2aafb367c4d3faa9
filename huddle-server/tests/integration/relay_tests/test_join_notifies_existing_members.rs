use huddle_core::{Envelope, ParticipantId};
use huddle_server::{RelayOutcome, RelayState, SignalingRelay};

use crate::integration::init_tracing;
use crate::utils::RelayPeer;

#[test]
fn test_later_joiner_is_announced_to_earlier_member_only() {
    init_tracing();
    let relay = SignalingRelay::default();
    let mut b = RelayPeer::connect(&relay);
    let mut a = RelayPeer::connect(&relay);

    assert_eq!(b.join("r1", "B"), RelayOutcome::Joined { notified: 0 });
    assert_eq!(a.join("r1", "A"), RelayOutcome::Joined { notified: 1 });

    assert_eq!(
        b.received_envelopes(),
        vec![Envelope::user_joined(ParticipantId::from("A"))]
    );
    assert!(a.received().is_empty(), "joiner must not be told about B");
    assert!(matches!(a.connection.state(), RelayState::Joined { .. }));
}

#[test]
fn test_three_peers_each_announcement_counts() {
    init_tracing();
    let relay = SignalingRelay::default();
    let mut u1 = RelayPeer::connect(&relay);
    let mut u2 = RelayPeer::connect(&relay);
    let mut u3 = RelayPeer::connect(&relay);

    u1.join("r1", "U1");
    u2.join("r1", "U2");
    assert_eq!(u3.join("r1", "U3"), RelayOutcome::Joined { notified: 2 });

    assert_eq!(u1.received_envelopes().len(), 2);
    assert_eq!(u2.received_envelopes().len(), 1);
    assert!(u3.received().is_empty());
}

#[test]
fn test_rooms_are_isolated() {
    init_tracing();
    let relay = SignalingRelay::default();
    let mut a = RelayPeer::connect(&relay);
    let mut b = RelayPeer::connect(&relay);

    a.join("r1", "A");
    assert_eq!(b.join("r2", "B"), RelayOutcome::Joined { notified: 0 });

    assert!(a.received().is_empty());
    assert_eq!(relay.registry().room_count(), 2);
}

#[test]
fn test_second_join_on_same_connection_is_rejected() {
    init_tracing();
    let relay = SignalingRelay::default();
    let mut a = RelayPeer::connect(&relay);

    a.join("r1", "A");
    let outcome = a.join("r2", "A");

    assert!(matches!(outcome, RelayOutcome::Dropped(_)));
    assert_eq!(relay.registry().room_count(), 1);
}
