use huddle_core::{Envelope, ParticipantId, RoomId};
use huddle_server::SignalingRelay;

use crate::integration::init_tracing;
use crate::utils::RelayPeer;

#[test]
fn test_close_notifies_remaining_members() {
    init_tracing();
    let relay = SignalingRelay::default();
    let mut u1 = RelayPeer::connect(&relay);
    let mut u2 = RelayPeer::connect(&relay);
    u1.join("r1", "U1");
    u2.join("r1", "U2");
    u1.received();

    assert_eq!(u1.connection.close(), Some(1));

    assert_eq!(
        u2.received_envelopes(),
        vec![Envelope::user_left(ParticipantId::from("U1"))]
    );
    assert_eq!(
        relay.registry().participants(&RoomId::from("r1")),
        vec![ParticipantId::from("U2")]
    );
}

#[test]
fn test_close_twice_sends_one_user_left() {
    init_tracing();
    let relay = SignalingRelay::default();
    let mut u1 = RelayPeer::connect(&relay);
    let mut u2 = RelayPeer::connect(&relay);
    u1.join("r1", "U1");
    u2.join("r1", "U2");

    u1.connection.close();
    assert_eq!(u1.connection.close(), None);

    assert_eq!(u2.received_envelopes().len(), 1);
}

#[test]
fn test_dropping_connection_deregisters() {
    init_tracing();
    let relay = SignalingRelay::default();
    let mut u2 = RelayPeer::connect(&relay);
    u2.join("r1", "U2");
    {
        let mut u1 = RelayPeer::connect(&relay);
        u1.join("r1", "U1");
    }

    assert_eq!(
        u2.received_envelopes(),
        vec![
            Envelope::user_joined(ParticipantId::from("U1")),
            Envelope::user_left(ParticipantId::from("U1")),
        ]
    );
}

#[test]
fn test_unjoined_close_is_noop() {
    init_tracing();
    let relay = SignalingRelay::default();
    let mut lurker = RelayPeer::connect(&relay);

    assert_eq!(lurker.connection.close(), None);
    assert_eq!(relay.registry().room_count(), 0);
}

#[test]
fn test_last_leave_reclaims_room() {
    init_tracing();
    let relay = SignalingRelay::default();
    let mut u1 = RelayPeer::connect(&relay);
    u1.join("r1", "U1");

    u1.connection.close();

    assert_eq!(relay.registry().room_count(), 0);
}

#[test]
fn test_stale_duplicate_close_keeps_reconnected_participant() {
    init_tracing();
    let relay = SignalingRelay::default();
    let mut observer = RelayPeer::connect(&relay);
    let mut first = RelayPeer::connect(&relay);
    let mut second = RelayPeer::connect(&relay);
    observer.join("r1", "O");
    first.join("r1", "U1");
    second.join("r1", "U1");
    observer.received();

    assert_eq!(first.connection.close(), None);

    assert!(observer.received().is_empty());
    assert!(
        relay
            .registry()
            .contains(&RoomId::from("r1"), &ParticipantId::from("U1"))
    );
}
