use huddle_client::{ClientEvent, Role};
use huddle_core::{ParticipantId, RoomId, SdpType};
use huddle_server::SignalingRelay;

use crate::integration::init_tracing;
use crate::utils::{TransportCall, eventually, spawn_relayed};

#[tokio::test]
async fn test_existing_member_initiates_and_both_connect() {
    init_tracing();
    let relay = SignalingRelay::default();
    let room = RoomId::from("r1");
    let mut u1 = spawn_relayed(&relay, "U1");
    let mut u2 = spawn_relayed(&relay, "U2");

    u1.handle.join(room.clone()).await.unwrap();
    assert!(eventually(|| relay.registry().contains(&room, &"U1".into())).await);
    u2.handle.join(room.clone()).await.unwrap();

    u1.expect_connected("U2").await;
    u2.expect_connected("U1").await;

    let u1_peers = u1.handle.peers().await.unwrap();
    let u2_peers = u2.handle.peers().await.unwrap();
    assert_eq!(u1_peers.len(), 1);
    assert_eq!(u1_peers[0].role, Role::Initiator);
    assert_eq!(u2_peers.len(), 1);
    assert_eq!(u2_peers[0].role, Role::Responder);

    let towards_u2 = u1.factory.latest("U2");
    let towards_u1 = u2.factory.latest("U1");
    assert_eq!(towards_u2.count(&TransportCall::CreateOffer), 1);
    assert_eq!(towards_u2.count(&TransportCall::SetRemote(SdpType::Answer)), 1);
    assert_eq!(towards_u1.count(&TransportCall::SetRemote(SdpType::Offer)), 1);
    assert_eq!(towards_u1.count(&TransportCall::CreateAnswer), 1);
    assert_eq!(towards_u1.count(&TransportCall::CreateOffer), 0);
}

#[tokio::test]
async fn test_candidates_reach_the_other_side() {
    init_tracing();
    let relay = SignalingRelay::default();
    let room = RoomId::from("r1");
    let mut u1 = spawn_relayed(&relay, "U1");
    let u2 = spawn_relayed(&relay, "U2");
    u1.handle.join(room.clone()).await.unwrap();
    assert!(eventually(|| relay.registry().contains(&room, &"U1".into())).await);
    u2.handle.join(room).await.unwrap();
    u1.expect_connected("U2").await;

    let towards_u2 = u1.factory.latest("U2");
    let towards_u1 = u2.factory.latest("U1");
    let has_candidate =
        |calls: Vec<TransportCall>| calls.iter().any(|c| matches!(c, TransportCall::AddCandidate(_)));

    assert!(eventually(|| has_candidate(towards_u1.calls())).await);
    assert!(eventually(|| has_candidate(towards_u2.calls())).await);
}

#[tokio::test]
async fn test_three_members_form_a_mesh() {
    init_tracing();
    let relay = SignalingRelay::default();
    let room = RoomId::from("r1");
    let mut u1 = spawn_relayed(&relay, "U1");
    let u2 = spawn_relayed(&relay, "U2");
    let mut u3 = spawn_relayed(&relay, "U3");

    u1.handle.join(room.clone()).await.unwrap();
    assert!(eventually(|| relay.registry().contains(&room, &"U1".into())).await);
    u2.handle.join(room.clone()).await.unwrap();
    assert!(eventually(|| relay.registry().contains(&room, &"U2".into())).await);
    u3.handle.join(room.clone()).await.unwrap();

    u3.expect_connected("U1").await;
    u3.expect_connected("U2").await;

    let u3_peers = u3.handle.peers().await.unwrap();
    let ids: Vec<ParticipantId> = u3_peers.iter().map(|p| p.peer_id.clone()).collect();
    assert_eq!(ids, vec![ParticipantId::from("U1"), ParticipantId::from("U2")]);
    assert!(u3_peers.iter().all(|p| p.role == Role::Responder));

    let u2_peers = u2.handle.peers().await.unwrap();
    let u2_roles: Vec<(ParticipantId, Role)> = u2_peers
        .into_iter()
        .map(|p| (p.peer_id, p.role))
        .collect();
    assert_eq!(
        u2_roles,
        vec![
            (ParticipantId::from("U1"), Role::Responder),
            (ParticipantId::from("U3"), Role::Initiator),
        ]
    );

    u1.expect_event(|e| {
        matches!(e, ClientEvent::RemoteMediaAttached { peer_id, .. } if peer_id.as_str() == "U3")
    })
    .await;
}
