use huddle_client::{MAX_PIXELATION_LEVEL, TrackKind};

use crate::integration::init_tracing;
use crate::utils::{DirectClient, MockCapture, TransportCall, eventually};

fn last_pipeline(calls: &[TransportCall]) -> Option<Option<&'static str>> {
    calls.iter().rev().find_map(|c| match c {
        TransportCall::ReplaceTrack { pipeline, .. } => Some(*pipeline),
        _ => None,
    })
}

#[tokio::test]
async fn test_pixelation_toggle_reinstalls_pipeline() {
    init_tracing();
    let mut b = DirectClient::spawn("B", MockCapture::default());
    b.join("r1").await;
    b.connect_responder("A").await;
    let transport = b.client.factory.latest("A");

    let snapshot = b.client.handle.toggle_pixelation().await.unwrap();
    assert!(snapshot.pixelation);
    assert!(eventually(|| transport.replacements().len() == 1).await);
    assert_eq!(last_pipeline(&transport.calls()), Some(Some("pixelation")));

    let snapshot = b.client.handle.toggle_pixelation().await.unwrap();
    assert!(!snapshot.pixelation);
    assert!(eventually(|| transport.replacements().len() == 2).await);
    assert_eq!(last_pipeline(&transport.calls()), Some(None));
}

#[tokio::test]
async fn test_toggling_twice_twice_leaves_passthrough() {
    init_tracing();
    let mut b = DirectClient::spawn("B", MockCapture::default());
    b.join("r1").await;
    b.connect_responder("A").await;
    let transport = b.client.factory.latest("A");

    for _ in 0..4 {
        b.client.handle.toggle_pixelation().await.unwrap();
    }

    assert!(eventually(|| transport.replacements().len() == 4).await);
    assert_eq!(last_pipeline(&transport.calls()), Some(None));
    assert_eq!(transport.count(&TransportCall::CreateOffer), 0);
    assert_eq!(transport.count(&TransportCall::CreateAnswer), 1);
}

#[tokio::test]
async fn test_glitch_turns_pixelation_off() {
    init_tracing();
    let mut b = DirectClient::spawn("B", MockCapture::default());
    b.join("r1").await;
    b.connect_responder("A").await;
    let transport = b.client.factory.latest("A");

    b.client.handle.toggle_pixelation().await.unwrap();
    let snapshot = b.client.handle.toggle_glitch().await.unwrap();

    assert!(snapshot.glitch);
    assert!(!snapshot.pixelation);
    assert!(eventually(|| transport.replacements().len() == 2).await);
    assert_eq!(last_pipeline(&transport.calls()), Some(Some("glitch")));
}

#[tokio::test]
async fn test_new_session_gets_active_effect_on_video_only() {
    init_tracing();
    let mut b = DirectClient::spawn("B", MockCapture::default());
    b.join("r1").await;
    b.client.handle.toggle_pixelation().await.unwrap();

    b.connect_responder("A").await;

    let added: Vec<(TrackKind, Option<&'static str>)> = b
        .client
        .factory
        .latest("A")
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            TransportCall::AddTrack { kind, pipeline, .. } => Some((kind, pipeline)),
            _ => None,
        })
        .collect();
    assert_eq!(
        added,
        vec![(TrackKind::Audio, None), (TrackKind::Video, Some("pixelation"))]
    );
}

#[tokio::test]
async fn test_pixelation_level_is_clamped_without_reinstall() {
    init_tracing();
    let mut b = DirectClient::spawn("B", MockCapture::default());
    b.join("r1").await;
    b.connect_responder("A").await;
    b.client.handle.toggle_pixelation().await.unwrap();
    let transport = b.client.factory.latest("A");
    assert!(eventually(|| transport.replacements().len() == 1).await);

    assert_eq!(
        b.client.handle.set_pixelation_level(150).await.unwrap(),
        MAX_PIXELATION_LEVEL
    );
    assert_eq!(b.client.handle.set_pixelation_level(3).await.unwrap(), 3);

    assert_eq!(transport.replacements().len(), 1);
}
