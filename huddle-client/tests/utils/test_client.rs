use crate::utils::{MockCapture, MockTransportFactory};
use huddle_client::{ClientConfig, ClientEvent, ClientHandle, HuddleClient};
use huddle_core::{Envelope, ParticipantId, RoomId, SessionDescription};
use huddle_server::{ParticipantSink, SignalingRelay};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep, timeout};

pub const EVENT_TIMEOUT_MS: u64 = 2000;

pub struct TestClient {
    pub id: ParticipantId,
    pub handle: ClientHandle,
    pub events: mpsc::UnboundedReceiver<ClientEvent>,
    pub factory: Arc<MockTransportFactory>,
    pub capture: Arc<MockCapture>,
}

impl TestClient {
    /// Waits for the first event matching `pred`, skipping the rest.
    pub async fn expect_event(&mut self, pred: impl Fn(&ClientEvent) -> bool) -> ClientEvent {
        let deadline = Duration::from_millis(EVENT_TIMEOUT_MS);
        let found = timeout(deadline, async {
            while let Some(event) = self.events.recv().await {
                if pred(&event) {
                    return Some(event);
                }
            }
            None
        })
        .await;

        match found {
            Ok(Some(event)) => event,
            Ok(None) => panic!("{}: event stream closed", self.id),
            Err(_) => panic!("{}: expected event did not arrive", self.id),
        }
    }

    /// Collects events for `ms` and returns those matching `pred`.
    pub async fn collect_for(
        &mut self,
        ms: u64,
        pred: impl Fn(&ClientEvent) -> bool,
    ) -> Vec<ClientEvent> {
        let until = Instant::now() + Duration::from_millis(ms);
        let mut matched = Vec::new();
        while let Ok(Some(event)) = tokio::time::timeout_at(until, self.events.recv()).await {
            if pred(&event) {
                matched.push(event);
            }
        }
        matched
    }

    pub async fn expect_connected(&mut self, peer: &str) {
        let peer = ParticipantId::from(peer);
        self.expect_event(|e| {
            matches!(e, ClientEvent::PeerState { peer_id, state }
                if *peer_id == peer && *state == huddle_client::NegotiationState::Connected)
        })
        .await;
    }
}

fn build(
    id: &str,
    capture: MockCapture,
    signaling: mpsc::UnboundedSender<Envelope>,
) -> (HuddleClient, TestClient) {
    let factory = Arc::new(MockTransportFactory::default());
    let capture = Arc::new(capture);
    let config = ClientConfig {
        participant_id: ParticipantId::from(id),
        ..Default::default()
    };
    let (client, handle, events) =
        HuddleClient::new(config, capture.clone(), factory.clone(), signaling);

    let test_client = TestClient {
        id: ParticipantId::from(id),
        handle,
        events,
        factory,
        capture,
    };
    (client, test_client)
}

/// A client wired to `relay` through in-memory channels instead of a socket.
pub fn spawn_relayed(relay: &SignalingRelay, id: &str) -> TestClient {
    spawn_relayed_with(relay, id, MockCapture::default())
}

pub fn spawn_relayed_with(relay: &SignalingRelay, id: &str, capture: MockCapture) -> TestClient {
    let (sink, mut frames) = ParticipantSink::channel();
    let mut connection = relay.connect(sink);
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Envelope>();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<Envelope>();

    tokio::spawn(async move {
        while let Some(envelope) = outbound_rx.recv().await {
            let text = envelope.to_json().expect("serializable envelope");
            connection.handle_text(&text);
        }
        connection.close();
    });

    tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            let envelope = Envelope::from_json(&frame).expect("relay sent a valid envelope");
            if inbound_tx.send(envelope).is_err() {
                break;
            }
        }
    });

    let (client, test_client) = build(id, capture, outbound_tx);
    tokio::spawn(client.run(inbound_rx));
    test_client
}

/// A client whose signaling the test plays by hand.
pub struct DirectClient {
    pub client: TestClient,
    pub inbound: mpsc::UnboundedSender<Envelope>,
    pub outbound: mpsc::UnboundedReceiver<Envelope>,
}

impl DirectClient {
    pub fn spawn(id: &str, capture: MockCapture) -> Self {
        let (outbound_tx, outbound) = mpsc::unbounded_channel();
        let (inbound, inbound_rx) = mpsc::unbounded_channel();
        let (client, test_client) = build(id, capture, outbound_tx);
        tokio::spawn(client.run(inbound_rx));
        Self {
            client: test_client,
            inbound,
            outbound,
        }
    }

    pub async fn join(&mut self, room: &str) {
        self.client
            .handle
            .join(RoomId::from(room))
            .await
            .expect("join failed");
        let sent = self.next_outbound().await;
        assert!(matches!(sent, Envelope::Join(_)), "expected join, got {sent:?}");
        self.client
            .expect_event(|e| matches!(e, ClientEvent::Joined { .. }))
            .await;
    }

    /// Plays a remote participant offering to this client.
    pub fn offer_from(&self, peer: &str) {
        self.deliver(Envelope::offer(
            self.client.id.clone(),
            ParticipantId::from(peer),
            SessionDescription::offer(format!("v=0 offer from {peer}")),
        ));
    }

    /// Offers from `peer` and waits until the session reports connected.
    pub async fn connect_responder(&mut self, peer: &str) {
        self.offer_from(peer);
        self.client.expect_connected(peer).await;
    }

    pub fn deliver(&self, envelope: Envelope) {
        self.inbound.send(envelope).expect("client stopped");
    }

    pub async fn next_outbound(&mut self) -> Envelope {
        timeout(Duration::from_millis(EVENT_TIMEOUT_MS), self.outbound.recv())
            .await
            .expect("nothing sent to relay")
            .expect("signaling closed")
    }
}

/// Polls until `check` holds or the event timeout passes.
pub async fn eventually(check: impl Fn() -> bool) -> bool {
    let until = Instant::now() + Duration::from_millis(EVENT_TIMEOUT_MS);
    while Instant::now() < until {
        if check() {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    check()
}
