use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use huddle_core::{Envelope, ParticipantId, RoomId};
use huddle_server::{RoomRegistry, ServerConfig, SignalingRelay, router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Timeout for a single expected frame (ms).
pub const RECV_TIMEOUT_MS: u64 = 2000;

/// Starts the real router on an ephemeral port.
pub async fn spawn_server() -> Result<(SocketAddr, SignalingRelay)> {
    let relay = SignalingRelay::new(Arc::new(RoomRegistry::new()));
    let app = router(relay.clone(), &ServerConfig::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok((addr, relay))
}

/// Polls the registry until `user` is registered in `room`.
pub async fn wait_until_joined(relay: &SignalingRelay, room: &str, user: &str) -> Result<()> {
    let room = RoomId::from(room);
    let user = ParticipantId::from(user);
    tokio::time::timeout(Duration::from_millis(RECV_TIMEOUT_MS), async {
        while !relay.registry().contains(&room, &user) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .context("participant never registered")
}

pub struct WsPeer {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsPeer {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let (stream, _) = connect_async(format!("ws://{}/ws", addr))
            .await
            .context("WebSocket connect failed")?;
        Ok(Self { stream })
    }

    pub async fn send(&mut self, envelope: &Envelope) -> Result<()> {
        self.send_text(&envelope.to_json()?).await
    }

    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.stream
            .send(Message::Text(text.to_owned()))
            .await
            .context("WebSocket send failed")
    }

    pub async fn recv_text(&mut self) -> Result<String> {
        let timeout = Duration::from_millis(RECV_TIMEOUT_MS);
        loop {
            let msg = tokio::time::timeout(timeout, self.stream.next())
                .await
                .context("Timeout waiting for frame")?
                .context("Stream ended")??;
            if let Message::Text(text) = msg {
                return Ok(text);
            }
        }
    }

    pub async fn recv(&mut self) -> Result<Envelope> {
        let text = self.recv_text().await?;
        Envelope::from_json(&text).context("Invalid envelope from relay")
    }

    /// True if nothing arrives within `ms`.
    pub async fn is_silent_for(&mut self, ms: u64) -> bool {
        tokio::time::timeout(Duration::from_millis(ms), self.stream.next())
            .await
            .is_err()
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}
