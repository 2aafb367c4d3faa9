use anyhow::Context;
use futures::{SinkExt, StreamExt};
use huddle_core::Envelope;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// WebSocket connection to the relay, exposed as a pair of envelope channels.
///
/// Dropping every clone of `outbound` closes the socket, which the relay
/// treats as leaving the room.
pub struct SignalingConnection {
    pub outbound: mpsc::UnboundedSender<Envelope>,
    pub inbound: mpsc::UnboundedReceiver<Envelope>,
}

impl SignalingConnection {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let (stream, _) = connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to relay at {url}"))?;
        info!("Connected to relay at {}", url);

        let (mut sender, mut receiver) = stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Envelope>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(envelope) = outbound_rx.recv().await {
                let text = match envelope.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        error!("Failed to serialize {} envelope: {}", envelope.kind(), e);
                        continue;
                    }
                };
                if let Err(e) = sender.send(Message::Text(text)).await {
                    warn!("Relay socket write failed: {}", e);
                    break;
                }
            }
            let _ = sender.close().await;
            debug!("Relay writer finished");
        });

        tokio::spawn(async move {
            while let Some(msg) = receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => match Envelope::from_json(&text) {
                        Ok(envelope) => {
                            if inbound_tx.send(envelope).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid envelope from relay: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Relay socket read failed: {}", e);
                        break;
                    }
                }
            }
            info!("Relay connection closed");
        });

        Ok(Self { outbound, inbound })
    }

    pub fn split(
        self,
    ) -> (
        mpsc::UnboundedSender<Envelope>,
        mpsc::UnboundedReceiver<Envelope>,
    ) {
        (self.outbound, self.inbound)
    }
}
