use crate::error::TransportError;
use crate::media::MediaTrack;
use crate::transform::TransformPipeline;
use crate::transport::transport_config::TransportConfig;
use crate::transport::transport_event::TransportEvent;
use async_trait::async_trait;
use huddle_core::{IceCandidate, ParticipantId, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

#[async_trait]
pub trait DataChannel: Send + Sync {
    fn label(&self) -> String;

    fn is_open(&self) -> bool;

    async fn send_text(&self, text: &str) -> Result<(), TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}

/// One peer-to-peer media connection.
///
/// Outgoing tracks are attached with an optional transform pipeline that sees
/// every encoded frame before it is packetized.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn add_track(
        &self,
        track: Arc<MediaTrack>,
        pipeline: Option<TransformPipeline>,
    ) -> Result<(), TransportError>;

    /// Swaps the source feeding the existing sender of the same kind. No
    /// renegotiation happens.
    async fn replace_track(
        &self,
        track: Arc<MediaTrack>,
        pipeline: Option<TransformPipeline>,
    ) -> Result<(), TransportError>;

    async fn create_offer(&self) -> Result<SessionDescription, TransportError>;

    async fn create_answer(&self) -> Result<SessionDescription, TransportError>;

    async fn set_local_description(&self, desc: SessionDescription)
    -> Result<(), TransportError>;

    async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), TransportError>;

    async fn add_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError>;

    async fn create_data_channel(&self, label: &str)
    -> Result<Arc<dyn DataChannel>, TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// `events` receives everything the transport reports asynchronously.
    async fn create(
        &self,
        peer_id: &ParticipantId,
        config: &TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>, TransportError>;
}
