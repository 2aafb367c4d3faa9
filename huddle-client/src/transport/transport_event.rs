use crate::media::TrackKind;
use crate::transport::peer_transport::DataChannel;
use huddle_core::IceCandidate;
use std::sync::Arc;

/// Connectivity as reported by the underlying peer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Emitted by a transport into its session's event loop.
pub enum TransportEvent {
    CandidateGenerated(IceCandidate),
    TrackReceived { track_id: String, kind: TrackKind },
    DataChannelOpen(Arc<dyn DataChannel>),
    DataChannelMessage { label: String, text: String },
    DataChannelClosed { label: String },
    StateChanged(PeerConnectionState),
}
