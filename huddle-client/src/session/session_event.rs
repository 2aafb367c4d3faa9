use crate::media::TrackKind;
use crate::session::negotiation_state::NegotiationState;
use crate::transport::DataChannel;
use huddle_core::ParticipantId;
use std::sync::Arc;

/// Reported by a session to the client. `generation` tells a session apart
/// from an earlier one with the same peer.
pub struct SessionEvent {
    pub peer_id: ParticipantId,
    pub generation: u64,
    pub kind: SessionEventKind,
}

pub enum SessionEventKind {
    StateChanged(NegotiationState),
    RemoteTrack { track_id: String, kind: TrackKind },
    ChatOpened(Arc<dyn DataChannel>),
    ChatMessage(String),
    ChatClosed,
    /// Negotiation or connectivity failed. The session closes itself afterwards.
    Failed(String),
}
