use crate::session::NegotiationState;
use crate::transform::TransformSnapshot;
use huddle_core::{ParticipantId, RoomId};

/// What a UI needs to render the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Joined {
        room_id: RoomId,
    },
    /// The local preview now shows `track_id`.
    LocalPreview {
        track_id: Option<String>,
        screen_share: bool,
    },
    PeerState {
        peer_id: ParticipantId,
        state: NegotiationState,
    },
    /// At most once per remote participant until it is detached.
    RemoteMediaAttached {
        peer_id: ParticipantId,
        track_id: String,
    },
    RemoteMediaDetached {
        peer_id: ParticipantId,
    },
    ChatOpened {
        peer_id: ParticipantId,
    },
    Chat {
        from: ParticipantId,
        text: String,
    },
    TransformChanged(TransformSnapshot),
    Left,
}
