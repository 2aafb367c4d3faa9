use crate::error::{CaptureError, ClientError};
use crate::media::{LocalTracks, MediaTrack};
use crate::session::{NegotiationState, Role};
use crate::transform::TransformSnapshot;
use huddle_core::{ParticipantId, RoomId};
use std::sync::Arc;
use tokio::sync::oneshot;

pub(crate) type Reply<T> = oneshot::Sender<Result<T, ClientError>>;

pub enum ClientCommand {
    Join { room_id: RoomId, reply: Reply<()> },
    SendChat { text: String, reply: Reply<usize> },
    ToggleMic { reply: Reply<bool> },
    ToggleCamera { reply: Reply<bool> },
    ToggleScreenShare { reply: Reply<bool> },
    TogglePixelation { reply: Reply<TransformSnapshot> },
    ToggleGlitch { reply: Reply<TransformSnapshot> },
    SetPixelationLevel { level: u8, reply: Reply<u8> },
    Peers { reply: Reply<Vec<PeerSummary>> },
    Hangup { reply: Reply<()> },
    /// Raised internally when the display source ends on its own.
    ScreenShareEnded { track_id: String },
    /// Raised internally when the camera and microphone for a join are ready.
    JoinMedia {
        room_id: RoomId,
        tracks: Result<LocalTracks, CaptureError>,
        reply: Reply<()>,
    },
    /// Raised internally when the display picker returned.
    DisplayMedia {
        track: Result<Arc<MediaTrack>, CaptureError>,
        reply: Reply<bool>,
    },
    /// Raised internally when a camera to replace the display is ready.
    /// `reply` is `None` when the display ended on its own.
    CameraMedia {
        track: Result<Arc<MediaTrack>, CaptureError>,
        reply: Option<Reply<bool>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSummary {
    pub peer_id: ParticipantId,
    pub role: Role,
    pub state: NegotiationState,
    pub chat_open: bool,
}
