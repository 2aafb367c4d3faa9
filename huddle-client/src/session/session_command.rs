use crate::media::MediaTrack;
use huddle_core::{IceCandidate, SessionDescription};
use std::sync::Arc;
use tokio::sync::oneshot;

pub enum SessionCommand {
    RemoteAnswer(SessionDescription),
    RemoteCandidate(IceCandidate),
    /// Swap the outgoing video source and reinstall the transform pipeline.
    /// `ack` fires once the swap is done or has failed.
    ReplaceVideo {
        track: Arc<MediaTrack>,
        ack: oneshot::Sender<()>,
    },
}
