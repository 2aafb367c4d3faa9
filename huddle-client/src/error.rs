use crate::media::TrackKind;
use huddle_core::RoomId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("permission to capture {0} was denied")]
    PermissionDenied(TrackKind),

    #[error("no {0} device available")]
    NoDevice(TrackKind),

    #[error("display capture is not supported")]
    DisplayUnsupported,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("remote description rejected: {0}")]
    RemoteDescription(String),

    #[error("local description failed: {0}")]
    LocalDescription(String),

    #[error("candidate rejected: {0}")]
    Candidate(String),

    #[error("data channel error: {0}")]
    DataChannel(String),

    #[error("track error: {0}")]
    Track(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("media acquisition failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("already in room {0}")]
    AlreadyJoined(RoomId),

    #[error("another capture is still in progress")]
    CaptureBusy,

    #[error("no local {0} track")]
    NoLocalTrack(TrackKind),

    #[error("signaling channel closed")]
    SignalingClosed,

    #[error("client stopped")]
    Stopped,
}
