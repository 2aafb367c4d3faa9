use crate::error::CaptureError;
use crate::media::media_track::{LocalTracks, MediaTrack, TrackKind};
use async_trait::async_trait;
use std::sync::Arc;

/// Source of local camera, microphone and display tracks.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    async fn acquire(&self, video: bool, audio: bool) -> Result<LocalTracks, CaptureError>;

    async fn acquire_display(&self) -> Result<Arc<MediaTrack>, CaptureError>;
}

/// Devices that exist but never produce frames. Enough for a chat-only client.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentCapture;

#[async_trait]
impl MediaCapture for SilentCapture {
    async fn acquire(&self, video: bool, audio: bool) -> Result<LocalTracks, CaptureError> {
        Ok(LocalTracks {
            audio: audio.then(|| MediaTrack::new(TrackKind::Audio, "silent microphone")),
            video: video.then(|| MediaTrack::new(TrackKind::Video, "silent camera")),
        })
    }

    async fn acquire_display(&self) -> Result<Arc<MediaTrack>, CaptureError> {
        Err(CaptureError::DisplayUnsupported)
    }
}
