use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tokio::sync::{broadcast, watch};

const FRAME_BUFFER: usize = 64;

static NEXT_TRACK: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => f.write_str("audio"),
            Self::Video => f.write_str("video"),
        }
    }
}

/// One encoded media frame as produced by an encoder.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub data: Bytes,
    pub timestamp: SystemTime,
    pub duration: Duration,
}

impl EncodedFrame {
    pub fn new(data: impl Into<Bytes>, duration: Duration) -> Self {
        Self {
            data: data.into(),
            timestamp: SystemTime::now(),
            duration,
        }
    }

    /// Same timing, different payload.
    pub fn with_data(&self, data: Bytes) -> Self {
        Self {
            data,
            timestamp: self.timestamp,
            duration: self.duration,
        }
    }
}

/// A local media source. Frames pushed into it fan out to every subscriber
/// (usually one forwarder per peer connection).
#[derive(Debug)]
pub struct MediaTrack {
    id: String,
    kind: TrackKind,
    label: String,
    enabled: AtomicBool,
    frames: broadcast::Sender<EncodedFrame>,
    ended: watch::Sender<bool>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, label: impl Into<String>) -> Arc<Self> {
        let (frames, _) = broadcast::channel(FRAME_BUFFER);
        let (ended, _) = watch::channel(false);
        Arc::new(Self {
            id: format!("{}-{}", kind, NEXT_TRACK.fetch_add(1, Ordering::Relaxed)),
            kind,
            label: label.into(),
            enabled: AtomicBool::new(true),
            frames,
            ended,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Hands a frame to all subscribers. Returns how many received it;
    /// an ended track delivers nothing.
    pub fn push(&self, frame: EncodedFrame) -> usize {
        if self.is_ended() {
            return 0;
        }
        self.frames.send(frame).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EncodedFrame> {
        self.frames.subscribe()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Flips the enabled flag and returns the new value.
    pub fn toggle_enabled(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::AcqRel)
    }

    /// Releases the source. Subscribers waiting in [`MediaTrack::ended`] wake up.
    pub fn stop(&self) {
        self.ended.send_replace(true);
    }

    pub fn is_ended(&self) -> bool {
        *self.ended.borrow()
    }

    pub async fn ended(&self) {
        let mut rx = self.ended.subscribe();
        let _ = rx.wait_for(|ended| *ended).await;
    }
}

/// The tracks acquired for a call.
#[derive(Debug, Clone, Default)]
pub struct LocalTracks {
    pub audio: Option<Arc<MediaTrack>>,
    pub video: Option<Arc<MediaTrack>>,
}

impl LocalTracks {
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MediaTrack>> {
        self.audio.iter().chain(self.video.iter())
    }

    pub fn stop_all(&self) {
        self.iter().for_each(|track| track.stop());
    }
}
