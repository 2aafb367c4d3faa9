use crate::media::{EncodedFrame, MediaTrack};
use crate::transform::TransformPipeline;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use webrtc::media::Sample;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// The outgoing end of a sender: whatever packetizes frames for the wire.
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn write_frame(&self, frame: EncodedFrame) -> anyhow::Result<()>;
}

#[async_trait]
impl FrameSink for TrackLocalStaticSample {
    async fn write_frame(&self, frame: EncodedFrame) -> anyhow::Result<()> {
        let sample = Sample {
            data: frame.data,
            timestamp: frame.timestamp,
            duration: frame.duration,
            ..Default::default()
        };
        self.write_sample(&sample).await?;
        Ok(())
    }
}

/// Copies frames from `source` into `sink` until the source ends, running
/// each through `pipeline` when one is installed. Frames of a disabled track
/// are dropped.
///
/// Subscribes before returning, so nothing pushed after this call is missed.
pub fn spawn_forwarder<S>(
    source: Arc<MediaTrack>,
    sink: Arc<S>,
    pipeline: Option<TransformPipeline>,
) -> JoinHandle<()>
where
    S: FrameSink + ?Sized + 'static,
{
    let frames = source.subscribe();
    tokio::spawn(forward_frames(source, frames, sink, pipeline))
}

async fn forward_frames<S>(
    source: Arc<MediaTrack>,
    mut frames: broadcast::Receiver<EncodedFrame>,
    sink: Arc<S>,
    mut pipeline: Option<TransformPipeline>,
) where
    S: FrameSink + ?Sized,
{
    loop {
        let frame = tokio::select! {
            _ = source.ended() => break,
            received = frames.recv() => match received {
                Ok(frame) => frame,
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Forwarder for {} skipped {} frames", source.id(), skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
        };
        if !source.is_enabled() {
            continue;
        }
        let frame = match pipeline.as_mut() {
            Some(pipeline) => pipeline.process(frame),
            None => frame,
        };
        if let Err(e) = sink.write_frame(frame).await {
            warn!("Failed to write frame from {}: {}", source.id(), e);
        }
    }
    debug!("Forwarder for {} stopped", source.id());
}
