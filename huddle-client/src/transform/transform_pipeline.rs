use crate::media::EncodedFrame;
use crate::transform::glitch::Glitch;
use crate::transform::pixelation::Pixelation;
use crate::transform::transform_settings::TransformSettings;
use std::sync::Arc;

/// Rewrites outgoing encoded video frames. One pipeline per attached sender.
pub enum TransformPipeline {
    Pixelation(Pixelation),
    Glitch(Glitch),
}

impl TransformPipeline {
    /// Picks the pipeline for the current switches. `None` means frames pass
    /// through untouched.
    pub fn install(settings: &Arc<TransformSettings>) -> Option<Self> {
        if settings.pixelation() {
            Some(Self::Pixelation(Pixelation::new(settings.clone())))
        } else if settings.glitch() {
            Some(Self::Glitch(Glitch::new()))
        } else {
            None
        }
    }

    pub fn process(&mut self, frame: EncodedFrame) -> EncodedFrame {
        match self {
            Self::Pixelation(p) => p.apply(frame),
            Self::Glitch(g) => g.apply(frame),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pixelation(_) => "pixelation",
            Self::Glitch(_) => "glitch",
        }
    }
}
