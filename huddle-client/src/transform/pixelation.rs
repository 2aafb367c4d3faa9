use crate::media::EncodedFrame;
use crate::transform::transform_settings::TransformSettings;
use bytes::Bytes;
use std::sync::Arc;

/// Only every n-th frame is touched.
pub const PIXELATION_FRAME_INTERVAL: u64 = 5;
pub const PIXELATION_CHUNK: usize = 10;

/// Coarse pixelation on encoded bytes: on every fifth frame, chunks whose
/// offset falls in the low part of each 20-byte window are zeroed.
pub struct Pixelation {
    settings: Arc<TransformSettings>,
    frame_index: u64,
}

impl Pixelation {
    pub fn new(settings: Arc<TransformSettings>) -> Self {
        Self {
            settings,
            frame_index: 0,
        }
    }

    pub fn apply(&mut self, frame: EncodedFrame) -> EncodedFrame {
        let index = self.frame_index;
        self.frame_index = self.frame_index.wrapping_add(1);
        if index % PIXELATION_FRAME_INTERVAL != 0 {
            return frame;
        }
        let data = pixelate(&frame.data, self.settings.pixelation_level());
        frame.with_data(data)
    }
}

/// The chunk starting at offset `i` is zeroed when
/// `i % (2 * PIXELATION_CHUNK) < level` and copied otherwise. The last chunk
/// is clamped to the input length.
pub fn pixelate(input: &[u8], level: u8) -> Bytes {
    let mut out = vec![0u8; input.len()];
    for (n, chunk) in input.chunks(PIXELATION_CHUNK).enumerate() {
        let offset = n * PIXELATION_CHUNK;
        if offset % (2 * PIXELATION_CHUNK) >= usize::from(level) {
            out[offset..offset + chunk.len()].copy_from_slice(chunk);
        }
    }
    Bytes::from(out)
}
