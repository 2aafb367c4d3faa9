use crate::media::EncodedFrame;
use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Bytes overwritten per frame.
pub const GLITCH_CORRUPTIONS: usize = 5;

/// Overwrites a handful of random bytes in every frame. Positions may repeat.
pub struct Glitch {
    rng: StdRng,
}

impl Glitch {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn apply(&mut self, frame: EncodedFrame) -> EncodedFrame {
        if frame.data.is_empty() {
            return frame;
        }
        let mut data = frame.data.to_vec();
        for _ in 0..GLITCH_CORRUPTIONS {
            let index = self.rng.random_range(0..data.len());
            data[index] = self.rng.random();
        }
        frame.with_data(Bytes::from(data))
    }
}

impl Default for Glitch {
    fn default() -> Self {
        Self::new()
    }
}
