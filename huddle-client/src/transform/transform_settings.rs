use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

pub const DEFAULT_PIXELATION_LEVEL: u8 = 10;
pub const MAX_PIXELATION_LEVEL: u8 = 100;

/// Client-wide effect switches. Pixelation and glitch are mutually exclusive:
/// turning one on turns the other off.
///
/// The level is read by running pipelines on every processed frame, so it can
/// change without reinstalling anything. The switches only take effect when a
/// pipeline is (re)installed.
#[derive(Debug)]
pub struct TransformSettings {
    pixelation: AtomicBool,
    glitch: AtomicBool,
    pixelation_level: AtomicU8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformSnapshot {
    pub pixelation: bool,
    pub glitch: bool,
    pub pixelation_level: u8,
}

impl TransformSettings {
    pub fn new(pixelation_level: u8) -> Self {
        Self {
            pixelation: AtomicBool::new(false),
            glitch: AtomicBool::new(false),
            pixelation_level: AtomicU8::new(pixelation_level.min(MAX_PIXELATION_LEVEL)),
        }
    }

    pub fn pixelation(&self) -> bool {
        self.pixelation.load(Ordering::Acquire)
    }

    pub fn glitch(&self) -> bool {
        self.glitch.load(Ordering::Acquire)
    }

    pub fn pixelation_level(&self) -> u8 {
        self.pixelation_level.load(Ordering::Relaxed)
    }

    pub fn set_pixelation(&self, on: bool) {
        if on {
            self.glitch.store(false, Ordering::Release);
        }
        self.pixelation.store(on, Ordering::Release);
    }

    pub fn set_glitch(&self, on: bool) {
        if on {
            self.pixelation.store(false, Ordering::Release);
        }
        self.glitch.store(on, Ordering::Release);
    }

    pub fn toggle_pixelation(&self) -> bool {
        let on = !self.pixelation();
        self.set_pixelation(on);
        on
    }

    pub fn toggle_glitch(&self) -> bool {
        let on = !self.glitch();
        self.set_glitch(on);
        on
    }

    /// Stores the level clamped to `0..=MAX_PIXELATION_LEVEL` and returns it.
    pub fn set_pixelation_level(&self, level: u8) -> u8 {
        let level = level.min(MAX_PIXELATION_LEVEL);
        self.pixelation_level.store(level, Ordering::Relaxed);
        level
    }

    pub fn snapshot(&self) -> TransformSnapshot {
        TransformSnapshot {
            pixelation: self.pixelation(),
            glitch: self.glitch(),
            pixelation_level: self.pixelation_level(),
        }
    }
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self::new(DEFAULT_PIXELATION_LEVEL)
    }
}
