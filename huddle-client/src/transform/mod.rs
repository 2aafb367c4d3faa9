mod glitch;
mod pixelation;
mod transform_pipeline;
mod transform_settings;

pub use glitch::*;
pub use pixelation::*;
pub use transform_pipeline::*;
pub use transform_settings::*;
