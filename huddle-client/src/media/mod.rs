mod capture;
mod media_track;

pub use capture::*;
pub use media_track::*;
