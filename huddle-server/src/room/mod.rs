mod participant_sink;
mod room_registry;

pub use participant_sink::*;
pub use room_registry::*;
