mod chat_channels;
mod client_command;
mod client_event;
mod client_handle;
mod huddle_client;

pub use chat_channels::*;
pub use client_command::*;
pub use client_event::*;
pub use client_handle::*;
pub use huddle_client::*;
