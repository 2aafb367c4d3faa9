mod config;
mod engine;
mod error;
mod media;
mod session;
mod signaling;
mod transform;
mod transport;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use media::*;
pub use session::*;
pub use signaling::*;
pub use transform::*;
pub use transport::*;
