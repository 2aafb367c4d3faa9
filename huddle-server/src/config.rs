use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "huddle-server", about = "Room signaling relay for peer-to-peer calls")]
pub struct ServerConfig {
    /// Address to accept WebSocket clients on.
    #[arg(long, env = "HUDDLE_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Directory served for any path other than `/ws` and `/health`.
    #[arg(long, env = "HUDDLE_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Largest inbound WebSocket message accepted.
    #[arg(long, env = "HUDDLE_MAX_MESSAGE_BYTES", default_value_t = 256 * 1024)]
    pub max_message_bytes: usize,

    /// tracing filter directives.
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
            static_dir: None,
            max_message_bytes: 256 * 1024,
            log: "info".to_owned(),
        }
    }
}
