use clap::Parser;
use huddle_client::TransportConfig;
use huddle_core::IceServerConfig;

#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(about = "Join a huddle room from the terminal")]
pub struct CliArgs {
    /// Relay WebSocket endpoint
    #[arg(long, env = "HUDDLE_SERVER", default_value = "ws://127.0.0.1:8080/ws")]
    pub server: String,

    /// Room to join. Prompted for when missing.
    #[arg(short, long)]
    pub room: Option<String>,

    /// Participant id. Random when missing.
    #[arg(short, long)]
    pub user: Option<String>,

    /// STUN/TURN urls, replacing the default STUN servers
    #[arg(long = "ice")]
    pub ice: Vec<String>,

    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    pub log: String,
}

impl CliArgs {
    pub fn transport_config(&self) -> TransportConfig {
        if self.ice.is_empty() {
            return TransportConfig::default();
        }
        TransportConfig {
            ice_servers: self.ice.iter().map(IceServerConfig::stun).collect(),
        }
    }
}
