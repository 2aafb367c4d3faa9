/// One line typed by the user.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Chat(String),
    Mic,
    Camera,
    Screen,
    Pixelate,
    Glitch,
    Level(u8),
    Peers,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Self::Chat(line.to_owned());
        };

        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("mic"), None) => Self::Mic,
            (Some("cam"), None) => Self::Camera,
            (Some("screen"), None) => Self::Screen,
            (Some("pixelate"), None) => Self::Pixelate,
            (Some("glitch"), None) => Self::Glitch,
            (Some("level"), Some(n)) => match n.parse::<u8>() {
                Ok(level) => Self::Level(level),
                Err(_) => Self::Unknown(line.to_owned()),
            },
            (Some("peers"), None) => Self::Peers,
            (Some("help"), None) => Self::Help,
            (Some("quit" | "exit"), None) => Self::Quit,
            _ => Self::Unknown(line.to_owned()),
        }
    }
}

pub const HELP: &str = "\
/mic        toggle microphone
/cam        toggle camera
/screen     start or stop screen sharing
/pixelate   toggle pixelation
/glitch     toggle glitch
/level N    pixelation level (0-100)
/peers      list connected peers
/quit       leave the room
anything else is sent as chat";
