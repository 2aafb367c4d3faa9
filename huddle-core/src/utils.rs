pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

/// Label of the data channel the initiator opens for chat.
pub const CHAT_CHANNEL_LABEL: &str = "chat";
