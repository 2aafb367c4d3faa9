use crate::transform::DEFAULT_PIXELATION_LEVEL;
use crate::transport::TransportConfig;
use huddle_core::ParticipantId;
use huddle_core::utils::CHAT_CHANNEL_LABEL;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub participant_id: ParticipantId,
    pub transport: TransportConfig,
    pub chat_label: String,
    pub pixelation_level: u8,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            participant_id: ParticipantId::random(),
            transport: TransportConfig::default(),
            chat_label: CHAT_CHANNEL_LABEL.to_owned(),
            pixelation_level: DEFAULT_PIXELATION_LEVEL,
        }
    }
}
