use crate::engine::client_command::{ClientCommand, PeerSummary};
use crate::error::ClientError;
use crate::transform::TransformSnapshot;
use huddle_core::RoomId;
use tokio::sync::{mpsc, oneshot};

/// Controls a running [`HuddleClient`](crate::HuddleClient). Cheap to clone.
#[derive(Clone)]
pub struct ClientHandle {
    commands: mpsc::UnboundedSender<ClientCommand>,
}

impl ClientHandle {
    pub(crate) fn new(commands: mpsc::UnboundedSender<ClientCommand>) -> Self {
        Self { commands }
    }

    /// Acquires camera and microphone, then joins. Nothing is sent to the
    /// relay if media acquisition fails.
    pub async fn join(&self, room_id: RoomId) -> Result<(), ClientError> {
        self.request(|reply| ClientCommand::Join { room_id, reply })
            .await
    }

    /// Sends to every open chat channel. Returns the number of recipients.
    pub async fn send_chat(&self, text: impl Into<String>) -> Result<usize, ClientError> {
        let text = text.into();
        self.request(|reply| ClientCommand::SendChat { text, reply })
            .await
    }

    /// Returns whether the microphone is now enabled.
    pub async fn toggle_mic(&self) -> Result<bool, ClientError> {
        self.request(|reply| ClientCommand::ToggleMic { reply }).await
    }

    /// Returns whether the camera is now enabled.
    pub async fn toggle_camera(&self) -> Result<bool, ClientError> {
        self.request(|reply| ClientCommand::ToggleCamera { reply })
            .await
    }

    /// Returns whether the screen is now being shared.
    pub async fn toggle_screen_share(&self) -> Result<bool, ClientError> {
        self.request(|reply| ClientCommand::ToggleScreenShare { reply })
            .await
    }

    pub async fn toggle_pixelation(&self) -> Result<TransformSnapshot, ClientError> {
        self.request(|reply| ClientCommand::TogglePixelation { reply })
            .await
    }

    pub async fn toggle_glitch(&self) -> Result<TransformSnapshot, ClientError> {
        self.request(|reply| ClientCommand::ToggleGlitch { reply })
            .await
    }

    /// Returns the stored, clamped level.
    pub async fn set_pixelation_level(&self, level: u8) -> Result<u8, ClientError> {
        self.request(|reply| ClientCommand::SetPixelationLevel { level, reply })
            .await
    }

    pub async fn peers(&self) -> Result<Vec<PeerSummary>, ClientError> {
        self.request(|reply| ClientCommand::Peers { reply }).await
    }

    /// Closes every session, releases local media and stops the client.
    pub async fn hangup(&self) -> Result<(), ClientError> {
        self.request(|reply| ClientCommand::Hangup { reply }).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<Result<T, ClientError>>) -> ClientCommand,
    ) -> Result<T, ClientError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| ClientError::Stopped)?;
        response.await.map_err(|_| ClientError::Stopped)?
    }
}
