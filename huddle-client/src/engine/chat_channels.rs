use crate::transport::DataChannel;
use dashmap::DashMap;
use huddle_core::ParticipantId;
use std::sync::Arc;
use tracing::{error, warn};

/// Chat channels by remote participant. Cheap to clone and share between tasks.
#[derive(Clone, Default)]
pub struct ChatChannels {
    peers: Arc<DashMap<ParticipantId, Arc<dyn DataChannel>>>,
}

impl ChatChannels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, peer_id: ParticipantId, channel: Arc<dyn DataChannel>) {
        self.peers.insert(peer_id, channel);
    }

    pub fn remove(&self, peer_id: &ParticipantId) -> Option<Arc<dyn DataChannel>> {
        self.peers.remove(peer_id).map(|(_, channel)| channel)
    }

    /// Sends to one participant.
    pub async fn send(&self, peer_id: &ParticipantId, text: &str) -> bool {
        let Some(channel) = self.peers.get(peer_id).map(|entry| entry.value().clone()) else {
            warn!("No chat channel to {}", peer_id);
            return false;
        };
        match channel.send_text(text).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to send chat to {}: {}", peer_id, e);
                false
            }
        }
    }

    /// Sends to every open channel. Returns how many accepted the message.
    pub async fn broadcast(&self, text: &str) -> usize {
        // Collect first: sending is async and must not hold the map guard.
        let channels: Vec<(ParticipantId, Arc<dyn DataChannel>)> = self
            .peers
            .iter()
            .filter(|entry| entry.value().is_open())
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut delivered = 0;
        for (peer_id, channel) in channels {
            match channel.send_text(text).await {
                Ok(()) => delivered += 1,
                Err(e) => error!("Chat broadcast to {} failed: {}", peer_id, e),
            }
        }
        delivered
    }

    pub fn list_peers(&self) -> Vec<ParticipantId> {
        let mut ids: Vec<ParticipantId> = self.peers.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn contains(&self, peer_id: &ParticipantId) -> bool {
        self.peers.contains_key(peer_id)
    }
}
