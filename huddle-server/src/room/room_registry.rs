use crate::room::participant_sink::{ConnectionId, Frame, ParticipantSink};
use dashmap::DashMap;
use huddle_core::{ParticipantId, RoomId};
use std::collections::HashMap;
use tracing::{debug, info, warn};

type Members = HashMap<ParticipantId, ParticipantSink>;

/// Process-wide table of rooms.
///
/// Every mutation of a room happens while its DashMap entry is held, so
/// join/leave/broadcast on one room are serialized while different rooms
/// proceed independently.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<RoomId, Members>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `sink` under `room_id`, creating the room if absent.
    /// A duplicate id overwrites the previous sink without closing it.
    pub fn join(&self, room_id: &RoomId, participant_id: ParticipantId, sink: ParticipantSink) {
        let mut room = self.rooms.entry(room_id.clone()).or_default();
        Self::insert(&mut room, room_id, participant_id, sink);
    }

    /// Sends `frame` to everyone already in the room, then registers the
    /// joiner, all under one lock. Returns the number of notified members.
    pub fn join_and_announce(
        &self,
        room_id: &RoomId,
        participant_id: ParticipantId,
        sink: ParticipantSink,
        frame: Frame,
    ) -> usize {
        let mut room = self.rooms.entry(room_id.clone()).or_default();
        let notified = Self::send_all_except(&room, &participant_id, &frame);
        Self::insert(&mut room, room_id, participant_id, sink);
        notified
    }

    /// Removes the entry. Returns whether anything was removed.
    pub fn leave(&self, room_id: &RoomId, participant_id: &ParticipantId) -> bool {
        self.remove_where(room_id, participant_id, None, None).is_some()
    }

    /// Removes the entry only if it still belongs to `connection`, so a stale
    /// connection closing cannot evict a newer one registered under the same id.
    pub fn leave_connection(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
        connection: ConnectionId,
    ) -> bool {
        self.remove_where(room_id, participant_id, Some(connection), None)
            .is_some()
    }

    /// `leave_connection` followed by a broadcast of `frame` to the remaining
    /// members under the same lock. `None` if nothing was removed.
    pub fn leave_and_announce(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
        connection: ConnectionId,
        frame: Frame,
    ) -> Option<usize> {
        self.remove_where(room_id, participant_id, Some(connection), Some(frame))
    }

    /// Sends `frame` to every open sink in the room except `except`.
    pub fn broadcast_except(&self, room_id: &RoomId, except: &ParticipantId, frame: Frame) -> usize {
        match self.rooms.get(room_id) {
            Some(room) => Self::send_all_except(&room, except, &frame),
            None => 0,
        }
    }

    /// Sends `frame` to one participant. Returns whether the target was found.
    pub fn unicast(&self, room_id: &RoomId, target_id: &ParticipantId, frame: Frame) -> bool {
        let Some(room) = self.rooms.get(room_id) else {
            return false;
        };
        let Some(sink) = room.get(target_id) else {
            return false;
        };
        if !sink.send(frame) {
            debug!("Sink for {} in room {} is not open", target_id, room_id);
        }
        true
    }

    pub fn participants(&self, room_id: &RoomId) -> Vec<ParticipantId> {
        let mut ids: Vec<ParticipantId> = self
            .rooms
            .get(room_id)
            .map(|room| room.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn contains(&self, room_id: &RoomId, participant_id: &ParticipantId) -> bool {
        self.rooms
            .get(room_id)
            .is_some_and(|room| room.contains_key(participant_id))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn insert(
        room: &mut Members,
        room_id: &RoomId,
        participant_id: ParticipantId,
        sink: ParticipantSink,
    ) {
        let connection = sink.connection();
        if let Some(previous) = room.insert(participant_id.clone(), sink) {
            warn!(
                "Participant {} re-registered in room {}: {} replaced {}",
                participant_id,
                room_id,
                connection,
                previous.connection()
            );
        }
    }

    fn send_all_except(room: &Members, except: &ParticipantId, frame: &Frame) -> usize {
        room.iter()
            .filter(|(id, _)| *id != except)
            .filter(|(_, sink)| sink.send(frame.clone()))
            .count()
    }

    fn remove_where(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
        connection: Option<ConnectionId>,
        announce: Option<Frame>,
    ) -> Option<usize> {
        let result = {
            let mut room = self.rooms.get_mut(room_id)?;
            let owned = room
                .get(participant_id)
                .is_some_and(|sink| connection.is_none_or(|c| sink.connection() == c));
            if !owned {
                return None;
            }
            room.remove(participant_id);
            announce.map_or(0, |frame| Self::send_all_except(&room, participant_id, &frame))
        };

        if self.rooms.remove_if(room_id, |_, room| room.is_empty()).is_some() {
            info!("Room {} is empty, removed", room_id);
        }

        Some(result)
    }
}
