use crate::room::{ConnectionId, Frame, ParticipantSink, RoomRegistry};
use huddle_core::{Envelope, EnvelopeKind, ParticipantId, RoomId, RoutingHeader, RoutingPayload};
use std::mem;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Entry point for client connections. Cheap to clone.
#[derive(Clone, Default)]
pub struct SignalingRelay {
    registry: Arc<RoomRegistry>,
}

impl SignalingRelay {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Starts the per-connection state machine for a newly accepted client.
    pub fn connect(&self, sink: ParticipantSink) -> RelayConnection {
        RelayConnection {
            registry: self.registry.clone(),
            sink,
            state: RelayState::Unjoined,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayState {
    Unjoined,
    Joined {
        room_id: RoomId,
        user_id: ParticipantId,
    },
}

/// What happened to one inbound message. Nothing of this is reported back to
/// the sender; it exists for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Joined { notified: usize },
    Forwarded { target: ParticipantId },
    Dropped(DropReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    Malformed,
    MissingField(&'static str),
    NotJoined,
    AlreadyJoined,
    UnknownTarget,
    RelayOnlyKind(EnvelopeKind),
}

/// Relay-side state of one client connection: `Unjoined` until a `join`
/// arrives, then `Joined` until the connection closes.
pub struct RelayConnection {
    registry: Arc<RoomRegistry>,
    sink: ParticipantSink,
    state: RelayState,
}

impl RelayConnection {
    pub fn state(&self) -> &RelayState {
        &self.state
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.sink.connection()
    }

    pub fn handle_text(&mut self, text: &str) -> RelayOutcome {
        let header = match RoutingHeader::parse(text) {
            Ok(header) => header,
            Err(e) => {
                warn!("Invalid envelope from {}: {}", self.connection_id(), e);
                return RelayOutcome::Dropped(DropReason::Malformed);
            }
        };

        match header.kind {
            EnvelopeKind::Join => self.handle_join(header.payload),
            EnvelopeKind::Offer | EnvelopeKind::Answer | EnvelopeKind::Candidate => {
                self.forward(header.kind, header.payload.target_id, text)
            }
            kind @ (EnvelopeKind::UserJoined | EnvelopeKind::UserLeft) => {
                debug!("Ignoring relay-only '{}' from {}", kind, self.connection_id());
                RelayOutcome::Dropped(DropReason::RelayOnlyKind(kind))
            }
        }
    }

    /// Deregisters and tells the remaining members. Safe to call repeatedly.
    pub fn close(&mut self) -> Option<usize> {
        let RelayState::Joined { room_id, user_id } =
            mem::replace(&mut self.state, RelayState::Unjoined)
        else {
            return None;
        };

        let frame = serialize(&Envelope::user_left(user_id.clone()));
        let notified = match frame {
            Some(frame) => self.registry.leave_and_announce(
                &room_id,
                &user_id,
                self.sink.connection(),
                frame,
            ),
            None => self
                .registry
                .leave_connection(&room_id, &user_id, self.sink.connection())
                .then_some(0),
        };

        match notified {
            Some(n) => info!("User {} left room {} ({} notified)", user_id, room_id, n),
            None => debug!(
                "User {} was already replaced in room {}, no user-left sent",
                user_id, room_id
            ),
        }
        notified
    }

    fn handle_join(&mut self, payload: RoutingPayload) -> RelayOutcome {
        if let RelayState::Joined { room_id, user_id } = &self.state {
            warn!(
                "User {} sent a second join while in room {}, ignored",
                user_id, room_id
            );
            return RelayOutcome::Dropped(DropReason::AlreadyJoined);
        }
        let Some(room_id) = payload.room_id else {
            return RelayOutcome::Dropped(DropReason::MissingField("roomId"));
        };
        let Some(user_id) = payload.user_id else {
            return RelayOutcome::Dropped(DropReason::MissingField("userId"));
        };
        let Some(frame) = serialize(&Envelope::user_joined(user_id.clone())) else {
            return RelayOutcome::Dropped(DropReason::Malformed);
        };

        let notified =
            self.registry
                .join_and_announce(&room_id, user_id.clone(), self.sink.clone(), frame);
        info!(
            "User {} joined room {} ({} notified)",
            user_id, room_id, notified
        );

        self.state = RelayState::Joined { room_id, user_id };
        RelayOutcome::Joined { notified }
    }

    fn forward(
        &self,
        kind: EnvelopeKind,
        target: Option<ParticipantId>,
        text: &str,
    ) -> RelayOutcome {
        let RelayState::Joined { room_id, user_id } = &self.state else {
            debug!("Dropping '{}' from unjoined {}", kind, self.connection_id());
            return RelayOutcome::Dropped(DropReason::NotJoined);
        };
        let Some(target) = target else {
            return RelayOutcome::Dropped(DropReason::MissingField("targetId"));
        };

        if self.registry.unicast(room_id, &target, Frame::from(text)) {
            debug!("Forwarded '{}' {} -> {}", kind, user_id, target);
            RelayOutcome::Forwarded { target }
        } else {
            debug!("Dropped '{}' from {}: {} not in room", kind, user_id, target);
            RelayOutcome::Dropped(DropReason::UnknownTarget)
        }
    }
}

impl Drop for RelayConnection {
    fn drop(&mut self) {
        self.close();
    }
}

fn serialize(envelope: &Envelope) -> Option<Frame> {
    match envelope.to_json() {
        Ok(json) => Some(Frame::from(json)),
        Err(e) => {
            error!("Failed to serialize {} envelope: {}", envelope.kind(), e);
            None
        }
    }
}
