use crate::model::participant::ParticipantId;
use crate::model::room::RoomId;
use crate::model::session_description::{IceCandidate, SessionDescription};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub room_id: RoomId,
    pub user_id: ParticipantId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresencePayload {
    pub user_id: ParticipantId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferPayload {
    pub target_id: ParticipantId,
    pub from: ParticipantId,
    pub offer: SessionDescription,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPayload {
    pub target_id: ParticipantId,
    pub from: ParticipantId,
    pub answer: SessionDescription,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePayload {
    pub target_id: ParticipantId,
    pub from: ParticipantId,
    pub candidate: IceCandidate,
}

/// One signaling message: `{"type": ..., "payload": {...}}`.
///
/// `join` goes client to relay, `user-joined`/`user-left` are relay broadcasts,
/// and `offer`/`answer`/`candidate` are unicast to `targetId` through the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum Envelope {
    Join(JoinPayload),
    UserJoined(PresencePayload),
    Offer(OfferPayload),
    Answer(AnswerPayload),
    Candidate(CandidatePayload),
    UserLeft(PresencePayload),
}

impl Envelope {
    pub fn join(room_id: RoomId, user_id: ParticipantId) -> Self {
        Self::Join(JoinPayload { room_id, user_id })
    }

    pub fn user_joined(user_id: ParticipantId) -> Self {
        Self::UserJoined(PresencePayload { user_id })
    }

    pub fn user_left(user_id: ParticipantId) -> Self {
        Self::UserLeft(PresencePayload { user_id })
    }

    pub fn offer(target_id: ParticipantId, from: ParticipantId, offer: SessionDescription) -> Self {
        Self::Offer(OfferPayload {
            target_id,
            from,
            offer,
        })
    }

    pub fn answer(
        target_id: ParticipantId,
        from: ParticipantId,
        answer: SessionDescription,
    ) -> Self {
        Self::Answer(AnswerPayload {
            target_id,
            from,
            answer,
        })
    }

    pub fn candidate(
        target_id: ParticipantId,
        from: ParticipantId,
        candidate: IceCandidate,
    ) -> Self {
        Self::Candidate(CandidatePayload {
            target_id,
            from,
            candidate,
        })
    }

    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Self::Join(_) => EnvelopeKind::Join,
            Self::UserJoined(_) => EnvelopeKind::UserJoined,
            Self::Offer(_) => EnvelopeKind::Offer,
            Self::Answer(_) => EnvelopeKind::Answer,
            Self::Candidate(_) => EnvelopeKind::Candidate,
            Self::UserLeft(_) => EnvelopeKind::UserLeft,
        }
    }

    /// `targetId` of a unicast envelope.
    pub fn target(&self) -> Option<&ParticipantId> {
        match self {
            Self::Offer(p) => Some(&p.target_id),
            Self::Answer(p) => Some(&p.target_id),
            Self::Candidate(p) => Some(&p.target_id),
            _ => None,
        }
    }

    /// `from` of a unicast envelope.
    pub fn sender(&self) -> Option<&ParticipantId> {
        match self {
            Self::Offer(p) => Some(&p.from),
            Self::Answer(p) => Some(&p.from),
            Self::Candidate(p) => Some(&p.from),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvelopeKind {
    Join,
    UserJoined,
    Offer,
    Answer,
    Candidate,
    UserLeft,
}

impl EnvelopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::UserJoined => "user-joined",
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::Candidate => "candidate",
            Self::UserLeft => "user-left",
        }
    }

    pub fn is_unicast(self) -> bool {
        matches!(self, Self::Offer | Self::Answer | Self::Candidate)
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fields a relay needs to route an envelope, parsed without touching the
/// opaque session-description or candidate blobs.
#[derive(Debug, Deserialize)]
pub struct RoutingHeader {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    #[serde(default)]
    pub payload: RoutingPayload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingPayload {
    pub room_id: Option<RoomId>,
    pub user_id: Option<ParticipantId>,
    pub target_id: Option<ParticipantId>,
}

impl RoutingHeader {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
