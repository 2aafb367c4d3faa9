mod participant;
mod room;
mod session_description;
mod signaling;

pub use participant::ParticipantId;
pub use room::RoomId;
pub use session_description::{IceCandidate, SdpType, SessionDescription};
pub use signaling::{
    AnswerPayload, CandidatePayload, Envelope, EnvelopeKind, IceServerConfig, JoinPayload,
    OfferPayload, PresencePayload, RoutingHeader, RoutingPayload,
};
