use std::fmt;

/// Which side sent the offer. The existing member always initiates towards
/// a newcomer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

/// ```text
/// Idle -> OfferSent -> Connecting -> Connected -> Closed     (initiator)
/// Idle -> OfferReceived -> Connecting -> Connected -> Closed (responder)
/// ```
/// Any state may go to `Closed`. Nothing leaves `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    OfferSent,
    OfferReceived,
    Connecting,
    Connected,
    Closed,
}

impl NegotiationState {
    pub fn is_closed(self) -> bool {
        self == Self::Closed
    }

    /// Whether a remote answer may be applied now.
    pub fn awaits_answer(self) -> bool {
        self == Self::OfferSent
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::OfferSent => "offer-sent",
            Self::OfferReceived => "offer-received",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}
