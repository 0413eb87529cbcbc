//! Error taxonomy for the matcher

use serde::{Deserialize, Serialize};

use crate::participant::ParticipantId;
use crate::round::ExchangeId;

/// Why an action was refused by [`RoundState`](crate::RoundState).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceViolation {
    /// Participant holds no seat in the round.
    NoSeat,
    /// Offer sent by someone who is not the Bidder (includes Solo).
    NotBidder,
    /// Response sent by someone who is not the Responder (includes Solo).
    NotResponder,
    /// A second offer for the same exchange.
    DuplicateOffer,
    /// Response arrived before any offer was recorded.
    ResponseBeforeOffer,
    /// A second response for the same exchange.
    DuplicateResponse,
}

impl core::fmt::Display for SequenceViolation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            SequenceViolation::NoSeat => "no seat in this round",
            SequenceViolation::NotBidder => "only the bidder may offer",
            SequenceViolation::NotResponder => "only the responder may respond",
            SequenceViolation::DuplicateOffer => "offer already recorded",
            SequenceViolation::ResponseBeforeOffer => "no offer to respond to",
            SequenceViolation::DuplicateResponse => "response already recorded",
        };
        f.write_str(text)
    }
}

/// Failures of the core operations. All are recoverable by the caller.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("out-of-sequence action from {participant} in round {round}: {violation}")]
    OutOfSequenceAction {
        participant: ParticipantId,
        round: u32,
        violation: SequenceViolation,
    },

    #[error("offer {offer} outside [0, {coins}]")]
    InvalidOffer { offer: u32, coins: u32 },

    #[error("no offer available for responder {participant} in round {round}")]
    OfferUnavailable { participant: ParticipantId, round: u32 },

    #[error("payoff for exchange {exchange} already applied")]
    DuplicatePayoffApplication { exchange: ExchangeId },

    #[error("exchange {exchange} is still open")]
    ExchangeStillOpen { exchange: ExchangeId },

    #[error("no connected participants to assign in round {round}")]
    PoolEmptyAtAssignment { round: u32 },

    #[error("round {round} does not exist")]
    UnknownRound { round: u32 },

    #[error("round {round} is already closed")]
    RoundClosed { round: u32 },

    #[error("round {round} has not been closed")]
    RoundStillOpen { round: u32 },

    #[error("expected round {expected}, got {got}")]
    RoundOutOfOrder { expected: u32, got: u32 },

    #[error("{participant} has no seat in round {round} or the one before")]
    UnknownParticipant { participant: ParticipantId, round: u32 },
}

/// Settings that failed to load or validate.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("settings are not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} must be {expected}, got {got}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        got: String,
    },

    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("treatment '{0}' is not defined")]
    UnknownTreatment(String),
}
