//! Match Logic for the Ultimatum Game
//!
//! Round-based pairwise matching with disconnect-safe recovery.
//! This crate is compiled to:
//! - Native (for the game-room host)
//! - WASM (for frontend schedule and payoff previews)

mod config;
mod error;
mod ledger;
mod pairing;
mod participant;
mod random;
mod reconnect;
mod round;

#[cfg(feature = "wasm")]
mod wasm;

pub use config::{ChosenTreatment, GameSettings, StepTimers, Treatment};
pub use error::{ConfigError, MatchError, SequenceViolation};
pub use ledger::{BonusPolicy, Payoff, PayoffLedger};
pub use pairing::{assign_round, Assignment, PairingCycle, RoleCounts, RotationPolicy, Seat};
pub use participant::{ConnectionStatus, Participant, ParticipantId, Role};
pub use random::SeededRng;
pub use reconnect::{await_offer, resolve, ReconnectContext, ResumeView};
pub use round::{
    Action, Exchange, ExchangeId, ExchangeRecord, RecordResult, Response, Round, RoundState,
    TimeoutPolicy,
};

/// Split of one exchange
/// Returns (bidder_gain, responder_gain)
///
/// Only an accepted offer pays; the two gains then sum to `coins`.
pub fn payoff(offer: Option<u32>, response: Response, coins: u32) -> (u32, u32) {
    match (offer, response) {
        (Some(offer), Response::Accepted) => {
            let offer = offer.min(coins);
            (coins - offer, offer)
        }
        _ => (0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payoff_split() {
        assert_eq!(payoff(Some(30), Response::Accepted, 100), (70, 30));
        assert_eq!(payoff(Some(0), Response::Accepted, 100), (100, 0));
        assert_eq!(payoff(Some(100), Response::Accepted, 100), (0, 100));
        assert_eq!(payoff(Some(30), Response::Rejected, 100), (0, 0));
        assert_eq!(payoff(None, Response::Accepted, 100), (0, 0));
        assert_eq!(payoff(None, Response::Rejected, 100), (0, 0));
    }
}
