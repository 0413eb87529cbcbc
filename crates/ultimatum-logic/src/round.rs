//! Per-round exchange bookkeeping
//!
//! One [`Exchange`] per bidder/responder pair. Actions are accepted only in
//! order (offer, then response) and only while the round is open; closing a
//! round forces a response onto every unfinished exchange and freezes it.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, MatchError, SequenceViolation};
use crate::pairing::{Assignment, Seat};
use crate::participant::{ParticipantId, Role};
use crate::random::SeededRng;

/// Responder's answer to an offer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Accepted,
    Rejected,
}

/// An incoming participant action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Offer(u32),
    Response(Response),
}

/// Default response forced onto an exchange when the round times out
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    #[default]
    Reject,
    Accept,
    /// Seeded draw: a missing offer becomes a random bid in `0..=coins`,
    /// then the response is a coin flip from the same stream
    Random,
}

impl FromStr for TimeoutPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(TimeoutPolicy::Reject),
            "accept" => Ok(TimeoutPolicy::Accept),
            "random" => Ok(TimeoutPolicy::Random),
            other => Err(ConfigError::UnknownVariant {
                kind: "timeout policy",
                value: other.to_string(),
            }),
        }
    }
}

/// Stable identifier of an exchange: round number and pair index
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExchangeId {
    pub round: u32,
    pub index: u32,
}

impl core::fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "r{}e{}", self.round, self.index)
    }
}

/// One bidder/responder interaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub id: ExchangeId,
    pub bidder: ParticipantId,
    pub responder: ParticipantId,
    pub offer: Option<u32>,
    pub response: Option<Response>,
    pub timed_out: bool,
}

impl Exchange {
    fn new(id: ExchangeId, bidder: ParticipantId, responder: ParticipantId) -> Self {
        Self {
            id,
            bidder,
            responder,
            offer: None,
            response: None,
            timed_out: false,
        }
    }

    /// Both sides done, or forced closed
    pub fn is_closed(&self) -> bool {
        self.response.is_some()
    }

    /// Persistence rows for this exchange, one per side
    pub fn records(&self, session: &str, closed_at_ms: u64) -> [ExchangeRecord; 2] {
        let row = |participant: &ParticipantId, role: Role, partner: &ParticipantId| ExchangeRecord {
            session: session.to_string(),
            participant: participant.clone(),
            round: self.id.round,
            role,
            partner: Some(partner.clone()),
            offer: self.offer,
            response: self.response,
            timed_out: self.timed_out,
            closed_at_ms,
        };
        [
            row(&self.bidder, Role::Bidder, &self.responder),
            row(&self.responder, Role::Responder, &self.bidder),
        ]
    }
}

/// Append-only row handed to the persistence layer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    pub session: String,
    pub participant: ParticipantId,
    pub round: u32,
    pub role: Role,
    pub partner: Option<ParticipantId>,
    pub offer: Option<u32>,
    pub response: Option<Response>,
    pub timed_out: bool,
    pub closed_at_ms: u64,
}

impl ExchangeRecord {
    /// Row for a participant who sat the round out
    pub fn solo(session: &str, participant: &ParticipantId, round: u32, closed_at_ms: u64) -> Self {
        Self {
            session: session.to_string(),
            participant: participant.clone(),
            round,
            role: Role::Solo,
            partner: None,
            offer: None,
            response: None,
            timed_out: false,
            closed_at_ms,
        }
    }
}

/// What an accepted action means for the caller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordResult {
    /// Offer stored; the responder should be told.
    AwaitingResponse {
        exchange: ExchangeId,
        bidder: ParticipantId,
        responder: ParticipantId,
        offer: u32,
    },
    /// Response stored; the exchange is closed and ready for payoff.
    RoundClosedForPair(Exchange),
}

/// One round: seats from the assignment plus the exchanges they produced
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub number: u32,
    pub seats: BTreeMap<ParticipantId, Seat>,
    pub exchanges: Vec<Exchange>,
    pub closed: bool,
}

impl Round {
    fn from_assignment(assignment: &Assignment) -> Self {
        let exchanges = assignment
            .pairs
            .iter()
            .enumerate()
            .map(|(i, (bidder, responder))| {
                let id = ExchangeId { round: assignment.round, index: i as u32 };
                Exchange::new(id, bidder.clone(), responder.clone())
            })
            .collect();
        Self {
            number: assignment.round,
            seats: assignment.seats.clone(),
            exchanges,
            closed: false,
        }
    }

    pub fn seat(&self, id: &ParticipantId) -> Option<&Seat> {
        self.seats.get(id)
    }

    /// The exchange a participant takes part in, if any
    pub fn exchange_for(&self, id: &ParticipantId) -> Option<&Exchange> {
        self.exchanges
            .iter()
            .find(|e| e.bidder == *id || e.responder == *id)
    }

    fn exchange_index(&self, id: &ParticipantId) -> Option<usize> {
        self.exchanges
            .iter()
            .position(|e| e.bidder == *id || e.responder == *id)
    }

    /// Every non-solo participant's exchange has an offer and a response
    pub fn is_complete(&self) -> bool {
        self.exchanges.iter().all(Exchange::is_closed)
    }

    pub fn solos(&self) -> impl Iterator<Item = &ParticipantId> {
        self.seats
            .iter()
            .filter(|(_, seat)| seat.role == Role::Solo)
            .map(|(id, _)| id)
    }
}

/// All rounds of one session
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    coins: u32,
    rounds: BTreeMap<u32, Round>,
}

impl RoundState {
    pub fn new(coins: u32) -> Self {
        Self {
            coins,
            rounds: BTreeMap::new(),
        }
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn round(&self, number: u32) -> Option<&Round> {
        self.rounds.get(&number)
    }

    /// Most recently opened round
    pub fn current(&self) -> Option<&Round> {
        self.rounds.values().next_back()
    }

    /// Open the round described by `assignment`.
    ///
    /// Rounds open strictly in sequence and only after the previous one
    /// has been closed.
    pub fn open_round(&mut self, assignment: &Assignment) -> Result<&Round, MatchError> {
        let expected = match self.current() {
            Some(last) if !last.closed => {
                return Err(MatchError::RoundStillOpen { round: last.number })
            }
            Some(last) => last.number + 1,
            None => 1,
        };
        if assignment.round != expected {
            return Err(MatchError::RoundOutOfOrder { expected, got: assignment.round });
        }

        let round = Round::from_assignment(assignment);
        tracing::info!(
            round = round.number,
            exchanges = round.exchanges.len(),
            "round opened"
        );
        Ok(self.rounds.entry(assignment.round).or_insert(round))
    }

    /// Record an offer or response.
    ///
    /// Refusals never touch state.
    pub fn record_action(
        &mut self,
        round_id: u32,
        participant: &ParticipantId,
        action: Action,
    ) -> Result<RecordResult, MatchError> {
        let coins = self.coins;
        let round = self
            .rounds
            .get_mut(&round_id)
            .ok_or(MatchError::UnknownRound { round: round_id })?;
        if round.closed {
            return Err(MatchError::RoundClosed { round: round_id });
        }

        let violation = |violation| MatchError::OutOfSequenceAction {
            participant: participant.clone(),
            round: round_id,
            violation,
        };

        let role = round
            .seat(participant)
            .map(|seat| seat.role)
            .ok_or_else(|| violation(SequenceViolation::NoSeat))?;
        let index = round.exchange_index(participant);

        match action {
            Action::Offer(offer) => {
                if role != Role::Bidder {
                    return Err(violation(SequenceViolation::NotBidder));
                }
                let exchange = index
                    .and_then(|i| round.exchanges.get_mut(i))
                    .ok_or_else(|| violation(SequenceViolation::NoSeat))?;
                if exchange.offer.is_some() {
                    return Err(violation(SequenceViolation::DuplicateOffer));
                }
                if offer > coins {
                    return Err(MatchError::InvalidOffer { offer, coins });
                }
                exchange.offer = Some(offer);
                Ok(RecordResult::AwaitingResponse {
                    exchange: exchange.id,
                    bidder: exchange.bidder.clone(),
                    responder: exchange.responder.clone(),
                    offer,
                })
            }
            Action::Response(response) => {
                if role != Role::Responder {
                    return Err(violation(SequenceViolation::NotResponder));
                }
                let exchange = index
                    .and_then(|i| round.exchanges.get_mut(i))
                    .ok_or_else(|| violation(SequenceViolation::NoSeat))?;
                if exchange.response.is_some() {
                    return Err(violation(SequenceViolation::DuplicateResponse));
                }
                if exchange.offer.is_none() {
                    return Err(violation(SequenceViolation::ResponseBeforeOffer));
                }
                exchange.response = Some(response);
                Ok(RecordResult::RoundClosedForPair(exchange.clone()))
            }
        }
    }

    /// Force-close a round after its timer fired.
    ///
    /// Every exchange still missing a response is marked timed out and
    /// given the policy's default. Without an offer the exchange closes as
    /// rejected, except under [`TimeoutPolicy::Random`], which first bids
    /// on the silent bidder's behalf. Returns only the exchanges closed here.
    pub fn close_round(
        &mut self,
        round_id: u32,
        policy: TimeoutPolicy,
        rng: &SeededRng,
    ) -> Result<Vec<Exchange>, MatchError> {
        let coins = self.coins;
        let round = self
            .rounds
            .get_mut(&round_id)
            .ok_or(MatchError::UnknownRound { round: round_id })?;
        if round.closed {
            return Err(MatchError::RoundClosed { round: round_id });
        }

        let mut closed = Vec::new();
        for exchange in round.exchanges.iter_mut().filter(|e| !e.is_closed()) {
            let mut draws = rng.for_exchange(exchange.id.index);
            let response = match (exchange.offer, policy) {
                (None, TimeoutPolicy::Random) => {
                    exchange.offer = Some(draws.next_up_to(coins));
                    coin_flip(&mut draws)
                }
                (None, _) | (Some(_), TimeoutPolicy::Reject) => Response::Rejected,
                (Some(_), TimeoutPolicy::Accept) => Response::Accepted,
                (Some(_), TimeoutPolicy::Random) => coin_flip(&mut draws),
            };
            exchange.response = Some(response);
            exchange.timed_out = true;
            tracing::debug!(
                exchange = %exchange.id,
                offer = ?exchange.offer,
                ?response,
                "exchange timed out"
            );
            closed.push(exchange.clone());
        }
        round.closed = true;

        tracing::info!(round = round_id, forced = closed.len(), "round closed");
        Ok(closed)
    }

    /// Persistence rows for a closed round
    pub fn records(
        &self,
        round_id: u32,
        session: &str,
        closed_at_ms: u64,
    ) -> Result<Vec<ExchangeRecord>, MatchError> {
        let round = self
            .rounds
            .get(&round_id)
            .ok_or(MatchError::UnknownRound { round: round_id })?;
        let mut rows: Vec<ExchangeRecord> = round
            .exchanges
            .iter()
            .flat_map(|e| e.records(session, closed_at_ms))
            .collect();
        rows.extend(
            round
                .solos()
                .map(|id| ExchangeRecord::solo(session, id, round_id, closed_at_ms)),
        );
        Ok(rows)
    }
}

fn coin_flip(rng: &mut SeededRng) -> Response {
    if rng.next_bool() {
        Response::Accepted
    } else {
        Response::Rejected
    }
}
