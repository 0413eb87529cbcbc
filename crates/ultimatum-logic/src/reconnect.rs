//! Restoring a returning participant's view of the round
//!
//! Read-only over [`RoundState`]: the context describes what the client
//! should render, the host decides how to deliver it.

use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::participant::{ParticipantId, Role};
use crate::round::{Response, Round, RoundState};

/// Which screen the client resumes on
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ResumeView {
    /// Bidder has not offered yet: empty bid form.
    BidEntry,
    /// Bidder already offered: wait for the partner. The client reports
    /// completion again but must not send a second offer.
    AwaitResponse { offer: u32 },
    /// Responder with an offer on the table: accept/reject form.
    ResponseEntry { offer: u32 },
    /// Exchange already finished; wait for the next round.
    Settled {
        offer: Option<u32>,
        response: Response,
    },
    /// Sitting this round out.
    Solo,
    /// Responder whose offer could not be found. Never produced by
    /// [`resolve`]; hosts use it as the fallback for `OfferUnavailable`,
    /// leaving the exchange to arrive late or time out.
    AwaitOffer,
}

/// Everything a resuming client needs, as plain data
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectContext {
    pub round: u32,
    pub role: Role,
    pub partner: Option<ParticipantId>,
    pub view: ResumeView,
}

impl ReconnectContext {
    /// The client should immediately re-report completion of its step
    pub fn notify_done(&self) -> bool {
        matches!(self.view, ResumeView::AwaitResponse { .. })
    }
}

/// Rebuild a participant's context for `round_id`.
///
/// Falls back to the round before when the participant has no seat in
/// `round_id` (disconnected while the next round was being paired).
pub fn resolve(
    state: &RoundState,
    participant: &ParticipantId,
    round_id: u32,
) -> Result<ReconnectContext, MatchError> {
    let round = seated_round(state, participant, round_id)?;
    let seat = round
        .seat(participant)
        .ok_or_else(|| MatchError::UnknownParticipant {
            participant: participant.clone(),
            round: round_id,
        })?;

    let context = |view| ReconnectContext {
        round: round.number,
        role: seat.role,
        partner: seat.partner.clone(),
        view,
    };

    if seat.role == Role::Solo {
        return Ok(context(ResumeView::Solo));
    }

    let offer_unavailable = || MatchError::OfferUnavailable {
        participant: participant.clone(),
        round: round.number,
    };

    let Some(exchange) = round.exchange_for(participant) else {
        return match seat.role {
            Role::Responder => Err(offer_unavailable()),
            _ => Err(MatchError::UnknownParticipant {
                participant: participant.clone(),
                round: round.number,
            }),
        };
    };

    if let Some(response) = exchange.response {
        return Ok(context(ResumeView::Settled {
            offer: exchange.offer,
            response,
        }));
    }

    match (seat.role, exchange.offer) {
        (Role::Bidder, None) => Ok(context(ResumeView::BidEntry)),
        (Role::Bidder, Some(offer)) => Ok(context(ResumeView::AwaitResponse { offer })),
        (Role::Responder, Some(offer)) => Ok(context(ResumeView::ResponseEntry { offer })),
        (Role::Responder, None) => Err(offer_unavailable()),
        (Role::Solo, _) => Ok(context(ResumeView::Solo)),
    }
}

/// Fallback context for a responder whose offer is unavailable
pub fn await_offer(round: u32, partner: Option<ParticipantId>) -> ReconnectContext {
    ReconnectContext {
        round,
        role: Role::Responder,
        partner,
        view: ResumeView::AwaitOffer,
    }
}

fn seated_round<'a>(
    state: &'a RoundState,
    participant: &ParticipantId,
    round_id: u32,
) -> Result<&'a Round, MatchError> {
    let previous = round_id.checked_sub(1).filter(|r| *r > 0);
    let candidates = [Some(round_id), previous];

    let mut any_round = false;
    for number in candidates.into_iter().flatten() {
        if let Some(round) = state.round(number) {
            any_round = true;
            if round.seat(participant).is_some() {
                return Ok(round);
            }
        }
    }

    if any_round {
        Err(MatchError::UnknownParticipant {
            participant: participant.clone(),
            round: round_id,
        })
    } else {
        Err(MatchError::UnknownRound { round: round_id })
    }
}
